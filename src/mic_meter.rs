use anyhow::Result;
use clap::Parser;
use log::info;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use globe_pulse::{AnalysisEngine, AnalysisState, AnalyzerConfig, MicSource};

/// Terminal band meter: polls the analysis snapshot the way a renderer
/// would and draws 16 bars plus the global amplitude.
#[derive(Parser)]
#[command(name = "mic-meter")]
struct Args {
    /// Polling interval in milliseconds
    #[arg(long, default_value_t = 10)]
    poll_ms: u64,

    /// How long to run before exiting, in seconds
    #[arg(long, default_value_t = 30)]
    duration_secs: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    info!("Starting microphone band meter");

    let config = AnalyzerConfig::default();
    let state = Arc::new(AnalysisState::new());
    let source = MicSource::new(&config)?;
    let mut engine = AnalysisEngine::new(source, Arc::clone(&state), config)?;
    engine.start()?;

    info!("Capture running, polling every {} ms", args.poll_ms);

    let deadline = Instant::now() + Duration::from_secs(args.duration_secs);
    while Instant::now() < deadline {
        let snap = state.snapshot();
        let meters: String = snap.bands.iter().map(|&b| glyph(b)).collect();
        print!("\r[{}] amp {:4.2}", meters, snap.global_amp);
        std::io::stdout().flush()?;
        std::thread::sleep(Duration::from_millis(args.poll_ms));
    }
    println!();

    engine.stop();
    info!("Meter finished");
    Ok(())
}

fn glyph(level: f32) -> char {
    const RAMP: [char; 8] = [' ', '.', ':', '-', '=', '+', '*', '#'];
    let idx = ((level * RAMP.len() as f32) as usize).min(RAMP.len() - 1);
    RAMP[idx]
}
