use anyhow::Result;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::AnalyzerConfig;
use crate::error::CaptureError;
use crate::loudness::LoudnessEstimator;
use crate::source::BlockSource;
use crate::spectral::SpectralAnalyzer;
use crate::state::AnalysisState;

/// Wires a block source into the spectral and loudness taps and publishes
/// their output into the shared state.
///
/// `start()` and `stop()` are idempotent. When starting the source fails the
/// engine unwinds completely: no taps stay registered and it remains in the
/// stopped state.
pub struct AnalysisEngine<S: BlockSource> {
    source: S,
    state: Arc<AnalysisState>,
    config: AnalyzerConfig,
    frames_dropped: Arc<AtomicU64>,
    running: bool,
}

impl<S: BlockSource> AnalysisEngine<S> {
    pub fn new(source: S, state: Arc<AnalysisState>, config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            state,
            config,
            frames_dropped: Arc::new(AtomicU64::new(0)),
            running: false,
        })
    }

    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.running {
            debug!("analysis engine already running");
            return Ok(());
        }

        // Spectral tap: one full block in, one normalized band frame out.
        let block_size = self.config.fft_size;
        let mut analyzer = SpectralAnalyzer::new(&self.config);
        let state = Arc::clone(&self.state);
        let dropped = Arc::clone(&self.frames_dropped);
        self.source.subscribe(Box::new(move |block| {
            if block.len() != block_size {
                warn!("skipping malformed block of {} samples", block.len());
                dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
            state.publish_bands(analyzer.analyze(block));
        }));

        // Loudness tap over the same raw signal, on its own cadence.
        let mut estimator = LoudnessEstimator::new(self.config.loudness_smoothing);
        let state = Arc::clone(&self.state);
        self.source.subscribe(Box::new(move |block| {
            state.publish_global_amp(estimator.process_block(block));
        }));

        if let Err(err) = self.source.start() {
            // Unwind the taps registered above so a failed start leaves no
            // side effects behind.
            self.source.stop();
            return Err(err);
        }

        self.running = true;
        info!("analysis engine started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.source.stop();
        self.running = false;
        info!("analysis engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Handle to the shared output, for handing to additional consumers.
    pub fn state(&self) -> Arc<AnalysisState> {
        Arc::clone(&self.state)
    }

    /// Malformed blocks skipped by the spectral tap since construction.
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }
}

impl<S: BlockSource> Drop for AnalysisEngine<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
