//! Real-time microphone analysis core for audio-reactive visuals.
//!
//! Captures the default input device in fixed-size blocks, runs a windowed
//! FFT split into 16 normalized frequency bands, estimates a clamped global
//! loudness scalar, and publishes both into a shared snapshot that a renderer
//! can poll at its own rate.

pub mod config;
pub mod engine;
pub mod error;
pub mod loudness;
pub mod source;
pub mod spectral;
pub mod state;

pub use config::AnalyzerConfig;
pub use engine::AnalysisEngine;
pub use error::CaptureError;
pub use loudness::LoudnessEstimator;
pub use source::{BlockSource, BlockTap, MicSource};
pub use spectral::SpectralAnalyzer;
pub use state::{AnalysisState, Snapshot};
