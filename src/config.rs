use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Samples per analysis block, also the FFT length.
pub const FFT_SIZE: usize = 512;

/// Number of frequency bands exposed to consumers. This is also the number
/// of unique visual layers a renderer typically drives from the band array.
pub const FREQUENCY_SPLIT: usize = 16;

/// Per-band divisor used when averaging accumulated bin magnitudes. Defined
/// over the interleaved (real, imag) float layout, so it is twice the number
/// of complex bins that actually land in a band.
pub const SAMPLE_COUNT: usize = FFT_SIZE / FREQUENCY_SPLIT;

/// Upper clamp for the global loudness scalar.
pub const MAX_GLOBAL_AMP: f32 = 5.0;

/// Analysis parameters.
///
/// Defaults reproduce the fixed constants above; the struct exists so a host
/// application can persist and tune them without recompiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// FFT length and block size in samples.
    pub fft_size: usize,
    /// Number of output bands.
    pub frequency_split: usize,
    /// Capture queue depth in blocks. Oldest blocks are dropped on overflow
    /// to bound latency.
    pub queue_depth: usize,
    /// Exponential smoothing factor for the loudness envelope, in [0, 1).
    /// 0.0 means no smoothing (instantaneous reading).
    pub loudness_smoothing: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: FFT_SIZE,
            frequency_split: FREQUENCY_SPLIT,
            queue_depth: 8,
            loudness_smoothing: 0.0,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fft_size == 0 || !self.fft_size.is_power_of_two() {
            bail!("fft_size must be a nonzero power of two, got {}", self.fft_size);
        }
        if self.frequency_split == 0 {
            bail!("frequency_split must be nonzero");
        }
        if (self.fft_size / 2) % self.frequency_split != 0 {
            bail!(
                "frequency_split {} must evenly divide the {} spectrum bins",
                self.frequency_split,
                self.fft_size / 2
            );
        }
        if self.queue_depth == 0 {
            bail!("queue_depth must be nonzero");
        }
        if !(0.0..1.0).contains(&self.loudness_smoothing) {
            bail!(
                "loudness_smoothing must be in [0, 1), got {}",
                self.loudness_smoothing
            );
        }
        Ok(())
    }

    /// Complex spectrum bins aggregated into each band.
    pub fn bins_per_band(&self) -> usize {
        self.fft_size / 2 / self.frequency_split
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fft_size, 512);
        assert_eq!(config.frequency_split, 16);
        assert_eq!(config.bins_per_band(), 16);
    }

    #[test]
    fn test_rejects_degenerate_configs() {
        let mut config = AnalyzerConfig::default();
        config.fft_size = 500;
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.frequency_split = 0;
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.frequency_split = 24; // does not divide 256 bins
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.loudness_smoothing = 1.0;
        assert!(config.validate().is_err());
    }
}
