use crate::config::MAX_GLOBAL_AMP;

/// Square-and-clamp mapping from a raw amplitude reading to the global
/// loudness scalar. Pure and monotonic in `|reading|`; output is always in
/// `[0, MAX_GLOBAL_AMP]` for finite input.
pub fn compute(reading: f32) -> f32 {
    (reading * reading).clamp(0.0, MAX_GLOBAL_AMP)
}

/// Tracks the global loudness envelope from raw sample blocks.
///
/// The baseline behavior is instantaneous: RMS of the latest block, squared
/// and clamped. A smoothing factor in [0, 1) blends in an exponential moving
/// average over the RMS reading to tame flicker at high analysis rates.
pub struct LoudnessEstimator {
    smoothing: f32,
    envelope: f32,
}

impl LoudnessEstimator {
    pub fn new(smoothing: f32) -> Self {
        Self {
            smoothing: smoothing.clamp(0.0, 0.999),
            envelope: 0.0,
        }
    }

    /// Consume one sample block and return the updated global amplitude.
    pub fn process_block(&mut self, block: &[f32]) -> f32 {
        if block.is_empty() {
            return compute(self.envelope);
        }
        let rms = (block.iter().map(|x| x * x).sum::<f32>() / block.len() as f32).sqrt();
        self.envelope = self.smoothing * self.envelope + (1.0 - self.smoothing) * rms;
        compute(self.envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_is_squared_and_clamped() {
        assert_eq!(compute(0.0), 0.0);
        assert_eq!(compute(1.0), 1.0);
        assert_eq!(compute(2.0), 4.0);
        assert_eq!(compute(3.0), 5.0);
        assert_eq!(compute(1e20), 5.0);
        assert_eq!(compute(-2.0), 4.0);
    }

    #[test]
    fn test_compute_monotonic_in_magnitude() {
        assert!(compute(2.0) >= compute(1.0));
        assert!(compute(0.5) >= compute(0.25));
        assert!(compute(-3.0) >= compute(-1.0));
    }

    #[test]
    fn test_instantaneous_block_processing() {
        let mut estimator = LoudnessEstimator::new(0.0);
        assert_eq!(estimator.process_block(&[0.0; 512]), 0.0);

        // Constant-amplitude block: RMS == amplitude, loudness == amplitude².
        let amp = estimator.process_block(&[0.5; 512]);
        assert!((amp - 0.25).abs() < 1e-5, "got {}", amp);
    }

    #[test]
    fn test_smoothing_lags_behind_instantaneous() {
        let mut smoothed = LoudnessEstimator::new(0.9);
        let mut instant = LoudnessEstimator::new(0.0);

        let loud = vec![1.0f32; 512];
        let a = smoothed.process_block(&loud);
        let b = instant.process_block(&loud);
        assert!(a < b, "smoothed {} should trail instantaneous {}", a, b);

        // Repeated loud blocks converge toward the instantaneous value.
        let mut last = a;
        for _ in 0..100 {
            last = smoothed.process_block(&loud);
        }
        assert!((last - b).abs() < 0.01);
    }
}
