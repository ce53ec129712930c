use rustfft::{num_complex::Complex, FftPlanner};

use crate::config::AnalyzerConfig;

/// Magnitudes below this are floored before the log10 conversion so silent
/// bins yield a finite dB value instead of -inf/NaN.
const MAG_FLOOR: f32 = 1e-10;

/// Epsilon added to the normalization denominator so a frame where every
/// band is identical divides cleanly to zero instead of 0/0.
const NORM_EPSILON: f32 = 0.001;

/// Turns one block of time-domain samples into a normalized band array.
///
/// Pipeline per block: Hann window, forward FFT, per-bin dB magnitude,
/// aggregation into `frequency_split` bands, then per-frame min/max
/// normalization into [0, 1].
pub struct SpectralAnalyzer {
    fft_size: usize,
    frequency_split: usize,
    bins_per_band: usize,
    band_divisor: f32,
    fft: std::sync::Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl SpectralAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let window = Self::hann_window(config.fft_size);

        Self {
            fft_size: config.fft_size,
            frequency_split: config.frequency_split,
            bins_per_band: config.bins_per_band(),
            // Interleaved-layout divisor: each band averages over twice its
            // complex bin count. Constant factors cancel in normalization.
            band_divisor: (config.fft_size / config.frequency_split) as f32,
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); config.fft_size],
        }
    }

    fn hann_window(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect()
    }

    /// Analyze one block. Expects `fft_size` samples; shorter input is zero
    /// padded, excess is ignored.
    pub fn analyze(&mut self, block: &[f32]) -> Vec<f32> {
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let sample = block.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let mut bands = vec![0.0f32; self.frequency_split];

        // Accumulate per-bin dB magnitude into bands over the first half of
        // the spectrum (the mirrored half carries no extra information).
        for (bin, c) in self.scratch[..self.fft_size / 2].iter().enumerate() {
            let mag = (2.0 * (c.re * c.re + c.im * c.im).sqrt() / self.fft_size as f32)
                .max(MAG_FLOOR);
            let db = 20.0 * mag.log10();
            bands[bin / self.bins_per_band] += db;
        }
        for band in bands.iter_mut() {
            *band /= self.band_divisor;
        }

        self.normalize(&mut bands);
        bands
    }

    /// Per-frame min/max normalization. Each band ends up in [0, 1]; when
    /// every band carries the same value the whole frame collapses to zeros.
    fn normalize(&self, bands: &mut [f32]) {
        let band_max = bands.iter().fold(f32::MIN, |a, &b| a.max(b));
        let band_min = bands.iter().fold(f32::MAX, |a, &b| a.min(b));
        let range = band_max - band_min + NORM_EPSILON;

        for band in bands.iter_mut() {
            *band = ((*band - band_min) / range).clamp(0.0, 1.0);
        }
    }
}
