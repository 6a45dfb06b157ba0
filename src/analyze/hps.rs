//! A module for the [`PitchEstimator`]: Harmonic Product Spectrum peak
//! estimation.

use rustfft::num_complex::Complex;

use crate::core::{config::AudioConfig, pitch::Semitone};

/// The downsampling factors the product is taken over.
const DOWNSAMPLE_FACTORS: [usize; 4] = [2, 3, 4, 5];

/// One frame's pitch estimate.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct PitchEstimate {
    /// The detected semitone and its interpolated frequency, or `None` when
    /// no in-range pitch was found.
    pub pitch: Option<(&'static Semitone, f32)>,
    /// The harmonic-product amplitude of the winning peak; zero when no
    /// pitch was found.
    pub amplitude: f32,
}

impl PitchEstimate {
    /// The estimate for a frame with no detectable pitch.
    pub fn none() -> Self {
        Self { pitch: None, amplitude: 0.0 }
    }
}

/// Estimates the fundamental pitch of each frame from its spectrum.
///
/// The real spectrum is downsampled by factors 2 through 5 and the
/// magnitudes multiplied together, which reinforces the fundamental over
/// its harmonics.  Harmonic magnitudes below 1 are clamped up to 1 so a
/// single empty harmonic bin cannot annihilate a genuine peak.
pub struct PitchEstimator {
    bin_size: f32,
    min_frequency: f32,
    noise_floor: f32,
    product: Vec<f32>,
}

impl PitchEstimator {
    /// Creates an estimator for the configured window size and gates.
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            bin_size: config.bin_size(),
            min_frequency: config.min_frequency,
            noise_floor: config.noise_floor,
            product: vec![0.0; config.window_size.div_ceil(5)],
        }
    }

    /// Estimates the pitch of one frame from its complex spectrum.
    pub fn estimate(&mut self, spectrum: &[Complex<f32>]) -> PitchEstimate {
        let out_len = self.product.len().min(spectrum.len().div_ceil(5));

        for (i, slot) in self.product.iter_mut().take(out_len).enumerate() {
            let mut value = spectrum[i].norm();

            for factor in DOWNSAMPLE_FACTORS {
                value *= clamped_magnitude(spectrum[i * factor].re);
            }

            *slot = value.sqrt();
        }

        // Find the highest bin that clears both the minimum-frequency and
        // noise-floor gates.
        let mut peak_bin = None;
        let mut peak_amplitude = 0.0;

        for (i, amplitude) in self.product.iter().take(out_len).enumerate() {
            if i as f32 * self.bin_size <= self.min_frequency || *amplitude < self.noise_floor {
                continue;
            }

            if *amplitude > peak_amplitude {
                peak_amplitude = *amplitude;
                peak_bin = Some(i);
            }
        }

        let Some(peak_bin) = peak_bin else {
            return PitchEstimate::none();
        };

        let frequency = self.interpolate(peak_bin, out_len);

        match Semitone::from_frequency(frequency) {
            Some(semitone) => PitchEstimate {
                pitch: Some((semitone, frequency)),
                amplitude: peak_amplitude,
            },
            None => PitchEstimate::none(),
        }
    }

    /// Refines the peak frequency between the neighboring bins.
    ///
    /// The 0.66 offset is an asymmetric stand-in for a true parabolic fit;
    /// it compensates for the product's tendency to land just below the
    /// fundamental.  At the window edges the raw bin frequency is used.
    fn interpolate(&self, peak_bin: usize, out_len: usize) -> f32 {
        if peak_bin == 0 || peak_bin + 1 >= out_len {
            return peak_bin as f32 * self.bin_size;
        }

        let low = (peak_bin - 1) as f32 * self.bin_size;
        let high = (peak_bin + 1) as f32 * self.bin_size;

        low + 0.66 * (high - low)
    }
}

/// The magnitude convention of the product: real-only values, with anything
/// below 1 clamped up to 1.
fn clamped_magnitude(real: f32) -> f32 {
    real.abs().max(1.0)
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{precondition::Preconditioner, spectrum::SpectrumAnalyzer};
    use crate::core::config::AudioConfig;
    use std::f32::consts::PI;

    fn config(window_size: usize) -> AudioConfig {
        AudioConfig {
            window_size,
            ..AudioConfig::default()
        }
    }

    fn sine(frequency: f32, amplitude: f32, count: usize, rate: u32) -> Vec<f32> {
        (0..count).map(|i| amplitude * (2.0 * PI * frequency * i as f32 / rate as f32).sin()).collect()
    }

    fn estimate_sine(frequency: f32, window_size: usize) -> PitchEstimate {
        let audio = config(window_size);

        let preconditioner = Preconditioner::new(&audio);
        let mut analyzer = SpectrumAnalyzer::new(window_size);
        let mut estimator = PitchEstimator::new(&audio);

        let mut samples = sine(frequency, 0.2, window_size, audio.sample_rate);
        preconditioner.apply(&mut samples);

        estimator.estimate(analyzer.analyze(&samples))
    }

    #[test]
    fn test_estimates_a4_for_440() {
        for window_size in [1024, 2048, 4096, 8192] {
            let estimate = estimate_sine(440.0, window_size);

            let (semitone, _) = estimate.pitch.expect("440 Hz should be detected");
            assert_eq!(semitone.name, "A4", "window size {window_size}");
            assert!(estimate.amplitude > 0.0);
        }
    }

    #[test]
    fn test_estimates_across_the_range() {
        for (frequency, name) in [(261.63, "C4"), (329.63, "E4"), (523.25, "C5")] {
            let estimate = estimate_sine(frequency, 2048);

            let (semitone, _) = estimate.pitch.expect("tone should be detected");
            assert_eq!(semitone.name, name);
        }
    }

    #[test]
    fn test_rejects_silence() {
        let estimate = estimate_sine(440.0, 2048);
        assert!(estimate.pitch.is_some());

        let audio = config(2048);
        let mut analyzer = SpectrumAnalyzer::new(2048);
        let mut estimator = PitchEstimator::new(&audio);

        let silent = estimator.estimate(analyzer.analyze(&[0.0; 2048]));

        assert_eq!(silent, PitchEstimate::none());
    }

    #[test]
    fn test_rejects_out_of_range_tone() {
        // 80 Hz sits below C3 and below the minimum-frequency gate.
        let estimate = estimate_sine(80.0, 2048);

        assert_eq!(estimate.pitch, None);
    }

    #[test]
    fn test_clamp_preserves_peaks_with_empty_harmonic_bins() {
        // A spectrum with energy only at the fundamental: the downsampled
        // harmonics are all empty, and the clamp keeps the peak alive.
        let window_size = 2048;
        let audio = config(window_size);
        let mut estimator = PitchEstimator::new(&audio);

        let mut spectrum = vec![Complex::new(0.0, 0.0); window_size];
        let bin = (440.0 / audio.bin_size()).round() as usize;
        spectrum[bin] = Complex::new(100.0, 0.0);

        let estimate = estimator.estimate(&spectrum);

        let (semitone, _) = estimate.pitch.expect("lone fundamental should survive the product");
        assert_eq!(semitone.name, "A4");
    }
}
