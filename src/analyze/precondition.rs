//! A module for the [`Preconditioner`]: the low-pass pre-filter and the
//! Hann window applied to every analysis frame before the FFT.

use std::f32::consts::PI;

use crate::core::config::AudioConfig;

/// Low-passes and windows analysis frames in place.
///
/// The filter is a causal first-order IIR with its cutoff at the highest
/// frequency of musical interest; the Hann window table is precomputed once
/// per session.
pub struct Preconditioner {
    alpha: f32,
    window: Vec<f32>,
}

impl Preconditioner {
    /// Creates a preconditioner for the configured window size and cutoff.
    pub fn new(config: &AudioConfig) -> Self {
        let rc = 1.0 / (config.max_frequency * 2.0 * PI);
        let dt = 1.0 / config.sample_rate as f32;
        let alpha = dt / (rc + dt);

        let length = config.window_size;
        let window = (0..length).map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (length - 1) as f32).cos())).collect();

        Self { alpha, window }
    }

    /// Applies the low-pass filter and then the Hann window to `samples`.
    pub fn apply(&self, samples: &mut [f32]) {
        if samples.is_empty() {
            return;
        }

        // y[0] = x[0]; y[i] = α·x[i] + (1−α)·y[i−1]
        let mut previous = samples[0];

        for sample in samples.iter_mut().skip(1) {
            previous = self.alpha * *sample + (1.0 - self.alpha) * previous;
            *sample = previous;
        }

        for (sample, weight) in samples.iter_mut().zip(self.window.iter()) {
            *sample *= weight;
        }
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AudioConfig;
    use pretty_assertions::assert_eq;

    fn config(window_size: usize) -> AudioConfig {
        AudioConfig {
            window_size,
            ..AudioConfig::default()
        }
    }

    #[test]
    fn test_window_tapers_to_zero_at_edges() {
        let preconditioner = Preconditioner::new(&config(1024));

        assert_eq!(preconditioner.window[0], 0.0);
        assert!((preconditioner.window[1023]).abs() < 1e-6);
        assert!((preconditioner.window[512] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_silence_stays_silent() {
        let preconditioner = Preconditioner::new(&config(1024));
        let mut samples = vec![0.0f32; 1024];

        preconditioner.apply(&mut samples);

        assert!(samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_low_pass_attenuates_high_frequencies() {
        let audio = config(2048);
        let preconditioner = Preconditioner::new(&audio);

        let rate = audio.sample_rate as f32;

        // A tone far above the cutoff should lose much more energy than one
        // far below it.
        let mut low = (0..2048).map(|i| (2.0 * PI * 220.0 * i as f32 / rate).sin()).collect::<Vec<_>>();
        let mut high = (0..2048).map(|i| (2.0 * PI * 10_000.0 * i as f32 / rate).sin()).collect::<Vec<_>>();

        preconditioner.apply(&mut low);
        preconditioner.apply(&mut high);

        let energy = |samples: &[f32]| samples.iter().map(|s| s * s).sum::<f32>();

        assert!(energy(&high) < energy(&low) / 4.0);
    }
}
