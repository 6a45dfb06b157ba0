//! A module for the [`SpectrumAnalyzer`], the FFT stage of the pipeline.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Computes the complex spectrum of analysis frames.
///
/// The forward FFT plan and the complex buffer are created once per session
/// and reused for every frame.  The output is normalized by the window size
/// so bin magnitudes are on the scale of the input amplitude and the noise
/// floor means the same thing at every window size.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    /// Plans a forward FFT of the given window size.
    pub fn new(window_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(window_size);

        Self {
            fft,
            buffer: vec![Complex::new(0.0, 0.0); window_size],
        }
    }

    /// Packs `samples` as complex values, runs the FFT in place, and returns
    /// the spectrum.
    pub fn analyze(&mut self, samples: &[f32]) -> &[Complex<f32>] {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            *slot = Complex::new(samples.get(i).copied().unwrap_or_default(), 0.0);
        }

        self.fft.process(&mut self.buffer);

        let scale = 1.0 / self.buffer.len() as f32;
        for value in self.buffer.iter_mut() {
            *value *= scale;
        }

        &self.buffer
    }
}

// Tests.
