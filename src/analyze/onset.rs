//! A module for the [`OnsetDetector`]: a complex-domain deviation function
//! with a rolling median threshold.

use std::collections::VecDeque;

use rustfft::num_complex::Complex;

use crate::core::config::AudioConfig;

/// How far above the rolling median the deviation must rise to count as an
/// attack.
const THRESHOLD_SCALE: f32 = 2.0;

/// Absolute floor added to the threshold so numeric dust near silence never
/// reads as an attack.
const THRESHOLD_FLOOR: f32 = 1e-3;

/// Detects note attacks on the complex spectrum.
///
/// Each bin's value is predicted from the previous frame's magnitude with
/// the phase advanced by the last inter-frame phase delta; the deviation is
/// the summed distance between the observed and predicted spectra, counting
/// only bins whose magnitude grew (a decaying note is not an attack).  A
/// frame is an onset when its deviation rises above a scaled median of the
/// previous [`AudioConfig::median_span`] deviations.  Only the rising edge
/// reports, so one attack fires at most once.
///
/// All buffers are allocated here, once per session.
pub struct OnsetDetector {
    prev_magnitude: Vec<f32>,
    prev_phase: Vec<f32>,
    prev_prev_phase: Vec<f32>,
    history: VecDeque<f32>,
    median_scratch: Vec<f32>,
    span: usize,
    above: bool,
}

impl OnsetDetector {
    /// Creates a detector for the configured window size and median span.
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            prev_magnitude: vec![0.0; config.window_size],
            prev_phase: vec![0.0; config.window_size],
            prev_prev_phase: vec![0.0; config.window_size],
            history: VecDeque::with_capacity(config.median_span),
            median_scratch: Vec::with_capacity(config.median_span),
            span: config.median_span,
            above: false,
        }
    }

    /// Consumes one frame's spectrum and reports whether it contains an
    /// attack.
    pub fn process(&mut self, spectrum: &[Complex<f32>]) -> bool {
        let mut deviation = 0.0;

        for (k, observed) in spectrum.iter().enumerate() {
            if observed.norm() < self.prev_magnitude[k] {
                continue;
            }

            let target_phase = 2.0 * self.prev_phase[k] - self.prev_prev_phase[k];
            let predicted = Complex::from_polar(self.prev_magnitude[k], target_phase);

            deviation += (*observed - predicted).norm();
        }

        for (k, observed) in spectrum.iter().enumerate() {
            self.prev_prev_phase[k] = self.prev_phase[k];
            self.prev_phase[k] = observed.arg();
            self.prev_magnitude[k] = observed.norm();
        }

        let threshold = THRESHOLD_SCALE * self.median() + THRESHOLD_FLOOR;

        if self.history.len() == self.span {
            self.history.pop_front();
        }
        self.history.push_back(deviation);

        let onset = deviation > threshold && !self.above;
        self.above = deviation > threshold;

        onset
    }

    /// Returns the median of the retained deviation history, or zero before
    /// any history exists.
    fn median(&mut self) -> f32 {
        if self.history.is_empty() {
            return 0.0;
        }

        self.median_scratch.clear();
        self.median_scratch.extend(self.history.iter().copied());
        self.median_scratch.sort_by(|a, b| a.partial_cmp(b).unwrap());

        self.median_scratch[self.median_scratch.len() / 2]
    }
}

// Tests.
