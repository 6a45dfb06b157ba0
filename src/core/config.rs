//! Session configuration: the immutable audio-pipeline parameters and the
//! user's musical intent.

use std::path::PathBuf;

use crate::core::{
    base::{Res, Void},
    key::KeySignature,
    rhythm::{Quantization, TimeDenominator},
};

/// The sample rate every session runs at, in hertz.
pub const SAMPLE_RATE: u32 = 22_050;

/// The supported FFT window sizes.
pub const WINDOW_SIZES: [usize; 4] = [1024, 2048, 4096, 8192];

// Structs.

/// Immutable parameters of the analysis pipeline, created at session start.
#[derive(Clone, Debug)]
pub struct AudioConfig {
    /// Samples per second.
    pub sample_rate: u32,
    /// FFT window size, and therefore the raw frame size.
    pub window_size: usize,
    /// Input channel count (mono).
    pub channels: u16,
    /// Minimum harmonic-product amplitude a peak must reach to count as a
    /// pitch.
    pub noise_floor: f32,
    /// Number of previous deviation values the onset threshold takes its
    /// median over.
    pub median_span: usize,
    /// Lowest detectable frequency, in hertz (just below C3).
    pub min_frequency: f32,
    /// Highest frequency of musical interest, in hertz (just above C6);
    /// also the low-pass cutoff.
    pub max_frequency: f32,
}

/// The user's musical intent for one session.
#[derive(Clone, Debug)]
pub struct MusicConfig {
    /// Tempo in beats per minute, 10 through 200.
    pub tempo_bpm: u16,
    /// Beats per bar, 2 through 16.
    pub beats_per_bar: u8,
    /// The denominator of the time signature.
    pub time_denom: TimeDenominator,
    /// The key signature.
    pub key: KeySignature,
    /// The rhythmic grid detected durations are snapped to.
    pub quantization: Quantization,
    /// Output path stem; the session writes `<output>.mid` (and
    /// `<output>.wav` for live recordings).
    pub output: PathBuf,
}

// Impls.

impl AudioConfig {
    /// Creates a config with the given FFT window size, which must be one of
    /// [`WINDOW_SIZES`].
    pub fn new(window_size: usize) -> Res<Self> {
        if !WINDOW_SIZES.contains(&window_size) {
            return Err(anyhow::Error::msg(format!(
                "Invalid FFT size `{window_size}` (expected one of 1024, 2048, 4096, 8192)."
            )));
        }

        Ok(Self {
            window_size,
            ..Self::default()
        })
    }

    /// Returns the frequency resolution of one FFT bin, in hertz.
    pub fn bin_size(&self) -> f32 {
        self.sample_rate as f32 / self.window_size as f32
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            window_size: 4096,
            channels: 1,
            noise_floor: 0.05,
            median_span: 11,
            min_frequency: 130.0,
            max_frequency: 1109.0,
        }
    }
}

impl MusicConfig {
    /// Checks that every field is present and inside its supported range.
    ///
    /// Sessions must not start on an invalid config; the message names the
    /// offending field so the caller can surface it directly.
    pub fn validate(&self) -> Void {
        if !(10..=200).contains(&self.tempo_bpm) {
            return Err(anyhow::Error::msg(format!("Tempo must be between 10 and 200 bpm (got {}).", self.tempo_bpm)));
        }

        if !(2..=16).contains(&self.beats_per_bar) {
            return Err(anyhow::Error::msg(format!("Beats per bar must be between 2 and 16 (got {}).", self.beats_per_bar)));
        }

        if self.output.as_os_str().is_empty() {
            return Err(anyhow::Error::msg("An output path is required."));
        }

        Ok(())
    }

    /// Returns the length of one crotchet at the configured tempo, in
    /// seconds.
    pub fn crotchet_seconds(&self) -> f32 {
        60.0 / self.tempo_bpm as f32
    }

    /// Returns the length of one grid step, in seconds.
    pub fn min_note_seconds(&self) -> f32 {
        self.crotchet_seconds() / self.quantization.factor()
    }
}

// Tests.
