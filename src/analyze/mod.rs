//! The analysis pipeline: raw sample frames in, finalized note events out.
//!
//! Frames flow through overlap, pre-conditioning, the FFT, onset detection
//! and pitch estimation, and finally the note segmenter.  The whole chain is
//! owned by one [`Analyzer`] value and runs strictly sequentially; nothing
//! here suspends or locks.

pub mod hps;
pub mod onset;
pub mod overlap;
pub mod precondition;
pub mod segment;
pub mod source;
pub mod spectrum;

use crate::core::config::AudioConfig;

use self::{
    hps::PitchEstimator,
    onset::OnsetDetector,
    overlap::Overlapper,
    precondition::Preconditioner,
    segment::{NoteEvent, NoteSegmenter},
    spectrum::SpectrumAnalyzer,
};

/// The result of a completed analysis pass.
#[derive(Debug)]
pub struct AnalysisOutcome {
    /// The committed note and silence events, in order.
    pub events: Vec<NoteEvent>,
    /// The number of analysis frames processed (2N−1 for N raw frames).
    pub frames_analyzed: usize,
}

/// Owns every stage of the pipeline and drives one frame at a time.
///
/// Raw frames are fed in order; each one is analyzed itself, and a bridging
/// frame spanning it and its successor is analyzed in between, so N raw
/// frames produce 2N−1 analysis frames.
pub struct Analyzer {
    overlapper: Overlapper,
    preconditioner: Preconditioner,
    spectrum: SpectrumAnalyzer,
    onsets: OnsetDetector,
    pitches: PitchEstimator,
    segmenter: NoteSegmenter,
    pending: Option<Vec<f32>>,
    scratch: Vec<f32>,
    frames_analyzed: usize,
}

impl Analyzer {
    /// Creates a pipeline for the given audio parameters.  Every buffer the
    /// stages need is allocated here, once.
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            overlapper: Overlapper::new(config.window_size),
            preconditioner: Preconditioner::new(config),
            spectrum: SpectrumAnalyzer::new(config.window_size),
            onsets: OnsetDetector::new(config),
            pitches: PitchEstimator::new(config),
            segmenter: NoteSegmenter::new(),
            pending: None,
            scratch: Vec::with_capacity(config.window_size),
            frames_analyzed: 0,
        }
    }

    /// Feeds the next raw frame.
    ///
    /// The previous raw frame and the bridge into this one are analyzed now;
    /// this frame itself is held back until its successor (or
    /// [`Analyzer::finish`]) arrives.
    pub fn feed(&mut self, frame: &[f32]) {
        if let Some(previous) = self.pending.take() {
            self.analyze(&previous);

            self.overlapper.save(&previous);
            let bridge = self.overlapper.bridge(frame);
            self.analyze(&bridge);
        }

        self.pending = Some(frame.to_vec());
    }

    /// Analyzes the final held-back frame, flushes the segmenter, and
    /// returns the committed events.
    pub fn finish(mut self) -> AnalysisOutcome {
        if let Some(last) = self.pending.take() {
            self.analyze(&last);
        }

        self.segmenter.finish();

        AnalysisOutcome {
            events: self.segmenter.take_events(),
            frames_analyzed: self.frames_analyzed,
        }
    }

    /// Returns whether the note buffer hit its bound; callers should stop
    /// feeding frames once it has.
    pub fn is_full(&self) -> bool {
        self.segmenter.is_full()
    }

    fn analyze(&mut self, frame: &[f32]) {
        self.scratch.clear();
        self.scratch.extend_from_slice(frame);
        self.preconditioner.apply(&mut self.scratch);

        let spectrum = self.spectrum.analyze(&self.scratch);

        // Both detectors read the same spectrum for the same frame.
        let onset = self.onsets.process(spectrum);
        let estimate = self.pitches.estimate(spectrum);

        self.segmenter.process(estimate.pitch.map(|(semitone, _)| semitone), estimate.amplitude, onset);

        self.frames_analyzed += 1;
    }
}

// Tests.
