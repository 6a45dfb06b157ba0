//! A module for the [`NoteSegmenter`]: the frame-level state machine that
//! turns per-frame pitch estimates into finalized note and silence events.

use crate::core::pitch::Semitone;

/// The maximum number of events a session will commit; reaching the bound
/// stops further capture.
pub const MAX_NOTES: usize = 1000;

/// The number of per-frame pitch votes retained for one note.
const VOTE_CAPACITY: usize = 100;

/// The display name of a silence event.
pub const SILENCE_NAME: &str = "N/A";

// Structs.

/// A finalized segment: a pitch (or silence) and how many analysis frames it
/// lasted.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct NoteEvent {
    /// The pitch name, or `"N/A"` for silence.
    pub name: &'static str,
    /// The MIDI note number, or 0 for silence.
    pub midi: u8,
    /// The length of the segment in analysis frames.
    pub frames: usize,
}

impl NoteEvent {
    /// Returns whether this event is a silence.
    pub fn is_silence(&self) -> bool {
        self.midi == 0
    }
}

/// Segments the stream of per-frame pitch estimates into notes.
///
/// A frame either starts a new note (an onset, or any pitch after silence),
/// continues the current note, or is silent.  Leading silence is discarded;
/// later silence is accumulated into its own event.  Because single frames
/// jitter between neighboring semitones, the committed MIDI number of a note
/// is the majority vote over its frames rather than its first estimate.
pub struct NoteSegmenter {
    events: Vec<NoteEvent>,
    votes: [u8; VOTE_CAPACITY],
    prev_amplitude: f32,
    current_length: usize,
    silence_length: usize,
    last_note_length: usize,
    prev_name: &'static str,
    prev_midi: u8,
    heard: bool,
    full: bool,
}

impl NoteSegmenter {
    /// Creates an empty segmenter.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            votes: [0; VOTE_CAPACITY],
            prev_amplitude: 0.0,
            current_length: 0,
            silence_length: 0,
            last_note_length: 0,
            prev_name: SILENCE_NAME,
            prev_midi: 0,
            heard: false,
            full: false,
        }
    }

    /// Consumes one frame's `(pitch, onset)` pair.
    pub fn process(&mut self, pitch: Option<&'static Semitone>, amplitude: f32, onset: bool) {
        if self.full {
            return;
        }

        match pitch {
            None => self.process_silent_frame(),
            Some(semitone) => self.process_pitched_frame(semitone, amplitude, onset),
        }
    }

    fn process_silent_frame(&mut self) {
        // Silence before the first note is trimmed entirely.
        if !self.heard {
            return;
        }

        if self.silence_length == 0 && self.prev_midi != 0 {
            // The first silent frame ends the current note.
            self.last_note_length = self.current_length;
            let midi = self.majority_midi();
            let name = self.prev_name;
            self.commit(name, midi, self.last_note_length);

            self.prev_name = SILENCE_NAME;
            self.prev_midi = 0;
            self.current_length = 0;
        }

        self.silence_length += 1;
        self.prev_amplitude = 0.0;
    }

    fn process_pitched_frame(&mut self, semitone: &'static Semitone, amplitude: f32, onset: bool) {
        if onset || self.prev_amplitude == 0.0 {
            // A new note begins here.
            if !self.heard {
                // The first note ever: nothing to commit yet.
                self.heard = true;
            } else if self.silence_length > 0 {
                let length = self.silence_length;
                self.commit(SILENCE_NAME, 0, length);
                self.silence_length = 0;
            } else {
                self.last_note_length = self.current_length;
                let midi = self.majority_midi();
                let name = self.prev_name;
                self.commit(name, midi, self.last_note_length);
            }

            self.prev_name = semitone.name;
            self.prev_midi = semitone.midi;
            self.votes[0] = semitone.midi;
            self.current_length = 1;
        } else {
            // The current note continues.
            if self.current_length < VOTE_CAPACITY {
                self.votes[self.current_length] = semitone.midi;
            }
            self.current_length += 1;
        }

        self.prev_amplitude = amplitude;
    }

    /// Commits the in-flight note at the end of the stream.  Trailing
    /// silence is dropped.
    pub fn finish(&mut self) {
        if self.full || !self.heard {
            return;
        }

        if self.silence_length == 0 && self.current_length > 0 && self.prev_midi != 0 {
            self.last_note_length = self.current_length;
            let midi = self.majority_midi();
            let name = self.prev_name;
            self.commit(name, midi, self.last_note_length);
            self.current_length = 0;
        }
    }

    /// Returns the MIDI value that appears most often in the current note's
    /// vote buffer, with ties resolved by first occurrence.
    fn majority_midi(&self) -> u8 {
        let length = self.last_note_length.min(VOTE_CAPACITY);

        let mut consumed = [false; VOTE_CAPACITY];
        let mut best = self.prev_midi;
        let mut best_count = 0;

        for i in 0..length {
            if consumed[i] {
                continue;
            }

            let mut count = 0;
            for j in i..length {
                if self.votes[j] == self.votes[i] {
                    consumed[j] = true;
                    count += 1;
                }
            }

            if count > best_count {
                best_count = count;
                best = self.votes[i];
            }
        }

        best
    }

    fn commit(&mut self, name: &'static str, midi: u8, frames: usize) {
        if self.events.len() >= MAX_NOTES {
            self.full = true;
            return;
        }

        tracing::debug!("Committed {name} (midi {midi}) for {frames} frames");

        self.events.push(NoteEvent { name, midi, frames });

        if self.events.len() >= MAX_NOTES {
            tracing::info!("Note buffer is full; stopping further capture");
            self.full = true;
        }
    }

    /// Returns the committed events so far.
    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// Takes the committed events, leaving the list empty.
    pub fn take_events(&mut self) -> Vec<NoteEvent> {
        std::mem::take(&mut self.events)
    }

    /// Returns whether the event list has hit [`MAX_NOTES`].
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Returns the frame count of the note still being accumulated.
    pub fn pending_note_frames(&self) -> usize {
        self.current_length
    }

    /// Returns the frame count of the silence still being accumulated.
    pub fn pending_silence_frames(&self) -> usize {
        self.silence_length
    }
}

impl Default for NoteSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pitch::Semitone;
    use pretty_assertions::assert_eq;

    fn midi(value: u8) -> Option<&'static Semitone> {
        Some(Semitone::from_midi(value).unwrap())
    }

    #[test]
    fn test_pure_silence_commits_nothing() {
        let mut segmenter = NoteSegmenter::new();

        for _ in 0..500 {
            segmenter.process(None, 0.0, false);
        }
        segmenter.finish();

        assert_eq!(segmenter.events(), &[]);
    }

    #[test]
    fn test_leading_silence_is_trimmed() {
        let mut segmenter = NoteSegmenter::new();

        for _ in 0..10 {
            segmenter.process(None, 0.0, false);
        }
        for _ in 0..4 {
            segmenter.process(midi(69), 0.5, false);
        }
        segmenter.finish();

        assert_eq!(segmenter.events(), &[NoteEvent { name: "A4", midi: 69, frames: 4 }]);
    }

    #[test]
    fn test_note_rest_note() {
        let mut segmenter = NoteSegmenter::new();

        for _ in 0..6 {
            segmenter.process(midi(60), 0.5, false);
        }
        for _ in 0..3 {
            segmenter.process(None, 0.0, false);
        }
        for _ in 0..4 {
            segmenter.process(midi(64), 0.5, false);
        }
        segmenter.finish();

        assert_eq!(
            segmenter.events(),
            &[
                NoteEvent { name: "C4", midi: 60, frames: 6 },
                NoteEvent { name: "N/A", midi: 0, frames: 3 },
                NoteEvent { name: "E4", midi: 64, frames: 4 },
            ]
        );
    }

    #[test]
    fn test_onset_splits_back_to_back_notes() {
        let mut segmenter = NoteSegmenter::new();

        for _ in 0..4 {
            segmenter.process(midi(60), 0.5, false);
        }
        segmenter.process(midi(67), 0.5, true);
        for _ in 0..3 {
            segmenter.process(midi(67), 0.5, false);
        }
        segmenter.finish();

        assert_eq!(
            segmenter.events(),
            &[
                NoteEvent { name: "C4", midi: 60, frames: 4 },
                NoteEvent { name: "G4", midi: 67, frames: 4 },
            ]
        );
    }

    #[test]
    fn test_majority_vote_stabilizes_jitter() {
        let mut segmenter = NoteSegmenter::new();

        // The estimate alternates between C4 and C#4, with C4 winning 60/40.
        for i in 0..100 {
            let value = if i % 5 < 3 { 60 } else { 61 };
            segmenter.process(midi(value), 0.5, false);
        }
        segmenter.finish();

        let events = segmenter.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].midi, 60);
        assert_eq!(events[0].frames, 100);
    }

    #[test]
    fn test_majority_vote_ties_resolve_by_first_occurrence() {
        let mut segmenter = NoteSegmenter::new();

        for value in [60, 60, 62, 60, 61] {
            segmenter.process(midi(value), 0.5, false);
        }
        segmenter.finish();

        assert_eq!(segmenter.events()[0].midi, 60);
    }

    #[test]
    fn test_frame_accounting() {
        let mut segmenter = NoteSegmenter::new();

        // 5 leading silent frames, then 7 pitched, 4 silent, 9 pitched, and
        // 2 silent frames left pending.
        for _ in 0..5 {
            segmenter.process(None, 0.0, false);
        }
        for _ in 0..7 {
            segmenter.process(midi(60), 0.5, false);
        }
        for _ in 0..4 {
            segmenter.process(None, 0.0, false);
        }
        for _ in 0..9 {
            segmenter.process(midi(64), 0.5, false);
        }
        for _ in 0..2 {
            segmenter.process(None, 0.0, false);
        }

        let committed: usize = segmenter.events().iter().map(|e| e.frames).sum();
        let pending = segmenter.pending_note_frames() + segmenter.pending_silence_frames();

        // Everything after the leading silence is accounted for.
        assert_eq!(committed + pending, 27 - 5);
    }

    #[test]
    fn test_buffer_bound_stops_commits() {
        let mut segmenter = NoteSegmenter::new();

        // Alternate pitch and silence to force one commit per transition.
        for _ in 0..1100 {
            segmenter.process(midi(60), 0.5, false);
            segmenter.process(None, 0.0, false);
        }

        assert!(segmenter.is_full());
        assert_eq!(segmenter.events().len(), MAX_NOTES);
    }
}
