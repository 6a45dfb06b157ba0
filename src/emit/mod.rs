//! Quantization and MIDI emission: finalized note events in, a `.mid` file
//! out.

use std::path::Path;

use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
};

use crate::{
    analyze::segment::NoteEvent,
    core::{
        base::{HasStaticName, Void},
        config::MusicConfig,
        rhythm::NoteValue,
    },
};

/// Ticks per crotchet in the emitted file.
const TICKS_PER_CROTCHET: u16 = 480;

/// Every note is emitted at half velocity; dynamics are not inferred.
const VELOCITY: u8 = 64;

/// The General MIDI electric grand piano.
const PROGRAM: u8 = 2;

// Structs.

/// One note after quantization: a MIDI number and a rhythmic symbol.
#[derive(PartialEq, Clone, Debug)]
pub struct QuantizedNote {
    /// The pitch name.
    pub name: &'static str,
    /// The MIDI note number.
    pub midi: u8,
    /// The rhythmic symbol.
    pub value: NoteValue,
    /// The snapped duration, in seconds.
    pub seconds: f32,
}

// Functions.

/// Snaps the finalized events onto the configured rhythmic grid.
///
/// A silence following a note is folded into that note's duration rather
/// than emitted on its own; the rhythmic totals come out better at the cost
/// of articulation fidelity.  Durations round to the nearest grid step, with
/// anything that rounds to zero clamped up to one step.
pub fn quantize(events: &[NoteEvent], music: &MusicConfig, frame_time: f32) -> Vec<QuantizedNote> {
    let crotchet_seconds = music.crotchet_seconds();
    let min_note_seconds = music.min_note_seconds();

    let mut notes = Vec::new();
    let mut index = 0;

    while index < events.len() {
        let event = &events[index];

        if event.is_silence() {
            // Unfolded silences (e.g., at the head of the list) are dropped.
            index += 1;
            continue;
        }

        let mut frames = event.frames;

        if let Some(next) = events.get(index + 1) {
            if next.is_silence() {
                frames += next.frames;
                index += 1;
            }
        }

        let raw_seconds = frame_time * frames as f32;
        let mut note_seconds = (raw_seconds / min_note_seconds).round() * min_note_seconds;

        if note_seconds == 0.0 {
            note_seconds = min_note_seconds;
        }

        let value = NoteValue::classify(note_seconds, crotchet_seconds, min_note_seconds);

        notes.push(QuantizedNote {
            name: event.name,
            midi: event.midi,
            value,
            seconds: note_seconds,
        });

        index += 1;
    }

    notes
}

/// Builds the single-track MIDI file for the quantized notes.
pub fn build_smf(notes: &[QuantizedNote], music: &MusicConfig) -> Smf<'static> {
    let mut track = Vec::new();

    let microseconds_per_crotchet = 60_000_000 / music.tempo_bpm as u32;

    track.push(meta(MetaMessage::Tempo(u24::new(microseconds_per_crotchet))));
    track.push(meta(MetaMessage::KeySignature(music.key.accidentals(), false)));
    track.push(meta(MetaMessage::TimeSignature(music.beats_per_bar, music.time_denom.exponent(), 24, 8)));

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::ProgramChange { program: u7::new(PROGRAM) },
        },
    });

    for note in notes {
        let ticks = (note.value.crotchets() * TICKS_PER_CROTCHET as f32).round() as u32;

        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOn {
                    key: u7::new(note.midi),
                    vel: u7::new(VELOCITY),
                },
            },
        });

        track.push(TrackEvent {
            delta: u28::new(ticks),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOff {
                    key: u7::new(note.midi),
                    vel: u7::new(0),
                },
            },
        });
    }

    track.push(meta(MetaMessage::EndOfTrack));

    Smf {
        header: Header::new(Format::SingleTrack, Timing::Metrical(u15::new(TICKS_PER_CROTCHET))),
        tracks: vec![track],
    }
}

/// Quantizes the events and writes `<path>` as a MIDI file.
pub fn write_midi_file(events: &[NoteEvent], music: &MusicConfig, frame_time: f32, path: impl AsRef<Path>) -> Void {
    let notes = quantize(events, music, frame_time);

    for note in &notes {
        tracing::info!("{} ({})", note.name, note.value.static_name());
    }

    let smf = build_smf(&notes, music);
    smf.save(path.as_ref())?;

    tracing::info!("Wrote {} notes to {}", notes.len(), path.as_ref().display());

    Ok(())
}

fn meta(message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(message),
    }
}

// Tests.
