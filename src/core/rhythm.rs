//! A module for rhythmic values, the quantization grid, and time-signature
//! denominators.

use crate::core::base::{HasStaticName, Parsable, Res};

// Enums.

/// A rhythmic symbol the quantizer can emit, semidemiquaver through
/// semibreve, with dotted variants.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub enum NoteValue {
    /// A thirty-second note.
    Semidemiquaver,
    /// A sixteenth note.
    Semiquaver,
    /// A dotted sixteenth note.
    DottedSemiquaver,
    /// An eighth note.
    Quaver,
    /// A dotted eighth note.
    DottedQuaver,
    /// A quarter note.
    Crotchet,
    /// A dotted quarter note.
    DottedCrotchet,
    /// A half note.
    Minim,
    /// A dotted half note.
    DottedMinim,
    /// A whole note.
    Semibreve,
}

/// The rhythmic grid detected durations are snapped to.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub enum Quantization {
    /// Snap to whole notes.
    Whole,
    /// Snap to half notes.
    Half,
    /// Snap to quarter notes.
    Quarter,
    /// Snap to eighth notes.
    Eighth,
    /// Snap to sixteenth notes.
    Sixteenth,
}

/// The denominator of the time signature.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub enum TimeDenominator {
    /// Quavers (eighth notes): x/8 time.
    Quavers,
    /// Crotchets (quarter notes): x/4 time.
    Crotchets,
    /// Minims (half notes): x/2 time.
    Minims,
}

// NoteValue impls.

impl NoteValue {
    /// Returns the length of the symbol in crotchets.
    pub fn crotchets(&self) -> f32 {
        match self {
            NoteValue::Semidemiquaver => 0.125,
            NoteValue::Semiquaver => 0.25,
            NoteValue::DottedSemiquaver => 0.375,
            NoteValue::Quaver => 0.5,
            NoteValue::DottedQuaver => 0.75,
            NoteValue::Crotchet => 1.0,
            NoteValue::DottedCrotchet => 1.5,
            NoteValue::Minim => 2.0,
            NoteValue::DottedMinim => 3.0,
            NoteValue::Semibreve => 4.0,
        }
    }

    /// Returns the length of the symbol in seconds at the given crotchet
    /// length.
    pub fn seconds(&self, crotchet_seconds: f32) -> f32 {
        self.crotchets() * crotchet_seconds
    }

    /// Returns the symbol whose duration equals `note_seconds`.
    ///
    /// `note_seconds` is expected to be a whole multiple of
    /// `min_note_seconds` (the grid step).  When no symbol matches exactly,
    /// the search retries with one grid step shaved off, so the remainder of
    /// an unrepresentable duration is dropped.
    pub fn classify(note_seconds: f32, crotchet_seconds: f32, min_note_seconds: f32) -> NoteValue {
        let epsilon = crotchet_seconds * 1e-3;

        for value in ALL_NOTE_VALUES.iter() {
            if (value.seconds(crotchet_seconds) - note_seconds).abs() < epsilon {
                return *value;
            }
        }

        if note_seconds - min_note_seconds > epsilon {
            Self::classify(note_seconds - min_note_seconds, crotchet_seconds, min_note_seconds)
        } else {
            NoteValue::Semidemiquaver
        }
    }
}

impl HasStaticName for NoteValue {
    fn static_name(&self) -> &'static str {
        match self {
            NoteValue::Semidemiquaver => "semidemiquaver",
            NoteValue::Semiquaver => "semiquaver",
            NoteValue::DottedSemiquaver => "dotted semiquaver",
            NoteValue::Quaver => "quaver",
            NoteValue::DottedQuaver => "dotted quaver",
            NoteValue::Crotchet => "crotchet",
            NoteValue::DottedCrotchet => "dotted crotchet",
            NoteValue::Minim => "minim",
            NoteValue::DottedMinim => "dotted minim",
            NoteValue::Semibreve => "semibreve",
        }
    }
}

// Quantization impls.

impl Quantization {
    /// Returns the quantization factor: the number of grid steps per
    /// crotchet.
    pub fn factor(&self) -> f32 {
        match self {
            Quantization::Whole => 0.25,
            Quantization::Half => 0.5,
            Quantization::Quarter => 1.0,
            Quantization::Eighth => 2.0,
            Quantization::Sixteenth => 4.0,
        }
    }
}

impl HasStaticName for Quantization {
    fn static_name(&self) -> &'static str {
        match self {
            Quantization::Whole => "1/1 note",
            Quantization::Half => "1/2 note",
            Quantization::Quarter => "1/4 note",
            Quantization::Eighth => "1/8 note",
            Quantization::Sixteenth => "1/16 note",
        }
    }
}

impl Parsable for Quantization {
    fn parse(symbol: &str) -> Res<Self> {
        match symbol.trim().trim_end_matches(" note") {
            "1/1" => Ok(Quantization::Whole),
            "1/2" => Ok(Quantization::Half),
            "1/4" => Ok(Quantization::Quarter),
            "1/8" => Ok(Quantization::Eighth),
            "1/16" => Ok(Quantization::Sixteenth),
            _ => Err(anyhow::Error::msg(format!("Unrecognized quantization `{symbol}` (expected `1/1 note` through `1/16 note`)."))),
        }
    }
}

// TimeDenominator impls.

impl TimeDenominator {
    /// Returns the denominator as the power-of-two exponent the MIDI
    /// time-signature event expects (quavers are x/8 time, so 3).
    pub fn exponent(&self) -> u8 {
        match self {
            TimeDenominator::Quavers => 3,
            TimeDenominator::Crotchets => 2,
            TimeDenominator::Minims => 1,
        }
    }
}

impl HasStaticName for TimeDenominator {
    fn static_name(&self) -> &'static str {
        match self {
            TimeDenominator::Quavers => "Quavers",
            TimeDenominator::Crotchets => "Crotchets",
            TimeDenominator::Minims => "Minims",
        }
    }
}

impl Parsable for TimeDenominator {
    fn parse(symbol: &str) -> Res<Self> {
        match symbol.trim().to_ascii_lowercase().as_str() {
            "quavers" | "quaver" | "8" => Ok(TimeDenominator::Quavers),
            "crotchets" | "crotchet" | "4" => Ok(TimeDenominator::Crotchets),
            "minims" | "minim" | "2" => Ok(TimeDenominator::Minims),
            _ => Err(anyhow::Error::msg(format!("Unrecognized time denominator `{symbol}` (expected `Quavers`, `Crotchets`, or `Minims`)."))),
        }
    }
}

// Statics.

/// All rhythmic symbols, shortest first.
pub static ALL_NOTE_VALUES: [NoteValue; 10] = [
    NoteValue::Semidemiquaver,
    NoteValue::Semiquaver,
    NoteValue::DottedSemiquaver,
    NoteValue::Quaver,
    NoteValue::DottedQuaver,
    NoteValue::Crotchet,
    NoteValue::DottedCrotchet,
    NoteValue::Minim,
    NoteValue::DottedMinim,
    NoteValue::Semibreve,
];

// Tests.
