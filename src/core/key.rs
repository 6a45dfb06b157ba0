//! A module for the [`KeySignature`] type.

use std::fmt::{self, Display, Formatter};

use crate::core::base::{Parsable, Res};

// Enum.

/// The mode of a key signature.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub enum KeyMode {
    /// A major key.
    Major,
    /// A minor key.
    Minor,
}

// Struct.

/// A key signature chosen by the user, one of the 24 major/minor keys.
///
/// MIDI key signatures carry only an accidental count, so a minor key is
/// written with the accidentals of its relative major (A minor and C major
/// are indistinguishable in the emitted file).  This is a known limitation
/// of the format, not of the transcriber.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub struct KeySignature {
    tonic: u8,
    mode: KeyMode,
    flat_spelled: bool,
}

// Impls.

impl KeySignature {
    /// Creates a new key signature from a tonic pitch class (0 = C), a mode,
    /// and whether the tonic was spelled with a flat.
    fn new(tonic: u8, mode: KeyMode, flat_spelled: bool) -> Self {
        Self {
            tonic: tonic % 12,
            mode,
            flat_spelled,
        }
    }

    /// Returns the mode of the key.
    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    /// Returns the accidental count of the signature: positive for sharps,
    /// negative for flats.
    ///
    /// Minor keys collapse to their relative major, three semitones up.
    pub fn accidentals(&self) -> i8 {
        let major_tonic = match self.mode {
            KeyMode::Major => self.tonic,
            KeyMode::Minor => (self.tonic + 3) % 12,
        };

        // Walk the circle of fifths to the tonic.  The tritone key is
        // spelled either way (F# major = Gb major); follow the user's
        // accidental.
        match major_tonic {
            0 => 0,
            7 => 1,
            2 => 2,
            9 => 3,
            4 => 4,
            11 => 5,
            6 => {
                if self.flat_spelled {
                    -6
                } else {
                    6
                }
            }
            5 => -1,
            10 => -2,
            3 => -3,
            8 => -4,
            1 => -5,
            _ => unreachable!("pitch class is taken modulo 12"),
        }
    }
}

impl Parsable for KeySignature {
    fn parse(symbol: &str) -> Res<Self> {
        let mut parts = symbol.split_whitespace();

        let tonic = parts.next().ok_or_else(|| anyhow::Error::msg("A key signature requires a tonic (e.g., `C major`)."))?;
        let mode = parts.next().ok_or_else(|| anyhow::Error::msg("A key signature requires a mode (e.g., `C major`)."))?;

        if parts.next().is_some() {
            return Err(anyhow::Error::msg(format!("Unrecognized key signature `{symbol}`.")));
        }

        let mode = match mode.to_ascii_lowercase().as_str() {
            "major" => KeyMode::Major,
            "minor" => KeyMode::Minor,
            _ => return Err(anyhow::Error::msg(format!("Unrecognized key mode `{mode}` (expected `major` or `minor`)."))),
        };

        let mut chars = tonic.chars();

        let letter = chars.next().ok_or_else(|| anyhow::Error::msg("A key signature requires a tonic letter."))?;
        let class = match letter.to_ascii_uppercase() {
            'C' => 0u8,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(anyhow::Error::msg(format!("Unrecognized tonic `{tonic}`."))),
        };

        let (class, flat_spelled) = match chars.next() {
            None => (class, false),
            Some('#') | Some('♯') => ((class + 1) % 12, false),
            Some('b') | Some('♭') => ((class + 11) % 12, true),
            Some(_) => return Err(anyhow::Error::msg(format!("Unrecognized tonic `{tonic}`."))),
        };

        if chars.next().is_some() {
            return Err(anyhow::Error::msg(format!("Unrecognized tonic `{tonic}`.")));
        }

        Ok(Self::new(class, mode, flat_spelled))
    }
}

impl Display for KeySignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let tonic = if self.flat_spelled {
            ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "Cb"][self.tonic as usize]
        } else {
            ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"][self.tonic as usize]
        };

        let mode = match self.mode {
            KeyMode::Major => "major",
            KeyMode::Minor => "minor",
        };

        write!(f, "{tonic} {mode}")
    }
}

// Tests.
