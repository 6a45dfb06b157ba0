//! A module for the [`Semitone`] table.
//!
//! The transcriber recognizes the 37 semitones from C3 to C6.  Anything a
//! player produces outside that range is reported as undetectable.

use crate::core::base::HasStaticName;

// Traits.

/// A trait for types that have a reference frequency.
pub trait HasFrequency {
    /// Returns the reference frequency of the type, in hertz.
    fn frequency(&self) -> f32;
}

/// A trait for types that have a MIDI note number.
pub trait HasMidiNumber {
    /// Returns the MIDI note number of the type.
    fn midi_number(&self) -> u8;
}

// Struct.

/// One entry of the recognizable pitch table.
///
/// The table spans C3 (130.81 Hz, MIDI 48) through C6 (1046.50 Hz, MIDI 84)
/// and is strictly monotonic in frequency.
#[derive(PartialEq, Debug)]
pub struct Semitone {
    /// The display name of the semitone (e.g., `"A4"`).
    pub name: &'static str,
    /// The equal-temperament reference frequency, in hertz.
    pub frequency: f32,
    /// The MIDI note number.
    pub midi: u8,
}

// Impls.

impl HasStaticName for Semitone {
    fn static_name(&self) -> &'static str {
        self.name
    }
}

impl HasFrequency for Semitone {
    fn frequency(&self) -> f32 {
        self.frequency
    }
}

impl HasMidiNumber for Semitone {
    fn midi_number(&self) -> u8 {
        self.midi
    }
}

impl Semitone {
    /// Returns the semitone nearest to the given frequency, if the frequency
    /// falls inside the recognizable range.
    ///
    /// An entry matches when the frequency lies strictly between the
    /// neighboring reference frequencies and is closer to this entry than to
    /// the next one up.  Frequencies below C3 or above C6 return `None`.
    pub fn from_frequency(frequency: f32) -> Option<&'static Semitone> {
        let mut last = 0.0f32;

        for (i, semitone) in SEMITONES.iter().enumerate() {
            if i != 0 {
                last = SEMITONES[i - 1].frequency;
            }

            let next = SEMITONES.get(i + 1).map(|s| s.frequency).unwrap_or(UPPER_BOUND_FREQUENCY);

            if frequency > last && frequency < next && (semitone.frequency - frequency).abs() < (next - frequency).abs() {
                return Some(semitone);
            }
        }

        None
    }

    /// Returns the semitone with the given MIDI note number, if it is inside
    /// the recognizable range.
    pub fn from_midi(midi: u8) -> Option<&'static Semitone> {
        SEMITONES.iter().find(|s| s.midi == midi)
    }
}

// Statics.

/// The number of recognizable semitones.
pub const SEMITONE_COUNT: usize = 37;

/// The frequency just above the top of the table (C#6), used purely for
/// upper-bound checking when the detected note is a C6.
const UPPER_BOUND_FREQUENCY: f32 = 1108.73;

macro_rules! semitone {
    ($name:literal, $frequency:literal, $midi:literal) => {
        Semitone {
            name: $name,
            frequency: $frequency,
            midi: $midi,
        }
    };
}

/// The recognizable pitch table, C3 through C6.
pub static SEMITONES: [Semitone; SEMITONE_COUNT] = [
    semitone!("C3", 130.81, 48),
    semitone!("C#3", 138.59, 49),
    semitone!("D3", 146.83, 50),
    semitone!("D#3", 155.56, 51),
    semitone!("E3", 164.81, 52),
    semitone!("F3", 174.61, 53),
    semitone!("F#3", 185.00, 54),
    semitone!("G3", 196.00, 55),
    semitone!("G#3", 207.65, 56),
    semitone!("A3", 220.00, 57),
    semitone!("Bb3", 233.08, 58),
    semitone!("B3", 246.94, 59),
    semitone!("C4", 261.63, 60),
    semitone!("C#4", 277.18, 61),
    semitone!("D4", 293.66, 62),
    semitone!("D#4", 311.13, 63),
    semitone!("E4", 329.63, 64),
    semitone!("F4", 349.23, 65),
    semitone!("F#4", 369.99, 66),
    semitone!("G4", 392.00, 67),
    semitone!("G#4", 415.30, 68),
    semitone!("A4", 440.00, 69),
    semitone!("Bb4", 466.16, 70),
    semitone!("B4", 493.88, 71),
    semitone!("C5", 523.25, 72),
    semitone!("C#5", 554.37, 73),
    semitone!("D5", 587.33, 74),
    semitone!("D#5", 622.25, 75),
    semitone!("E5", 659.26, 76),
    semitone!("F5", 698.46, 77),
    semitone!("F#5", 739.99, 78),
    semitone!("G5", 783.99, 79),
    semitone!("G#5", 830.61, 80),
    semitone!("A5", 880.00, 81),
    semitone!("Bb5", 932.33, 82),
    semitone!("B5", 987.77, 83),
    semitone!("C6", 1046.50, 84),
];

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_is_strictly_monotonic() {
        for pair in SEMITONES.windows(2) {
            assert!(pair[0].frequency < pair[1].frequency);
            assert!(pair[0].midi < pair[1].midi);
        }

        assert!(SEMITONES[SEMITONE_COUNT - 1].frequency < UPPER_BOUND_FREQUENCY);
    }

    #[test]
    fn test_from_frequency_exact() {
        assert_eq!(Semitone::from_frequency(440.0).unwrap().name, "A4");
        assert_eq!(Semitone::from_frequency(130.81).unwrap().midi, 48);
        assert_eq!(Semitone::from_frequency(1046.50).unwrap().name, "C6");
    }

    #[test]
    fn test_from_frequency_nearest() {
        // 442 Hz is sharp of A4 but closer to it than to Bb4.
        assert_eq!(Semitone::from_frequency(442.0).unwrap().name, "A4");
        // 260 Hz is flat of C4 but closer to it than to B3.
        assert_eq!(Semitone::from_frequency(260.0).unwrap().name, "C4");
    }

    #[test]
    fn test_from_frequency_out_of_range() {
        assert_eq!(Semitone::from_frequency(80.0), None);
        assert_eq!(Semitone::from_frequency(2000.0), None);
        assert_eq!(Semitone::from_frequency(0.0), None);
    }

    #[test]
    fn test_from_midi() {
        assert_eq!(Semitone::from_midi(69).unwrap().name, "A4");
        assert_eq!(Semitone::from_midi(47), None);
        assert_eq!(Semitone::from_midi(85), None);
    }

    #[test]
    fn test_properties() {
        let a4 = Semitone::from_midi(69).unwrap();

        assert_eq!(a4.static_name(), "A4");
        assert_eq!(a4.frequency(), 440.0);
        assert_eq!(a4.midi_number(), 69);
    }
}
