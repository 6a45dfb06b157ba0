//! A library for transcribing monophonic instrumental audio into quantized
//! MIDI.
//!
//! Samples flow through a frame-by-frame analysis chain — 50%-overlapped
//! framing, low-pass pre-filtering, Hann windowing, an FFT, Harmonic Product
//! Spectrum pitch estimation, and complex-domain onset detection — into a
//! note segmenter, and the finalized notes are snapped onto a rhythmic grid
//! and written as a MIDI file.
//!
//! # Examples
//!
//! ```
//! use nlib::core::pitch::Semitone;
//!
//! // A slightly sharp A4 still names as A4.
//! let semitone = Semitone::from_frequency(442.0).unwrap();
//! assert_eq!(semitone.name, "A4");
//! assert_eq!(semitone.midi, 69);
//! ```
//!
//! ```
//! use nlib::core::base::Parsable;
//! use nlib::core::key::KeySignature;
//!
//! // A minor carries the same accidentals as C major.
//! assert_eq!(KeySignature::parse("A minor").unwrap().accidentals(), 0);
//! ```
//!
//! ```
//! use nlib::core::rhythm::NoteValue;
//!
//! // One second at tempo 60 on a sixteenth-note grid is a crotchet.
//! assert_eq!(NoteValue::classify(1.0, 1.0, 0.25), NoteValue::Crotchet);
//! ```

#![warn(rustdoc::broken_intra_doc_links, rust_2018_idioms, clippy::all, missing_docs)]
#![allow(clippy::needless_range_loop)]

pub mod analyze;
pub mod core;
pub mod emit;
pub mod session;
