//! End-to-end upload-session tests: synthesize a WAV, transcribe it, and
//! parse the emitted MIDI back.

use std::{f32::consts::PI, fs, path::Path};

use midly::{MidiMessage, Smf, TrackEventKind};
use nlib::{
    core::{
        base::Parsable,
        config::{AudioConfig, MusicConfig},
        key::KeySignature,
        rhythm::{Quantization, TimeDenominator},
    },
    session::{InputMode, Session},
};
use pretty_assertions::assert_eq;

const SAMPLE_RATE: u32 = 22_050;

fn music_config(output: &Path, tempo_bpm: u16, quantization: Quantization) -> MusicConfig {
    MusicConfig {
        tempo_bpm,
        beats_per_bar: 4,
        time_denom: TimeDenominator::Crotchets,
        key: KeySignature::parse("C major").unwrap(),
        quantization,
        output: output.to_path_buf(),
    }
}

fn sine(frequency: f32, seconds: f32) -> Vec<f32> {
    let count = (SAMPLE_RATE as f32 * seconds) as usize;

    (0..count).map(|i| 0.2 * (2.0 * PI * frequency * i as f32 / SAMPLE_RATE as f32).sin()).collect()
}

fn silence(seconds: f32) -> Vec<f32> {
    vec![0.0; (SAMPLE_RATE as f32 * seconds) as usize]
}

fn write_wav(path: &Path, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for sample in samples {
        writer.write_sample(*sample).unwrap();
    }
    writer.finalize().unwrap();
}

/// Transcribes the samples and returns the `(key, delta_to_off)` pairs of
/// the emitted notes.
fn transcribe(samples: &[f32], tempo_bpm: u16, quantization: Quantization, window_size: usize) -> Vec<(u8, u32)> {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("input.wav");

    write_wav(&wav, samples);

    let session = Session::new(AudioConfig::new(window_size).unwrap());
    let music = music_config(&dir.path().join("take"), tempo_bpm, quantization);

    session.start(music, InputMode::WavFile(wav)).unwrap();
    let summary = session.wait().unwrap();

    let bytes = fs::read(&summary.midi_path).unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    assert_eq!(smf.tracks.len(), 1);

    let mut notes = Vec::new();
    let mut pending: Option<u8> = None;

    for event in &smf.tracks[0] {
        match event.kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, .. },
                ..
            } => {
                assert_eq!(pending, None, "note on while another note is sounding");
                pending = Some(key.as_int());
            }
            TrackEventKind::Midi {
                message: MidiMessage::NoteOff { key, .. },
                ..
            } => {
                assert_eq!(pending, Some(key.as_int()), "unmatched note off");
                notes.push((key.as_int(), event.delta.as_int()));
                pending = None;
            }
            _ => {}
        }
    }

    assert_eq!(pending, None, "dangling note on");

    notes
}

#[test]
fn test_single_sustained_note() {
    // One second of A4 at tempo 60 on a quarter-note grid: one crotchet of
    // MIDI 69.
    let notes = transcribe(&sine(440.0, 1.0), 60, Quantization::Quarter, 2048);

    assert_eq!(notes, vec![(69, 480)]);
}

#[test]
fn test_single_sustained_note_at_other_window_sizes() {
    for window_size in [1024, 4096] {
        let notes = transcribe(&sine(440.0, 1.0), 60, Quantization::Quarter, window_size);

        assert_eq!(notes, vec![(69, 480)], "window size {window_size}");
    }
}

#[test]
fn test_note_rest_note_folds_the_rest() {
    // C4, rest, E4.  The rest folds into the C4, so exactly two notes come
    // out, the first twice as long as the second, with no gap between them.
    let mut samples = sine(261.63, 0.5);
    samples.extend(silence(0.5));
    samples.extend(sine(329.63, 0.5));

    let notes = transcribe(&samples, 120, Quantization::Eighth, 2048);

    assert_eq!(notes.len(), 2);

    let (first_key, first_ticks) = notes[0];
    let (second_key, second_ticks) = notes[1];

    assert_eq!(first_key, 60);
    assert_eq!(second_key, 64);
    assert_eq!(first_ticks, second_ticks * 2);
}

#[test]
fn test_out_of_range_tone_emits_header_only() {
    // 80 Hz sits below C3; the file carries header events and nothing else.
    let notes = transcribe(&sine(80.0, 1.0), 60, Quantization::Quarter, 2048);

    assert_eq!(notes, vec![]);
}

#[test]
fn test_pure_silence_emits_header_only() {
    let notes = transcribe(&silence(2.0), 60, Quantization::Quarter, 2048);

    assert_eq!(notes, vec![]);
}

#[test]
fn test_header_carries_the_session_config() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("input.wav");

    write_wav(&wav, &sine(440.0, 1.0));

    let session = Session::new(AudioConfig::new(2048).unwrap());

    let mut music = music_config(&dir.path().join("take"), 90, Quantization::Quarter);
    music.beats_per_bar = 3;
    music.key = KeySignature::parse("A minor").unwrap();

    session.start(music, InputMode::WavFile(wav)).unwrap();
    let summary = session.wait().unwrap();

    let bytes = fs::read(&summary.midi_path).unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    let metas: Vec<_> = smf.tracks[0]
        .iter()
        .filter_map(|event| match event.kind {
            TrackEventKind::Meta(message) => Some(message),
            _ => None,
        })
        .collect();

    use midly::MetaMessage;

    assert!(metas.contains(&MetaMessage::Tempo(midly::num::u24::new(60_000_000 / 90))));
    assert!(metas.contains(&MetaMessage::TimeSignature(3, 2, 24, 8)));

    // A minor collapses to C major's signature.
    assert!(metas.contains(&MetaMessage::KeySignature(0, false)));
}
