//! The session controller: owns the worker thread that captures, analyzes,
//! and emits, and the two flags the caller steers it with.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::JoinHandle,
};

use crate::{
    analyze::{
        source::{FrameRead, FrameSource, WavSource},
        Analyzer,
    },
    core::{
        base::{Res, Void},
        config::{AudioConfig, MusicConfig},
    },
    emit,
};

// Types.

/// Where a session's samples come from.
#[derive(Clone, Debug)]
pub enum InputMode {
    /// Record live from the default input device, teeing the raw samples
    /// into `<output>.wav` for the analysis pass.
    #[cfg(feature = "record")]
    Microphone,
    /// Analyze an uploaded `.wav` file directly.
    WavFile(PathBuf),
}

/// What a completed session produced.
#[derive(Clone, Debug)]
pub struct Summary {
    /// The number of note and silence events committed by the segmenter.
    pub events: usize,
    /// The number of analysis frames processed.
    pub frames: usize,
    /// The path of the emitted MIDI file.
    pub midi_path: PathBuf,
    /// The path of the recorded WAV file, for live sessions.
    pub wav_path: Option<PathBuf>,
}

/// One transcription session.
///
/// The session owns all pipeline state; the caller holds a handle and talks
/// to the worker through two flags.  `running` is written here and read by
/// the worker; `processing` is written by the worker and read here.  The
/// worker polls `running` once per raw frame, so cancellation is
/// cooperative and the in-flight frame always completes.
pub struct Session {
    audio: AudioConfig,
    running: Arc<AtomicBool>,
    processing: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<Res<Summary>>>>,
}

impl Session {
    /// Creates a session with the given audio parameters.
    pub fn new(audio: AudioConfig) -> Self {
        Self {
            audio,
            running: Arc::new(AtomicBool::new(false)),
            processing: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Validates the config and spawns the worker.
    ///
    /// Fails without starting anything when the config is incomplete, when
    /// an upload is not a `.wav` file, or when a worker is already running.
    pub fn start(&self, music: MusicConfig, input: InputMode) -> Void {
        music.validate()?;

        if let InputMode::WavFile(path) = &input {
            let is_wav = path.extension().map(|e| e.eq_ignore_ascii_case("wav")).unwrap_or(false);

            if !is_wav {
                return Err(anyhow::Error::msg("Please supply a .wav file."));
            }
        }

        let mut worker = self.worker.lock().unwrap();

        if worker.is_some() {
            return Err(anyhow::Error::msg("A session is already running."));
        }

        self.running.store(true, Ordering::SeqCst);
        self.processing.store(true, Ordering::SeqCst);

        let audio = self.audio.clone();
        let running = self.running.clone();
        let processing = self.processing.clone();

        *worker = Some(std::thread::spawn(move || {
            let result = run_worker(&audio, &music, input, &running);

            // Flags clear on every exit path, error or not.
            processing.store(false, Ordering::SeqCst);
            running.store(false, Ordering::SeqCst);

            result
        }));

        Ok(())
    }

    /// Asks the worker to stop capturing.  The worker drains, emits, and
    /// exits on its own; use [`Session::wait`] to collect the result.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Returns whether the worker is still at work.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Blocks until the worker exits and returns its summary.
    pub fn wait(&self) -> Res<Summary> {
        let handle = self
            .worker
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow::Error::msg("No session has been started."))?;

        handle.join().map_err(|_| anyhow::Error::msg("The session worker panicked."))?
    }
}

// Worker.

fn run_worker(audio: &AudioConfig, music: &MusicConfig, input: InputMode, running: &AtomicBool) -> Res<Summary> {
    match input {
        #[cfg(feature = "record")]
        InputMode::Microphone => run_live(audio, music, running),
        InputMode::WavFile(path) => run_upload(audio, music, &path, running),
    }
}

/// Captures from the device into the scratch WAV until the run flag drops,
/// then replays the recording through the analysis chain.
#[cfg(feature = "record")]
fn run_live(audio: &AudioConfig, music: &MusicConfig, running: &AtomicBool) -> Res<Summary> {
    use crate::analyze::source::{DeviceSource, WavTee};

    let wav_path = music.output.with_extension("wav");

    {
        let mut source = DeviceSource::open(audio)?;
        let mut tee = WavTee::create(&wav_path, audio.sample_rate)?;
        let mut frame = vec![0.0f32; audio.window_size];

        tracing::info!("Recording from the default input device");

        while running.load(Ordering::SeqCst) {
            match source.read_frame(&mut frame)? {
                FrameRead::Full => tee.write(&frame)?,
                FrameRead::Eof => break,
            }
        }

        tee.finalize()?;
    }

    tracing::info!("Recording stopped; analyzing {}", wav_path.display());

    let source = WavSource::open(&wav_path)?;
    let mut summary = analyze_and_emit(audio, music, source, running)?;
    summary.wav_path = Some(wav_path);

    Ok(summary)
}

/// Analyzes an uploaded WAV file directly.
fn run_upload(audio: &AudioConfig, music: &MusicConfig, path: &std::path::Path, running: &AtomicBool) -> Res<Summary> {
    tracing::info!("Analyzing {}", path.display());

    let source = WavSource::open(path)?;

    analyze_and_emit(audio, music, source, running)
}

/// Runs the analysis chain over a WAV source and emits the MIDI file.
fn analyze_and_emit(audio: &AudioConfig, music: &MusicConfig, mut source: WavSource, running: &AtomicBool) -> Res<Summary> {
    let mut audio = audio.clone();

    if source.sample_rate() != audio.sample_rate {
        tracing::warn!("File sample rate {} differs from the native {}; analyzing at the file's rate", source.sample_rate(), audio.sample_rate);
        audio.sample_rate = source.sample_rate();
    }

    let total_samples = source.len();

    let mut analyzer = Analyzer::new(&audio);
    let mut frame = vec![0.0f32; audio.window_size];

    loop {
        match source.read_frame(&mut frame)? {
            FrameRead::Full => analyzer.feed(&frame),
            FrameRead::Eof => break,
        }

        if analyzer.is_full() {
            running.store(false, Ordering::SeqCst);
            break;
        }
    }

    let outcome = analyzer.finish();

    for event in &outcome.events {
        tracing::info!("{} for {} frames", event.name, event.frames);
    }

    // Seconds of audio represented by one analysis frame.
    let frame_time = if outcome.frames_analyzed == 0 {
        0.0
    } else {
        total_samples as f32 / audio.sample_rate as f32 / outcome.frames_analyzed as f32
    };

    let midi_path = music.output.with_extension("mid");

    emit::write_midi_file(&outcome.events, music, frame_time, &midi_path)?;

    Ok(Summary {
        events: outcome.events.len(),
        frames: outcome.frames_analyzed,
        midi_path,
        wav_path: None,
    })
}

// Tests.
