use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use nlib::{
    core::{
        base::{Parsable, Res, Void},
        config::{AudioConfig, MusicConfig},
        key::KeySignature,
        rhythm::{Quantization, TimeDenominator},
    },
    session::{InputMode, Session, Summary},
};
use tracing_subscriber::{filter::LevelFilter, fmt::SubscriberBuilder};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Flag that specifies verbose logging.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Flag that suppresses all tracing output.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Records from the default input device and transcribes the take.
    ///
    /// Recording runs until you press ENTER.  The raw take is written to
    /// `<output>.wav` and then replayed through the analysis chain, so the
    /// exact recording can be re-analyzed later; the transcription lands in
    /// `<output>.mid`.
    #[cfg(feature = "record")]
    Record {
        #[command(flatten)]
        music: MusicArgs,
    },

    /// Transcribes an existing `.wav` file into `<output>.mid`.
    File {
        /// The WAV file to transcribe (32-bit float or integer PCM, mono
        /// preferred; other channel counts are downmixed).
        source: PathBuf,

        #[command(flatten)]
        music: MusicArgs,
    },
}

/// The musical parameters of the transcription.
#[derive(ClapArgs, Debug)]
struct MusicArgs {
    /// Tempo in beats per minute (10 through 200).
    #[arg(short, long, default_value_t = 120)]
    tempo: u16,

    /// Beats per bar (2 through 16).
    #[arg(short, long, default_value_t = 4)]
    beats_per_bar: u8,

    /// Time signature denominator: Quavers, Crotchets, or Minims.
    #[arg(short = 'd', long, default_value = "Crotchets")]
    time_denom: String,

    /// Key signature, one of the 24 major/minor keys (e.g., "C major",
    /// "A minor", "Bb major").
    #[arg(short, long, default_value = "C major")]
    key: String,

    /// FFT window size: 1024, 2048, 4096, or 8192.
    #[arg(short, long, default_value_t = 4096)]
    fft_size: usize,

    /// Rhythmic grid to snap durations to: "1/1 note" through "1/16 note".
    #[arg(short = 'Q', long, default_value = "1/8 note")]
    quantization: String,

    /// Output path stem; the transcription is written to `<output>.mid`
    /// (and the raw take to `<output>.wav` when recording).
    #[arg(short, long)]
    output: PathBuf,
}

impl MusicArgs {
    fn into_configs(self) -> Res<(AudioConfig, MusicConfig)> {
        let audio = AudioConfig::new(self.fft_size)?;

        let music = MusicConfig {
            tempo_bpm: self.tempo,
            beats_per_bar: self.beats_per_bar,
            time_denom: TimeDenominator::parse(&self.time_denom)?,
            key: KeySignature::parse(&self.key)?,
            quantization: Quantization::parse(&self.quantization)?,
            output: self.output,
        };

        Ok((audio, music))
    }
}

fn main() -> Void {
    let args = Args::parse();

    init_tracing(args.verbose, args.quiet);

    start(args)?;

    Ok(())
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level_filter = if quiet {
        LevelFilter::OFF
    } else if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    SubscriberBuilder::default()
        .with_ansi(true)
        .with_level(!quiet)
        .with_file(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_max_level(level_filter)
        .init();
}

fn start(args: Args) -> Void {
    match args.command {
        #[cfg(feature = "record")]
        Some(Command::Record { music }) => {
            let (audio, music) = music.into_configs()?;

            let session = Session::new(audio);
            session.start(music, InputMode::Microphone)?;

            println!("Recording... press ENTER to stop.");
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;

            session.stop();

            let summary = session.wait()?;
            report(&summary);
        }
        Some(Command::File { source, music }) => {
            let (audio, music) = music.into_configs()?;

            let session = Session::new(audio);
            session.start(music, InputMode::WavFile(source))?;

            let summary = session.wait()?;
            report(&summary);
        }
        None => {
            return Err(anyhow::Error::msg("No subcommand given.  Try `notare file --help`."));
        }
    }

    Ok(())
}

fn report(summary: &Summary) {
    println!("Committed {} events over {} analysis frames.", summary.events, summary.frames);
    println!("MIDI written to {}.", summary.midi_path.display());

    if let Some(wav_path) = &summary.wav_path {
        println!("Raw recording written to {}.", wav_path.display());
    }
}
