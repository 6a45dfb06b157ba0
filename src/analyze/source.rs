//! Frame sources: where the pipeline's raw sample frames come from.
//!
//! There are two concrete sources behind one capability: the default input
//! device (live capture) and a WAV file (uploads, and the re-analysis pass
//! of a live recording).

use std::path::Path;

use crate::core::base::Res;

// Types.

/// The outcome of one frame read.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum FrameRead {
    /// The buffer was filled (possibly zero-padded at the very end of a
    /// file).
    Full,
    /// The source is exhausted.
    Eof,
}

/// A capability that yields fixed-size frames of mono float samples.
pub trait FrameSource {
    /// Fills `buf` with the next frame of samples.
    ///
    /// Blocks until a full frame is available.  Returns [`FrameRead::Eof`]
    /// once the source is exhausted.
    fn read_frame(&mut self, buf: &mut [f32]) -> Res<FrameRead>;
}

// WAV file source.

/// A frame source backed by a decoded WAV file.
pub struct WavSource {
    samples: Vec<f32>,
    sample_rate: u32,
    cursor: usize,
}

impl WavSource {
    /// Opens a WAV file and decodes it into a mono float buffer.
    ///
    /// Integer PCM is normalized to `[-1, 1]` by its own bit depth;
    /// multi-channel files are downmixed by averaging (trivially so for the
    /// mono input the pipeline expects).
    pub fn open(path: impl AsRef<Path>) -> Res<Self> {
        let mut reader = hound::WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        if spec.channels == 0 {
            anyhow::bail!("Audio file has zero channels.");
        }

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => downmix(reader.samples::<f32>(), spec.channels)?,
            hound::SampleFormat::Int => {
                let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                downmix(reader.samples::<i32>().map(|s| s.map(|v| v as f32 / full_scale)), spec.channels)?
            }
        };

        Ok(Self::from_samples(samples, spec.sample_rate))
    }

    /// Creates a source over an in-memory sample buffer.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            cursor: 0,
        }
    }

    /// Returns the sample rate of the underlying file.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the total number of samples in the underlying file.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns whether the underlying file holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Folds a stream of interleaved samples into one mono channel, averaging
/// each group of `channels` values as it goes.
fn downmix<E>(samples: impl Iterator<Item = Result<f32, E>>, channels: u16) -> Res<Vec<f32>>
where
    E: Into<anyhow::Error>,
{
    let channels = channels as usize;
    let mut mono = Vec::new();

    for (index, sample) in samples.enumerate() {
        let share = sample.map_err(Into::into)? / channels as f32;

        match mono.last_mut() {
            Some(slot) if index % channels != 0 => *slot += share,
            _ => mono.push(share),
        }
    }

    Ok(mono)
}

impl FrameSource for WavSource {
    fn read_frame(&mut self, buf: &mut [f32]) -> Res<FrameRead> {
        if self.cursor >= self.samples.len() {
            return Ok(FrameRead::Eof);
        }

        let available = (self.samples.len() - self.cursor).min(buf.len());

        buf[..available].copy_from_slice(&self.samples[self.cursor..self.cursor + available]);
        buf[available..].fill(0.0);

        self.cursor += available;

        Ok(FrameRead::Full)
    }
}

// WAV tee.

/// Writes raw frames into a 32-bit float mono WAV file as they are captured,
/// so a live recording can be replayed through the analysis chain.
pub struct WavTee {
    writer: hound::WavWriter<std::io::BufWriter<std::fs::File>>,
}

impl WavTee {
    /// Creates the scratch WAV file at `path`.
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Res<Self> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        Ok(Self {
            writer: hound::WavWriter::create(path.as_ref(), spec)?,
        })
    }

    /// Appends one frame of samples.
    pub fn write(&mut self, frame: &[f32]) -> Res<()> {
        for sample in frame {
            self.writer.write_sample(*sample)?;
        }

        Ok(())
    }

    /// Flushes and closes the file.
    pub fn finalize(self) -> Res<()> {
        self.writer.finalize()?;

        Ok(())
    }
}

// Live device source.

#[cfg(feature = "record")]
pub use self::device::DeviceSource;

#[cfg(feature = "record")]
mod device {
    use std::{
        collections::VecDeque,
        sync::{Arc, Condvar, Mutex},
    };

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    use super::{FrameRead, FrameSource};
    use crate::core::{base::Res, config::AudioConfig};

    /// State shared between the capture callback and the blocking reader.
    struct SharedBuffer {
        samples: Mutex<VecDeque<f32>>,
        available: Condvar,
        error: Mutex<Option<cpal::StreamError>>,
    }

    /// A frame source backed by the system's default input device.
    ///
    /// The capture stream pushes samples into a shared queue; `read_frame`
    /// blocks until a full window is available.  Transient stream errors
    /// are logged and absorbed so a glitch does not kill a recording.
    pub struct DeviceSource {
        // Held so capture keeps running for the lifetime of the source.
        _stream: cpal::Stream,
        shared: Arc<SharedBuffer>,
    }

    impl DeviceSource {
        /// Opens the default input device at the configured rate.
        pub fn open(config: &AudioConfig) -> Res<Self> {
            let host = cpal::default_host();

            let device = host.default_input_device().ok_or_else(|| anyhow::Error::msg("No default input device."))?;

            let stream_config = cpal::StreamConfig {
                channels: config.channels,
                sample_rate: cpal::SampleRate(config.sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let shared = Arc::new(SharedBuffer {
                samples: Mutex::new(VecDeque::with_capacity(config.window_size * 4)),
                available: Condvar::new(),
                error: Mutex::new(None),
            });

            let stream = {
                let data_shared = shared.clone();
                let error_shared = shared.clone();

                device.build_input_stream::<f32, _, _>(
                    &stream_config,
                    move |data: &[_], _: &cpal::InputCallbackInfo| {
                        data_shared.samples.lock().unwrap().extend(data.iter().copied());
                        data_shared.available.notify_one();
                    },
                    move |err| {
                        error_shared.error.lock().unwrap().replace(err);
                        error_shared.available.notify_one();
                    },
                    None,
                )?
            };

            stream.play()?;

            Ok(Self { _stream: stream, shared })
        }
    }

    impl FrameSource for DeviceSource {
        fn read_frame(&mut self, buf: &mut [f32]) -> Res<FrameRead> {
            let mut queue = self.shared.samples.lock().unwrap();

            while queue.len() < buf.len() {
                // Transient read errors are absorbed; crashing mid-recording
                // would lose everything captured so far.
                if let Some(err) = self.shared.error.lock().unwrap().take() {
                    tracing::warn!("Input stream error (continuing): {err}");
                }

                queue = self.shared.available.wait(queue).unwrap();
            }

            for slot in buf.iter_mut() {
                *slot = queue.pop_front().unwrap_or_default();
            }

            Ok(FrameRead::Full)
        }
    }
}

// Tests.
