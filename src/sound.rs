use crate::types::BEAT_IDLE;
use hound::{SampleFormat, WavReader};
use log::{debug, info};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("failed to read tick asset {path:?}: {source}")]
    Asset {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("tick asset {0:?} contains no samples")]
    Empty(PathBuf),
    #[error("no default audio output device found")]
    NoDevice,
    #[error("audio stream: {0}")]
    Stream(String),
}

/// Playback handle for the tick clip.
///
/// Implementations swallow their own failures: a missing or broken output
/// must never disturb the beat loop.
pub trait TickSound {
    /// Start the clip from time zero.
    fn play_from_start(&mut self);
    /// Halt the clip and rewind it to time zero.
    fn stop_and_rewind(&mut self);
}

/// Used when the asset or the output device is unavailable, or sound is muted.
#[derive(Debug, Default)]
pub struct SilentSound;

impl TickSound for SilentSound {
    fn play_from_start(&mut self) {}
    fn stop_and_rewind(&mut self) {}
}

/// Decoded tick clip: mono f32 samples, normalized -1.0 to 1.0.
#[derive(Debug, Clone)]
pub struct TickSample {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl TickSample {
    pub fn load(path: &Path) -> Result<Self, SoundError> {
        let asset_err = |source| SoundError::Asset {
            path: path.to_path_buf(),
            source,
        };
        let reader = WavReader::open(path).map_err(asset_err)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let samples_f32: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(asset_err)?,
            SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / max))
                    .collect::<Result<_, _>>()
                    .map_err(asset_err)?
            }
        };

        let mono: Vec<f32> = if channels == 1 {
            samples_f32
        } else {
            samples_f32
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        if mono.is_empty() {
            return Err(SoundError::Empty(path.to_path_buf()));
        }

        info!(
            "Tick asset: {:?}  {} Hz  {} samples",
            path.file_name().unwrap_or_default(),
            spec.sample_rate,
            mono.len()
        );

        Ok(Self {
            samples: mono,
            sample_rate: spec.sample_rate,
        })
    }
}

/// Plays the tick in lockstep with beat transitions.
///
/// The clip is active while `started` is true and the beat is counted. Each
/// change of `(started, beat)` stops the previous activation before starting
/// the next one, so at most one playback is ever live.
pub struct SoundTrigger {
    sound: Box<dyn TickSound>,
    last: (bool, i64),
}

impl SoundTrigger {
    pub fn new(sound: Box<dyn TickSound>) -> Self {
        Self {
            sound,
            last: (false, BEAT_IDLE),
        }
    }

    pub fn update(&mut self, started: bool, beat: i64) {
        if (started, beat) == self.last {
            return;
        }
        if is_active(self.last) {
            self.sound.stop_and_rewind();
        }
        self.last = (started, beat);
        if is_active(self.last) {
            debug!("Tick at beat {}", beat);
            self.sound.play_from_start();
        }
    }
}

impl Drop for SoundTrigger {
    fn drop(&mut self) {
        if is_active(self.last) {
            self.sound.stop_and_rewind();
        }
    }
}

fn is_active((started, beat): (bool, i64)) -> bool {
    started && beat != BEAT_IDLE
}
