use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use log::{error, info};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::sound::{SoundError, TickSample, TickSound};

/// State shared between the controller and the realtime callback.
struct Playhead {
    playing: AtomicBool,
    /// Position in device frames since the clip was started.
    frame: AtomicUsize,
}

/// Plays the tick clip on the default output device via cpal.
///
/// Holds the cpal `Stream` alive; the stream runs for the whole session and
/// outputs silence whenever the clip is not playing.
pub struct CpalTickPlayer {
    _stream: Stream,
    playhead: Arc<Playhead>,
}

impl CpalTickPlayer {
    pub fn open(tick: TickSample) -> Result<Self, SoundError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(SoundError::NoDevice)?;

        info!(
            "Audio output: {}",
            device.name().unwrap_or_else(|_| "unknown".into())
        );

        let supported = device
            .default_output_config()
            .map_err(|e| SoundError::Stream(format!("no supported output config: {e}")))?;
        let format = supported.sample_format();
        let config: StreamConfig = supported.into();

        info!(
            "Playback config: {}Hz  {} ch  {:?}",
            config.sample_rate.0, config.channels, format
        );

        let playhead = Arc::new(Playhead {
            playing: AtomicBool::new(false),
            frame: AtomicUsize::new(0),
        });

        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, tick, playhead.clone())?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, tick, playhead.clone())?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, tick, playhead.clone())?,
            fmt => {
                return Err(SoundError::Stream(format!(
                    "unsupported sample format {fmt:?}"
                )))
            }
        };

        stream
            .play()
            .map_err(|e| SoundError::Stream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            playhead,
        })
    }
}

impl TickSound for CpalTickPlayer {
    fn play_from_start(&mut self) {
        self.playhead.frame.store(0, Ordering::Release);
        self.playhead.playing.store(true, Ordering::Release);
    }

    fn stop_and_rewind(&mut self) {
        self.playhead.playing.store(false, Ordering::Release);
        self.playhead.frame.store(0, Ordering::Release);
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    tick: TickSample,
    playhead: Arc<Playhead>,
) -> Result<Stream, SoundError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    // Nearest-index resampling from the asset rate to the device rate.
    let step = tick.sample_rate as f64 / config.sample_rate.0 as f64;
    let err_fn = |e: cpal::StreamError| error!("Audio stream error: {e}");

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _| {
                let start = playhead.frame.load(Ordering::Acquire);
                let playing = playhead.playing.load(Ordering::Acquire);
                let mut frame = start;
                for out in data.chunks_mut(channels) {
                    let src = (frame as f64 * step) as usize;
                    let value = match tick.samples.get(src) {
                        Some(&s) if playing => {
                            frame += 1;
                            s
                        }
                        _ => 0.0,
                    };
                    for sample in out.iter_mut() {
                        *sample = T::from_sample(value);
                    }
                }
                // A rewind issued during this callback wins over our progress.
                if playing
                    && playhead
                        .frame
                        .compare_exchange(start, frame, Ordering::AcqRel, Ordering::Relaxed)
                        .is_ok()
                    && frame as f64 * step >= tick.samples.len() as f64
                {
                    playhead.playing.store(false, Ordering::Release);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| SoundError::Stream(e.to_string()))
}
