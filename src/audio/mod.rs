use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::PlaybackEvent;
use crate::session::SharedSession;

pub mod engine;
pub mod grain;
pub mod resample;

pub use engine::{PlayState, Player};
pub use grain::{Grain, GrainTable};

// largest callback we expect; bigger ones grow the scratch buffer once
const MAX_BLOCK: usize = 8192;

pub struct AudioHandle {
    events_rx: Receiver<PlaybackEvent>,
    sample_rate: u32,
    output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn pause(&self, paused: bool) {
        let result = if paused {
            self.output_stream.pause().map_err(anyhow::Error::from)
        } else {
            self.output_stream.play().map_err(anyhow::Error::from)
        };
        if let Err(e) = result {
            log::warn!("could not {} output stream: {e}", if paused { "pause" } else { "resume" });
        }
    }

    pub fn poll_event(&self) -> Option<PlaybackEvent> {
        self.events_rx.try_recv().ok()
    }
}

/// Device sample rate, so material can be resampled before the stream exists.
pub fn default_sample_rate() -> Option<u32> {
    let device = cpal::default_host().default_output_device()?;
    let config = device.default_output_config().ok()?;
    Some(config.sample_rate().0)
}

/// Opens the default output device and plays `session` through it.
///
/// The stream starts paused; resume it with [`AudioHandle::pause`].
pub fn start_audio(session: SharedSession) -> anyhow::Result<AudioHandle> {
    let (events_tx, events_rx) = crossbeam_channel::bounded::<PlaybackEvent>(64);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream = build_output_stream_f32(&device, &config.into(), session, events_tx, channels)?;
            output_stream.pause().context("failed to pause output stream")?;
            log::info!("audio output: {channels} ch @ {sample_rate} Hz");

            Ok(AudioHandle {
                events_rx,
                sample_rate,
                output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    session: SharedSession,
    events_tx: Sender<PlaybackEvent>,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut mono = vec![0.0f32; MAX_BLOCK];
    let channels = channels.max(1);

    let err_fn = |err| log::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            let n_frames = data.len() / channels;
            if mono.len() < n_frames {
                mono.resize(n_frames, 0.0);
            }
            let block = &mut mono[..n_frames];

            if let Some(event) = session.lock().render(block) {
                let _ = events_tx.try_send(event);
            }

            // same signal on every channel
            for (frame, &s) in data.chunks_exact_mut(channels).zip(block.iter()) {
                frame.fill(s);
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
