use std::sync::Arc;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::audio_api::{AudioCommand, AudioControl, AudioError};
use crate::shared::UnitId;

mod engine;
mod frame;
mod meters;
mod track_buffer;
mod voice;

pub use track_buffer::TrackBuffer;

use meters::TrackMeters;

use engine::Engine;

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    ended_rx: Receiver<UnitId>,
    meters: Arc<TrackMeters>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    /// Tracks that reached their last frame since the previous poll.
    pub fn poll_ended(&self) -> Vec<UnitId> {
        self.ended_rx.try_iter().collect()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl AudioControl for AudioHandle {
    fn send(&self, cmd: AudioCommand) -> Result<(), AudioError> {
        let registering = match &cmd {
            AudioCommand::Register { track, .. } => {
                check_slot(&self.meters, *track)?;
                Some(*track)
            }
            AudioCommand::Play(t) | AudioCommand::Pause(t) | AudioCommand::Rewind(t) => {
                check_slot(&self.meters, *t)?;
                if !self.meters.is_registered(t.index()) {
                    return Err(AudioError::NotReady(*t));
                }
                None
            }
        };
        self.tx.try_send(cmd).map_err(|e| match e {
            TrySendError::Full(_) => AudioError::QueueFull,
            TrySendError::Disconnected(_) => AudioError::Disconnected,
        })?;
        // Queued commands are applied in order, so anything sent after the
        // registration already sees the track.
        if let Some(track) = registering {
            self.meters.mark_registered(track.index());
        }
        Ok(())
    }

    fn set_volume(&self, track: UnitId, level: f32) -> Result<(), AudioError> {
        check_slot(&self.meters, track)?;
        if !self.meters.is_registered(track.index()) {
            return Err(AudioError::NotReady(track));
        }
        self.meters.set_volume(track.index(), level);
        Ok(())
    }

    fn amplitude_level(&self, track: UnitId) -> f32 {
        self.meters.level(track.index())
    }
}

fn check_slot(meters: &TrackMeters, track: UnitId) -> Result<(), AudioError> {
    if track.index() < meters.len() {
        Ok(())
    } else {
        Err(AudioError::UnknownTrack(track))
    }
}

pub fn start_audio(track_count: usize) -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);
    let (ended_tx, ended_rx) = crossbeam_channel::bounded::<UnitId>(track_count.max(1) * 2);
    let meters = Arc::new(TrackMeters::new(track_count));

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;
    log::info!("audio: {} Hz, {} channels, {:?}", sample_rate, channels, config.sample_format());

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let engine = Engine::new(meters.clone(), ended_tx);
            let output_stream = build_output_stream_f32(&device, &config.into(), rx, engine, channels)?;
            output_stream.play().context("failed to play output stream")?;

            Ok(AudioHandle {
                tx,
                ended_rx,
                meters,
                sample_rate,
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    mut engine: Engine,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let err_fn = |err| log::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }
            engine.render_interleaved(data, channels);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
