pub use crate::audio::TrackBuffer;

use thiserror::Error;

use crate::shared::UnitId;

#[derive(Clone, Debug, PartialEq)]
pub enum AudioCommand {
    // The engine can't load files (that would stall the audio thread), so a
    // track is decoded on the loader thread first and then handed over here.
    Register { track: UnitId, buffer: TrackBuffer },

    // Transport, per track. Config-muted units simply never get `Play`.
    Play(UnitId),
    Pause(UnitId),
    Rewind(UnitId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("track {0} is not loaded yet")]
    NotReady(UnitId),
    #[error("no track slot {0}")]
    UnknownTrack(UnitId),
    #[error("audio command queue is full")]
    QueueFull,
    #[error("audio engine has shut down")]
    Disconnected,
}

impl AudioError {
    /// Errors the frame loop just shrugs off and retries next frame.
    pub fn is_transient(&self) -> bool {
        matches!(self, AudioError::NotReady(_) | AudioError::QueueFull)
    }
}

/// What the control side needs from an audio engine. Implemented by the
/// cpal-backed `AudioHandle` and by the recording fake in tests.
pub trait AudioControl {
    fn send(&self, cmd: AudioCommand) -> Result<(), AudioError>;

    /// Volume target for one track, 0..1.
    fn set_volume(&self, track: UnitId, level: f32) -> Result<(), AudioError>;

    /// Most recent RMS level of the track's output, after gain.
    fn amplitude_level(&self, track: UnitId) -> f32;
}
