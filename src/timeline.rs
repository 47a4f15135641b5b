//! Playback clock, transport state and scheduled (one-way) unit mutes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::UnitId;

/// At `at_ms` of elapsed play time, `unit` drops to the low voice for the
/// rest of the playthrough.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledMute {
    pub at_ms: f64,
    pub unit: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Stopped, // never started
    Playing,
    Paused,
}

/// What the audio side has to do after a successful toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportAction {
    StartFromTop,
    Resume,
    Pause,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("playback has finished; restart to play again")]
    Finished,
    #[error("tracks are still loading ({settled}/{total})")]
    NotReady { settled: usize, total: usize },
}

#[derive(Clone, Debug)]
pub struct Timeline {
    elapsed_ms: f64,
    total_ms: f64,
    transport: TransportState,
    schedule: Vec<ScheduledMute>,
    cursor: usize,
    active: Vec<bool>,
}

impl Timeline {
    /// `schedule` must already be sorted by time; config validation
    /// guarantees that.
    pub fn new(unit_count: usize, schedule: Vec<ScheduledMute>, total_ms: f64) -> Self {
        Self {
            elapsed_ms: 0.0,
            total_ms,
            transport: TransportState::Stopped,
            schedule,
            cursor: 0,
            active: vec![true; unit_count],
        }
    }

    /// Advance the clock by one frame and apply every scheduled mute the
    /// clock has now passed. Returns the units muted this frame.
    pub fn advance(&mut self, delta_ms: f64) -> Vec<UnitId> {
        if self.transport == TransportState::Playing && delta_ms.is_finite() {
            self.elapsed_ms += delta_ms.max(0.0);
        }

        let mut muted = Vec::new();
        while let Some(event) = self.schedule.get(self.cursor) {
            if self.elapsed_ms <= event.at_ms {
                break;
            }
            if let Some(flag) = self.active.get_mut(event.unit as usize) {
                *flag = false;
                muted.push(UnitId(event.unit));
            }
            self.cursor += 1;
        }
        muted
    }

    pub fn toggle(&mut self) -> Result<TransportAction, TransportError> {
        if self.is_finished() {
            return Err(TransportError::Finished);
        }
        let (next, action) = match self.transport {
            TransportState::Stopped => (TransportState::Playing, TransportAction::StartFromTop),
            TransportState::Paused => (TransportState::Playing, TransportAction::Resume),
            TransportState::Playing => (TransportState::Paused, TransportAction::Pause),
        };
        self.transport = next;
        Ok(action)
    }

    /// Back to zero: every unit active again, every scheduled mute re-armed.
    /// Playing/paused state is left alone.
    pub fn restart(&mut self) {
        self.elapsed_ms = 0.0;
        self.cursor = 0;
        self.active.iter_mut().for_each(|f| *f = true);
    }

    pub fn is_active(&self, unit: UnitId) -> bool {
        self.active.get(unit.index()).copied().unwrap_or(true)
    }

    pub fn active_flags(&self) -> &[bool] {
        &self.active
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_ms > self.total_ms
    }

    pub fn is_playing(&self) -> bool {
        self.transport == TransportState::Playing
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    /// Scheduled mutes already applied.
    pub fn consumed(&self) -> usize {
        self.cursor
    }

    pub fn scheduled(&self) -> usize {
        self.schedule.len()
    }
}
