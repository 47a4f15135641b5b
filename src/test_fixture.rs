// Purely for testing: the built-in orchestra laid out on the reference
// viewport, and an audio engine that just records what it was told.

use std::cell::RefCell;

use crate::audio_api::{AudioCommand, AudioControl, AudioError};
use crate::layout::{Layout, Placement, Viewport};
use crate::score::{Orchestra, OrchestraConfig};
use crate::shared::UnitId;

pub const REFERENCE_VIEWPORT: Viewport = Viewport { width: 1565.0, height: 1000.0 };

pub fn default_orchestra() -> Orchestra {
    OrchestraConfig::default()
        .into_orchestra()
        .expect("built-in orchestra is valid")
}

pub fn default_layout() -> Layout {
    let o = default_orchestra();
    let placements: Vec<Placement> = o.units.iter().map(|u| u.placement).collect();
    Layout::derive(&placements, o.params, REFERENCE_VIEWPORT)
}

/// Center of a unit's box in normalized screen coordinates.
pub fn unit_center_normalized(layout: &Layout, unit: UnitId) -> (f32, f32) {
    let (cx, cy) = layout.box_of(unit).expect("unit in layout").center();
    let vp = layout.viewport();
    (cx / vp.width, cy / vp.height)
}

pub struct FakeAudio {
    registered: RefCell<Vec<bool>>,
    volumes: RefCell<Vec<Option<f32>>>,
    levels: RefCell<Vec<f32>>,
    commands: RefCell<Vec<AudioCommand>>,
}

impl FakeAudio {
    /// No track registered yet.
    pub fn new(tracks: usize) -> Self {
        Self {
            registered: RefCell::new(vec![false; tracks]),
            volumes: RefCell::new(vec![None; tracks]),
            levels: RefCell::new(vec![0.0; tracks]),
            commands: RefCell::new(Vec::new()),
        }
    }

    pub fn all_loaded(tracks: usize) -> Self {
        let fake = Self::new(tracks);
        fake.registered.borrow_mut().iter_mut().for_each(|r| *r = true);
        fake
    }

    pub fn volume(&self, track: UnitId) -> Option<f32> {
        self.volumes.borrow().get(track.index()).copied().flatten()
    }

    pub fn set_level(&self, track: UnitId, level: f32) {
        if let Some(l) = self.levels.borrow_mut().get_mut(track.index()) {
            *l = level;
        }
    }

    /// Transport commands sent so far, registrations left out.
    pub fn take_transport(&self) -> Vec<AudioCommand> {
        self.commands
            .borrow_mut()
            .drain(..)
            .filter(|c| !matches!(c, AudioCommand::Register { .. }))
            .collect()
    }

    fn check(&self, track: UnitId) -> Result<(), AudioError> {
        match self.registered.borrow().get(track.index()) {
            None => Err(AudioError::UnknownTrack(track)),
            Some(false) => Err(AudioError::NotReady(track)),
            Some(true) => Ok(()),
        }
    }
}

impl AudioControl for FakeAudio {
    fn send(&self, cmd: AudioCommand) -> Result<(), AudioError> {
        match &cmd {
            AudioCommand::Register { track, .. } => {
                let mut reg = self.registered.borrow_mut();
                let slot = reg.get_mut(track.index()).ok_or(AudioError::UnknownTrack(*track))?;
                *slot = true;
            }
            AudioCommand::Play(t) | AudioCommand::Pause(t) | AudioCommand::Rewind(t) => self.check(*t)?,
        }
        self.commands.borrow_mut().push(cmd);
        Ok(())
    }

    fn set_volume(&self, track: UnitId, level: f32) -> Result<(), AudioError> {
        self.check(track)?;
        self.volumes.borrow_mut()[track.index()] = Some(level);
        Ok(())
    }

    fn amplitude_level(&self, track: UnitId) -> f32 {
        self.levels.borrow().get(track.index()).copied().unwrap_or(0.0)
    }
}
