// Audio mix resolver: the one place that decides how loud each track is and
// the only caller of `AudioControl::set_volume`.

use crate::audio_api::AudioControl;
use crate::shared::{Unit, UnitId};

/// The solo instrument always plays at this level.
pub const SOLO_VOLUME: f32 = 0.7;

/// Near-silent level for hand-muted and timeline-muted units.
pub const LOW_VOICE: f32 = 0.01;

pub fn resolve_volume(slider: f32, master: f32, active: bool, global_mute: bool, is_solo: bool) -> f32 {
    if is_solo {
        return SOLO_VOLUME;
    }
    if global_mute || !active {
        return LOW_VOICE;
    }
    (slider * master).clamp(0.0, 1.0)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MixReport {
    pub applied: usize,
    pub not_ready: usize, // transient failures, retried next frame
    pub failed: usize,
}

/// Resolve every unit's volume and push it to the engine.
/// Config-muted units are held at zero.
pub fn apply_mix<A: AudioControl>(
    units: &mut [Unit],
    master: f32,
    active_flags: &[bool],
    global_mute: bool,
    solo: UnitId,
    audio: &A,
) -> MixReport {
    let mut report = MixReport::default();
    for unit in units.iter_mut() {
        let active = active_flags.get(unit.id.index()).copied().unwrap_or(true);
        let volume = if unit.muted && unit.id != solo {
            0.0
        } else {
            resolve_volume(unit.slider_volume, master, active, global_mute, unit.id == solo)
        };
        unit.output_volume = volume;

        match audio.set_volume(unit.id, volume) {
            Ok(()) => report.applied += 1,
            Err(e) if e.is_transient() => report.not_ready += 1,
            Err(_) => report.failed += 1,
        }
    }
    report
}
