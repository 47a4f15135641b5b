// Amplitude feedback: turns each track's output level into the brightness of
// its lit squares. Loud = dark.

use crate::audio_api::AudioControl;
use crate::shared::Unit;

pub const AMPLITUDE_GAIN: f32 = 4.0;

/// 255 for silence, 0 once `level` reaches 1/AMPLITUDE_GAIN.
pub fn brightness(level: f32) -> u8 {
    let level = if level.is_finite() { level } else { 0.0 };
    let scaled = (level * AMPLITUDE_GAIN).clamp(0.0, 1.0);
    (255.0 - 255.0 * scaled) as u8
}

/// Pull this frame's level for every unit. Overwritten, never accumulated.
pub fn refresh_levels<A: AudioControl>(units: &mut [Unit], audio: &A) {
    for unit in units.iter_mut() {
        let level = audio.amplitude_level(unit.id);
        unit.amplitude_level = if level.is_finite() { level.max(0.0) } else { 0.0 };
    }
}
