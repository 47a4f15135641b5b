// Orchestra configuration: the seating plan and everything else that is fixed
// for a run. Read once at startup, validated, then turned into live units.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::{LayoutParams, Placement};
use crate::shared::{ACCENT_SENTINEL, NUM_UNITS, Unit, UnitId};
use crate::timeline::ScheduledMute;

pub const DEFAULT_SLIDER: f32 = 0.5;

/// One unit's footprint and base gray, `color = -1` for the accent color.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub row: u32,
    pub col: u32,
    pub row_span: u32,
    pub col_span: u32,
    pub color: i16,
}

impl UnitSpec {
    pub const fn new(row: u32, col: u32, row_span: u32, col_span: u32, color: i16) -> Self {
        Self { row, col, row_span, col_span, color }
    }

    pub fn placement(&self) -> Placement {
        Placement::new(self.row, self.col, self.row_span, self.col_span)
    }
}

/// The parallel lists `units`, `names` and `muted` (and `volumes` when given)
/// are index-aligned: entry `i` of each describes unit `i`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestraConfig {
    pub grid_rows: u32,
    pub grid_cols: u32,
    pub cell_size: f32,
    pub cell_inset: f32,

    pub names: Vec<String>,
    pub units: Vec<UnitSpec>,
    pub muted: Vec<bool>,
    pub volumes: Vec<f32>, // empty = every slider starts at DEFAULT_SLIDER

    pub solo: u8,
    pub total_ms: f64,
    pub master_volume: f32,
    pub schedule: Vec<ScheduledMute>,
}

const DEFAULT_SEATING: [(&str, UnitSpec, bool); NUM_UNITS] = [
    ("Flute", UnitSpec::new(2, 5, 1, 2, 255), false),
    ("Oboe", UnitSpec::new(2, 7, 1, 2, 255), false),
    ("Clarinet", UnitSpec::new(2, 9, 1, 2, 255), false),
    ("Bassoon", UnitSpec::new(2, 11, 1, 2, 255), false),
    ("French Horns", UnitSpec::new(0, 8, 1, 4, 255), false),
    ("Trumpets", UnitSpec::new(1, 8, 1, 2, 255), false),
    ("Trombones", UnitSpec::new(1, 10, 1, 2, 255), false),
    ("Tuba", UnitSpec::new(1, 12, 1, 1, 255), false),
    ("Timpani", UnitSpec::new(0, 6, 2, 2, 255), false),
    ("Percussion", UnitSpec::new(0, 4, 2, 2, 255), true),
    ("Piano", UnitSpec::new(1, 3, 2, 1, 255), false),
    ("Violin 1", UnitSpec::new(5, 0, 2, 7, 255), false),
    ("Violin 2", UnitSpec::new(3, 1, 2, 6, 255), false),
    ("Viola", UnitSpec::new(3, 7, 2, 4, 255), false),
    ("Cello", UnitSpec::new(5, 9, 2, 7, 255), false),
    ("Bass", UnitSpec::new(3, 11, 2, 4, 255), false),
    ("Harp", UnitSpec::new(2, 4, 1, 1, 255), true),
    ("Conductor", UnitSpec::new(5, 7, 2, 2, ACCENT_SENTINEL), true),
];

const DEFAULT_SOLO: u8 = 10; // Piano
const DEFAULT_SOLO_SLIDER: f32 = 0.7;

impl Default for OrchestraConfig {
    fn default() -> Self {
        let volumes = (0..NUM_UNITS)
            .map(|i| if i == DEFAULT_SOLO as usize { DEFAULT_SOLO_SLIDER } else { DEFAULT_SLIDER })
            .collect();
        Self {
            grid_rows: 7,
            grid_cols: 16,
            cell_size: 70.0,
            cell_inset: 5.0,
            names: DEFAULT_SEATING.iter().map(|(n, _, _)| n.to_string()).collect(),
            units: DEFAULT_SEATING.iter().map(|(_, u, _)| *u).collect(),
            muted: DEFAULT_SEATING.iter().map(|(_, _, m)| *m).collect(),
            volumes,
            solo: DEFAULT_SOLO,
            total_ms: 164_000.0,
            master_volume: 0.5,
            schedule: Vec::new(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("orchestra has no units")]
    Empty,
    #[error("at most {max} units are supported, got {found}")]
    TooManyUnits { max: usize, found: usize },
    #[error("`{field}` has {found} entries but there are {expected} names")]
    LengthMismatch { field: &'static str, expected: usize, found: usize },
    #[error("`volumes` has {found} entries; expected 0 or {expected}")]
    VolumeLengthMismatch { expected: usize, found: usize },
    #[error("invalid grid: {0}")]
    InvalidGrid(&'static str),
    #[error("unit {unit} ({name}) has a zero span")]
    ZeroSpan { unit: usize, name: String },
    #[error("unit {unit} ({name}) does not fit the {rows}x{cols} grid")]
    OutOfBounds { unit: usize, name: String, rows: u32, cols: u32 },
    #[error("units {a} and {b} overlap without one containing the other")]
    Overlap { a: usize, b: usize },
    #[error("unit {unit} has color {color}; expected 0..=255 or -1")]
    ColorOutOfRange { unit: usize, color: i16 },
    #[error("solo unit {solo} is out of range ({count} units)")]
    SoloOutOfRange { solo: u8, count: usize },
    #[error("total duration must be a positive number of milliseconds")]
    InvalidDuration,
    #[error("schedule entry {index} is out of time order")]
    ScheduleUnsorted { index: usize },
    #[error("schedule entry {index} names unknown unit {unit}")]
    ScheduleUnknownUnit { index: usize, unit: u8 },
}

/// Everything the middle layer needs, built from a valid config.
#[derive(Clone, Debug)]
pub struct Orchestra {
    pub units: Vec<Unit>,
    pub params: LayoutParams,
    pub solo: UnitId,
    pub total_ms: f64,
    pub master_volume: f32,
    pub schedule: Vec<ScheduledMute>,
}

impl OrchestraConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.names.len();
        if count == 0 {
            return Err(ConfigError::Empty);
        }
        if count > u8::MAX as usize {
            return Err(ConfigError::TooManyUnits { max: u8::MAX as usize, found: count });
        }
        for (field, found) in [("units", self.units.len()), ("muted", self.muted.len())] {
            if found != count {
                return Err(ConfigError::LengthMismatch { field, expected: count, found });
            }
        }
        if !self.volumes.is_empty() && self.volumes.len() != count {
            return Err(ConfigError::VolumeLengthMismatch { expected: count, found: self.volumes.len() });
        }

        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(ConfigError::InvalidGrid("grid needs at least one row and column"));
        }
        if !(self.cell_size > 0.0) || !self.cell_size.is_finite() {
            return Err(ConfigError::InvalidGrid("cell size must be positive"));
        }
        if !(self.cell_inset >= 0.0) || 2.0 * self.cell_inset >= self.cell_size {
            return Err(ConfigError::InvalidGrid("inset must leave room inside a cell"));
        }

        for (i, spec) in self.units.iter().enumerate() {
            let name = self.names[i].clone();
            if spec.row_span == 0 || spec.col_span == 0 {
                return Err(ConfigError::ZeroSpan { unit: i, name });
            }
            if !spec.placement().fits(self.grid_rows, self.grid_cols) {
                return Err(ConfigError::OutOfBounds { unit: i, name, rows: self.grid_rows, cols: self.grid_cols });
            }
            if !(spec.color == ACCENT_SENTINEL || (0..=255).contains(&spec.color)) {
                return Err(ConfigError::ColorOutOfRange { unit: i, color: spec.color });
            }
        }

        // ensemble groupings may contain sub-units; anything else is a clash
        for a in 0..count {
            for b in a + 1..count {
                let (pa, pb) = (self.units[a].placement(), self.units[b].placement());
                if pa.overlaps(&pb) && !pa.contains(&pb) && !pb.contains(&pa) {
                    return Err(ConfigError::Overlap { a, b });
                }
            }
        }

        if self.solo as usize >= count {
            return Err(ConfigError::SoloOutOfRange { solo: self.solo, count });
        }
        if !(self.total_ms > 0.0) || !self.total_ms.is_finite() {
            return Err(ConfigError::InvalidDuration);
        }

        let mut prev = f64::NEG_INFINITY;
        for (index, event) in self.schedule.iter().enumerate() {
            if !(event.at_ms >= prev) {
                return Err(ConfigError::ScheduleUnsorted { index });
            }
            if event.unit as usize >= count {
                return Err(ConfigError::ScheduleUnknownUnit { index, unit: event.unit });
            }
            prev = event.at_ms;
        }
        Ok(())
    }

    pub fn into_orchestra(self) -> Result<Orchestra, ConfigError> {
        self.validate()?;
        let units = self
            .names
            .iter()
            .zip(&self.units)
            .zip(&self.muted)
            .enumerate()
            .map(|(i, ((name, spec), muted))| Unit {
                id: UnitId(i as u8),
                name: name.clone(),
                placement: spec.placement(),
                base_color: spec.color,
                muted: *muted,
                selected: false,
                slider_volume: self.volumes.get(i).copied().unwrap_or(DEFAULT_SLIDER).clamp(0.0, 1.0),
                output_volume: 0.0,
                amplitude_level: 0.0,
                ended: false,
            })
            .collect();

        Ok(Orchestra {
            units,
            params: LayoutParams {
                rows: self.grid_rows,
                cols: self.grid_cols,
                cell_size: self.cell_size,
                inset: self.cell_inset,
            },
            solo: UnitId(self.solo),
            total_ms: self.total_ms,
            master_volume: self.master_volume.clamp(0.0, 1.0),
            schedule: self.schedule,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_orchestra_is_valid() {
        let o = OrchestraConfig::default().into_orchestra().unwrap();
        assert_eq!(o.units.len(), NUM_UNITS);
        assert_eq!(o.solo, UnitId(10));
        assert_eq!(o.units[10].name, "Piano");
        assert_eq!(o.units[10].slider_volume, 0.7);
        assert_eq!(o.units[0].slider_volume, 0.5);
        assert_eq!(o.master_volume, 0.5);
        assert_eq!(o.total_ms, 164_000.0);
        assert!(o.schedule.is_empty());

        let muted: Vec<&str> = o.units.iter().filter(|u| u.muted).map(|u| u.name.as_str()).collect();
        assert_eq!(muted, ["Percussion", "Harp", "Conductor"]);
        assert!(o.units[17].is_accent());
    }

    #[test]
    fn mismatched_lists_fail_fast() {
        let mut c = OrchestraConfig::default();
        c.muted.pop();
        assert_eq!(
            c.validate(),
            Err(ConfigError::LengthMismatch { field: "muted", expected: 18, found: 17 })
        );

        let mut c = OrchestraConfig::default();
        c.volumes.truncate(3);
        assert!(matches!(c.validate(), Err(ConfigError::VolumeLengthMismatch { .. })));
    }

    #[test]
    fn empty_volume_list_means_defaults() {
        let c = OrchestraConfig { volumes: vec![], ..Default::default() };
        let o = c.into_orchestra().unwrap();
        assert!(o.units.iter().all(|u| u.slider_volume == DEFAULT_SLIDER));
    }

    #[test]
    fn placement_outside_grid_is_rejected() {
        let mut c = OrchestraConfig::default();
        c.units[14] = UnitSpec::new(5, 10, 2, 7, 255); // cols 10..17 on a 16-wide grid
        assert!(matches!(c.validate(), Err(ConfigError::OutOfBounds { unit: 14, .. })));
    }

    #[test]
    fn zero_span_is_rejected() {
        let mut c = OrchestraConfig::default();
        c.units[0].col_span = 0;
        assert!(matches!(c.validate(), Err(ConfigError::ZeroSpan { unit: 0, .. })));
    }

    #[test]
    fn partial_overlap_is_rejected_but_nesting_is_fine() {
        let base = |units: Vec<UnitSpec>| OrchestraConfig {
            names: (0..units.len()).map(|i| format!("U{i}")).collect(),
            muted: vec![false; units.len()],
            volumes: vec![],
            solo: 0,
            units,
            ..Default::default()
        };

        let nested = base(vec![UnitSpec::new(0, 0, 2, 4, 255), UnitSpec::new(0, 1, 1, 2, 200)]);
        assert_eq!(nested.validate(), Ok(()));

        let clash = base(vec![UnitSpec::new(0, 0, 2, 2, 255), UnitSpec::new(1, 1, 2, 2, 200)]);
        assert_eq!(clash.validate(), Err(ConfigError::Overlap { a: 0, b: 1 }));
    }

    #[test]
    fn bad_solo_color_and_duration_are_rejected() {
        let c = OrchestraConfig { solo: 40, ..Default::default() };
        assert!(matches!(c.validate(), Err(ConfigError::SoloOutOfRange { .. })));

        let mut c = OrchestraConfig::default();
        c.units[0].color = 300;
        assert!(matches!(c.validate(), Err(ConfigError::ColorOutOfRange { unit: 0, color: 300 })));

        let c = OrchestraConfig { total_ms: 0.0, ..Default::default() };
        assert_eq!(c.validate(), Err(ConfigError::InvalidDuration));
    }

    #[test]
    fn schedule_must_be_sorted_and_name_known_units() {
        let c = OrchestraConfig {
            schedule: vec![
                ScheduledMute { at_ms: 5_000.0, unit: 1 },
                ScheduledMute { at_ms: 4_000.0, unit: 2 },
            ],
            ..Default::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::ScheduleUnsorted { index: 1 }));

        let c = OrchestraConfig {
            schedule: vec![ScheduledMute { at_ms: 5_000.0, unit: 99 }],
            ..Default::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::ScheduleUnknownUnit { index: 0, unit: 99 }));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let c: OrchestraConfig = serde_json::from_str(r#"{"master_volume":0.8,"total_ms":1000}"#).unwrap();
        assert_eq!(c.master_volume, 0.8);
        assert_eq!(c.names.len(), NUM_UNITS);
        assert_eq!(c.validate(), Ok(()));
    }
}
