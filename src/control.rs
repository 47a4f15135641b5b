//! Selection & volume control from the two hands.
//!
//! `evaluate` is a pure read of one pose snapshot against the layout;
//! `apply` writes the outcome into the persisted unit/master state. Feeding
//! the same snapshot twice yields the same state.
//!
//! Rules, per frame:
//! * the pointing hand (right wins if both point) selects the unit under
//!   its cursor, if any;
//! * pointing + open palm on the other hand sets the pointed unit's slider
//!   from the palm's height;
//! * a closed fist on either hand raises the global mute for this frame;
//! * an open palm sets the master volume from its height unless the other
//!   hand is pointing.

use crate::layout::Layout;
use crate::pose::{GestureLabel, HandRole, PoseSnapshot};
use crate::shared::{Unit, UnitId};

/// Evaluation order. Later hands overwrite earlier ones on conflicts.
const EVAL_ORDER: [HandRole; 2] = [HandRole::Left, HandRole::Right];

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Outcome {
    pub selected: Option<UnitId>,
    pub global_mute: bool,
    pub slider: Option<(UnitId, f32)>,
    pub master: Option<f32>,
}

pub fn evaluate(pose: &PoseSnapshot, layout: &Layout) -> Outcome {
    let mut out = Outcome::default();

    // Only the last pointing hand counts; if it points at a gap nothing is
    // selected even when the other hand points at a unit.
    let pointer = EVAL_ORDER
        .iter()
        .copied()
        .filter(|role| pose.hand(*role).is(GestureLabel::PointingUp))
        .last();

    if let Some(role) = pointer {
        let hand = pose.hand(role);
        let (px, py) = hand.to_pixels(layout.viewport());
        out.selected = layout.locate(px, py);

        let other = pose.hand(role.other());
        if let Some(target) = out.selected {
            if other.is(GestureLabel::OpenPalm) {
                out.slider = Some((target, other.height_volume()));
            }
        }
    }

    out.global_mute = EVAL_ORDER
        .iter()
        .any(|role| pose.hand(*role).is(GestureLabel::ClosedFist));

    for role in EVAL_ORDER {
        let hand = pose.hand(role);
        let other = pose.hand(role.other());
        if hand.is(GestureLabel::OpenPalm) && !other.is(GestureLabel::PointingUp) {
            out.master = Some(hand.height_volume());
        }
    }

    out
}

/// Write an outcome into unit and master state. Selection is cleared first
/// so at most one unit is ever selected.
pub fn apply(outcome: &Outcome, units: &mut [Unit], master_volume: &mut f32) {
    for unit in units.iter_mut() {
        unit.selected = false;
    }
    if let Some(id) = outcome.selected {
        if let Some(unit) = units.get_mut(id.index()) {
            unit.selected = true;
        }
    }
    if let Some((id, volume)) = outcome.slider {
        if let Some(unit) = units.get_mut(id.index()) {
            unit.slider_volume = volume;
        }
    }
    if let Some(volume) = outcome.master {
        *master_volume = volume;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::HandSample;
    use crate::test_fixture;

    fn at_unit(layout: &Layout, unit: u8, gesture: GestureLabel) -> HandSample {
        let (x, y) = test_fixture::unit_center_normalized(layout, UnitId(unit));
        HandSample::new(x, y, gesture)
    }

    #[test]
    fn pointing_selects_unit_under_cursor() {
        let layout = test_fixture::default_layout();
        let pose = PoseSnapshot {
            left: at_unit(&layout, 3, GestureLabel::PointingUp),
            right: HandSample::default(),
        };
        let out = evaluate(&pose, &layout);
        assert_eq!(out.selected, Some(UnitId(3)));
        assert_eq!(out.slider, None);
        assert!(!out.global_mute);
    }

    #[test]
    fn pointing_plus_open_palm_sets_slider_from_palm_height() {
        let layout = test_fixture::default_layout();
        let pose = PoseSnapshot {
            left: at_unit(&layout, 3, GestureLabel::PointingUp),
            right: HandSample::new(0.9, 0.25, GestureLabel::OpenPalm),
        };
        let out = evaluate(&pose, &layout);
        assert_eq!(out.selected, Some(UnitId(3)));
        assert_eq!(out.slider, Some((UnitId(3), 0.75)));
        // pointing wins over the master gesture on the paired hand
        assert_eq!(out.master, None);

        let mut units = test_fixture::default_orchestra().units;
        let mut master = 0.5;
        apply(&out, &mut units, &mut master);
        assert!(units[3].selected);
        assert_eq!(units[3].slider_volume, 0.75);
        assert_eq!(master, 0.5);
        assert_eq!(units.iter().filter(|u| u.selected).count(), 1);
    }

    #[test]
    fn slider_override_works_with_either_hand_pointing() {
        let layout = test_fixture::default_layout();
        let pose = PoseSnapshot {
            left: HandSample::new(0.1, 0.6, GestureLabel::OpenPalm),
            right: at_unit(&layout, 13, GestureLabel::PointingUp),
        };
        let (unit, volume) = evaluate(&pose, &layout).slider.unwrap();
        assert_eq!(unit, UnitId(13));
        assert!((volume - 0.4).abs() < 1e-6);
    }

    #[test]
    fn later_pointing_hand_wins_tie() {
        let layout = test_fixture::default_layout();
        let pose = PoseSnapshot {
            left: at_unit(&layout, 0, GestureLabel::PointingUp),
            right: at_unit(&layout, 14, GestureLabel::PointingUp),
        };
        assert_eq!(evaluate(&pose, &layout).selected, Some(UnitId(14)));

        // the right hand pointing at a gap still takes precedence
        let pose = PoseSnapshot {
            left: at_unit(&layout, 0, GestureLabel::PointingUp),
            right: HandSample::new(0.0, 0.0, GestureLabel::PointingUp),
        };
        assert_eq!(evaluate(&pose, &layout).selected, None);
    }

    #[test]
    fn pointing_at_nothing_never_touches_sliders() {
        let layout = test_fixture::default_layout();
        let pose = PoseSnapshot {
            left: HandSample::new(0.01, 0.01, GestureLabel::PointingUp),
            right: HandSample::new(0.5, 0.1, GestureLabel::OpenPalm),
        };
        let out = evaluate(&pose, &layout);
        assert_eq!(out.selected, None);
        assert_eq!(out.slider, None);
        assert_eq!(out.master, None);
    }

    #[test]
    fn fist_on_either_hand_mutes() {
        let layout = test_fixture::default_layout();
        for pose in [
            PoseSnapshot {
                left: HandSample::new(0.5, 0.5, GestureLabel::ClosedFist),
                right: HandSample::default(),
            },
            PoseSnapshot {
                left: HandSample::default(),
                right: HandSample::new(0.5, 0.5, GestureLabel::ClosedFist),
            },
        ] {
            assert!(evaluate(&pose, &layout).global_mute);
        }
    }

    #[test]
    fn open_palm_alone_sets_master_and_right_hand_wins() {
        let layout = test_fixture::default_layout();
        let pose = PoseSnapshot {
            left: HandSample::new(0.2, 0.8, GestureLabel::OpenPalm),
            right: HandSample::default(),
        };
        let out = evaluate(&pose, &layout);
        assert!((out.master.unwrap() - 0.2).abs() < 1e-6);

        let pose = PoseSnapshot {
            left: HandSample::new(0.2, 0.8, GestureLabel::OpenPalm),
            right: HandSample::new(0.7, 0.1, GestureLabel::OpenPalm),
        };
        assert!((evaluate(&pose, &layout).master.unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn neutral_pose_changes_nothing() {
        let layout = test_fixture::default_layout();
        let out = evaluate(&PoseSnapshot::default(), &layout);
        assert_eq!(out, Outcome::default());
    }

    #[test]
    fn same_snapshot_same_state() {
        let layout = test_fixture::default_layout();
        let pose = PoseSnapshot {
            left: at_unit(&layout, 6, GestureLabel::PointingUp),
            right: HandSample::new(0.9, 0.3, GestureLabel::OpenPalm),
        };
        let mut units = test_fixture::default_orchestra().units;
        let mut master = 0.5;
        apply(&evaluate(&pose, &layout), &mut units, &mut master);
        let first: Vec<(bool, f32)> = units.iter().map(|u| (u.selected, u.slider_volume)).collect();
        apply(&evaluate(&pose, &layout), &mut units, &mut master);
        let second: Vec<(bool, f32)> = units.iter().map(|u| (u.selected, u.slider_volume)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn selection_clears_when_hand_stops_pointing() {
        let layout = test_fixture::default_layout();
        let mut units = test_fixture::default_orchestra().units;
        let mut master = 0.5;
        let pointing = PoseSnapshot {
            left: at_unit(&layout, 2, GestureLabel::PointingUp),
            right: HandSample::default(),
        };
        apply(&evaluate(&pointing, &layout), &mut units, &mut master);
        assert!(units[2].selected);
        apply(&evaluate(&PoseSnapshot::default(), &layout), &mut units, &mut master);
        assert!(units.iter().all(|u| !u.selected));
    }
}
