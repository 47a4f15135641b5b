//! Hand pose state as the control loop sees it.
//!
//! The pose source (the JSON feed, or the TUI's hand simulator) runs on its
//! own cadence and writes raw camera-space observations into a
//! [`SharedPose`]. The frame loop copies a [`PoseSnapshot`] out once at the
//! start of every frame. A hand that has never been observed reads as a
//! zeroed cursor with gesture `None`.

pub mod feed;

use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;

use crate::layout::Viewport;

/// Gesture vocabulary the controller reacts to. Anything else the
/// recognizer reports collapses to `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    PointingUp,
    OpenPalm,
    ClosedFist,
    #[default]
    None,
}

impl GestureLabel {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Pointing_Up" => GestureLabel::PointingUp,
            "Open_Palm" => GestureLabel::OpenPalm,
            "Closed_Fist" => GestureLabel::ClosedFist,
            _ => GestureLabel::None,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            GestureLabel::PointingUp => "Pointing_Up",
            GestureLabel::OpenPalm => "Open_Palm",
            GestureLabel::ClosedFist => "Closed_Fist",
            GestureLabel::None => "None",
        }
    }
}

/// Handedness tag as reported by the camera-side recognizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// Which on-screen hand a sample belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandRole {
    Left,
    Right,
}

impl HandRole {
    pub fn other(self) -> Self {
        match self {
            HandRole::Left => HandRole::Right,
            HandRole::Right => HandRole::Left,
        }
    }

    /// The tag a mirrored camera reports for this on-screen hand.
    pub fn camera_tag(self) -> Handedness {
        match self {
            HandRole::Left => Handedness::Right,
            HandRole::Right => Handedness::Left,
        }
    }
}

/// One raw observation, in camera space, as a pose source reports it.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HandObservation {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub gesture: Option<String>, // absent = cursor-only update
    pub handedness: Handedness,
}

/// One hand in on-screen normalized coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandSample {
    pub x: f32,
    pub y: f32,
    pub gesture: GestureLabel,
}

impl HandSample {
    pub fn new(x: f32, y: f32, gesture: GestureLabel) -> Self {
        Self { x, y, gesture }
    }

    pub fn to_pixels(&self, viewport: Viewport) -> (f32, f32) {
        (self.x * viewport.width, self.y * viewport.height)
    }

    /// Volume encoded by the hand's height: top of the screen is loudest.
    pub fn height_volume(&self) -> f32 {
        (1.0 - self.y).clamp(0.0, 1.0)
    }

    pub fn is(&self, gesture: GestureLabel) -> bool {
        self.gesture == gesture
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PoseSnapshot {
    pub left: HandSample,
    pub right: HandSample,
}

impl PoseSnapshot {
    pub fn hand(&self, role: HandRole) -> &HandSample {
        match role {
            HandRole::Left => &self.left,
            HandRole::Right => &self.right,
        }
    }

    fn hand_mut(&mut self, role: HandRole) -> &mut HandSample {
        match role {
            HandRole::Left => &mut self.left,
            HandRole::Right => &mut self.right,
        }
    }
}

/// Undo the mirrored camera view: the recognizer's "Right" hand is the
/// user's on-screen left, and x runs the other way.
pub fn ingest(obs: &HandObservation) -> (HandRole, f32, f32, Option<GestureLabel>) {
    let role = match obs.handedness {
        Handedness::Right => HandRole::Left,
        Handedness::Left => HandRole::Right,
    };
    let gesture = obs.gesture.as_deref().map(GestureLabel::from_label);
    (role, 1.0 - obs.x, obs.y, gesture)
}

/// Pose state shared between a pose source and the frame loop.
#[derive(Clone, Debug, Default)]
pub struct SharedPose(Arc<RwLock<PoseSnapshot>>);

impl SharedPose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, obs: &HandObservation) {
        let (role, x, y, gesture) = ingest(obs);
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        let hand = guard.hand_mut(role);
        hand.x = x;
        hand.y = y;
        if let Some(g) = gesture {
            hand.gesture = g;
        }
    }

    /// Copy-out taken once per frame.
    pub fn snapshot(&self) -> PoseSnapshot {
        *self.0.read().unwrap_or_else(PoisonError::into_inner)
    }
}
