use crate::layout::Viewport;
use crate::pose::{GestureLabel, HandObservation, HandRole};

// One terminal cell stands for this many layout pixels.
pub const PX_PER_COL: f32 = 8.0;
pub const PX_PER_ROW: f32 = 16.0;

// Rows at the bottom kept for the status bar.
pub const STATUS_ROWS: u16 = 2;

/// A hand driven by mouse and keys, in on-screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimHand {
    pub x: f32,
    pub y: f32,
    pub gesture: GestureLabel,
}

// state local to the tui: which simulated hand the mouse drives and how big
// the grid area is
#[derive(Clone, Debug)]
pub struct TuiState {
    pub active: HandRole,
    pub left: SimHand,
    pub right: SimHand,
    pub cols: u16,
    pub rows: u16,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            active: HandRole::Left,
            left: SimHand::default(),
            right: SimHand::default(),
            cols: 80,
            rows: 24,
        }
    }
}

impl TuiState {
    pub fn with_size(cols: u16, rows: u16) -> Self {
        Self { cols, rows, ..Self::default() }
    }

    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    /// Pixel viewport of the grid area (everything above the status bar).
    pub fn viewport(&self) -> Viewport {
        grid_viewport(self.cols, self.rows)
    }

    pub fn hand(&self, role: HandRole) -> &SimHand {
        match role {
            HandRole::Left => &self.left,
            HandRole::Right => &self.right,
        }
    }

    pub fn hand_mut(&mut self, role: HandRole) -> &mut SimHand {
        match role {
            HandRole::Left => &mut self.left,
            HandRole::Right => &mut self.right,
        }
    }

    /// What a mirrored camera would have reported for this hand.
    pub fn observation(&self, role: HandRole) -> HandObservation {
        let vp = self.viewport();
        let hand = self.hand(role);
        let x = if vp.width > 0.0 { hand.x / vp.width } else { 0.0 };
        let y = if vp.height > 0.0 { hand.y / vp.height } else { 0.0 };
        HandObservation {
            x: 1.0 - x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
            gesture: Some(hand.gesture.as_label().to_string()),
            handedness: role.camera_tag(),
        }
    }
}

pub fn grid_viewport(cols: u16, rows: u16) -> Viewport {
    Viewport::new(
        cols as f32 * PX_PER_COL,
        rows.saturating_sub(STATUS_ROWS) as f32 * PX_PER_ROW,
    )
}

/// Center of a terminal cell, in layout pixels.
pub fn cell_to_px(col: u16, row: u16) -> (f32, f32) {
    ((col as f32 + 0.5) * PX_PER_COL, (row as f32 + 0.5) * PX_PER_ROW)
}
