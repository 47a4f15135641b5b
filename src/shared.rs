// Types shared between the middle layer, the audio side and the TUI.
//
// The middle layer owns every bit of control state (units, timeline, volumes,
// selection) and the TUI only draws whatever `DisplayState` it is handed each
// frame.
//
// Default key plan (see tui/input.rs):
//   mouse         //  moves the active simulated hand
//   Tab           //  switch active hand (left / right)
//   1 2 3 4       //  left hand:  Pointing_Up / Open_Palm / Closed_Fist / None
//   7 8 9 0       //  right hand: Pointing_Up / Open_Palm / Closed_Fist / None
//   Space         //  TogglePlay
//   Enter         //  Restart
//   [ / ]         //  NudgeMaster(-0.05 / 0.05)
//   - / =         //  NudgeSlider(-0.05 / 0.05) on the focused unit
//   s             //  ToggleSliders
//   Esc           //  Quit

use std::fmt;

use crate::layout::{BBox, Placement, Viewport};
use crate::pose::{GestureLabel, HandRole};
use crate::timeline::TransportState;

/// Units in the built-in orchestra.
pub const NUM_UNITS: usize = 18;

/// `base_color` value for units drawn with the fixed accent color.
pub const ACCENT_SENTINEL: i16 = -1;

// ye olde types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u8);

impl UnitId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One instrument: its place on the grid plus the control state that
/// survives between frames.
#[derive(Clone, Debug)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub placement: Placement,
    pub base_color: i16,
    pub muted: bool, // config-time; never plays

    pub selected: bool,       // overwritten every frame
    pub slider_volume: f32,   // persists until a control or gesture changes it
    pub output_volume: f32,   // last value the mix resolver pushed
    pub amplitude_level: f32, // overwritten every frame
    pub ended: bool,          // track reported end-of-file
}

impl Unit {
    pub fn is_accent(&self) -> bool {
        self.base_color == ACCENT_SENTINEL
    }

    /// Dark units get light text and vice versa.
    pub fn text_light(&self) -> bool {
        self.base_color < 128
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // transport
    TogglePlay,
    Restart,

    // sliders
    NudgeMaster(f32),
    NudgeSlider(f32),   // applies to the focused unit
    FocusAt(f32, f32),  // pixel position, e.g. a mouse click
    ToggleSliders,

    // the terminal changed size; carries the new viewport in pixels
    Resize(Viewport),

    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitFill {
    Accent,
    TimelineMuted,
    Selected,
    Base(u8),
}

#[derive(Clone, Debug)]
pub struct UnitView {
    pub id: UnitId,
    pub name: String,
    pub bbox: BBox,
    pub lit_squares: Vec<BBox>,
    pub fill: UnitFill,
    pub brightness: u8, // lit squares, 255 = silent
    pub text_light: bool,
    pub slider_volume: f32,
    pub output_volume: f32,
    pub muted: bool,
    pub focused: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandView {
    pub role: HandRole,
    pub x: f32, // pixels
    pub y: f32,
    pub gesture: GestureLabel,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub viewport: Viewport,
    pub grid_region: BBox,
    pub units: Vec<UnitView>,
    pub hands: [HandView; 2],
    pub master_volume: f32,
    pub global_mute: bool,
    pub transport: TransportState,
    pub finished: bool,
    pub elapsed_ms: f64,
    pub total_ms: f64,
    pub loading: Option<f32>, // progress 0..1 while tracks are still loading
    pub show_sliders: bool,
    pub status_text: String,
}
