use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};

use crate::pose::{GestureLabel, HandRole, SharedPose};
use crate::shared::InputEvent;

use super::mode::{TuiState, cell_to_px};

const VOLUME_STEP: f32 = 0.05;

// poll for terminal input, update the simulated hands (which feed the shared
// pose like a camera would) and resolve everything else into InputEvents
pub fn poll_input(timeout: Duration, ts: &mut TuiState, pose: &SharedPose) -> anyhow::Result<Vec<InputEvent>> {
    let mut events = Vec::new();
    if !event::poll(timeout)? {
        return Ok(events);
    }
    // drain whatever queued up; mouse motion arrives in bursts
    loop {
        let ev = event::read()?;
        events.extend(handle_event(ev, ts, pose));
        if !event::poll(Duration::ZERO)? {
            break;
        }
    }
    Ok(events)
}

fn handle_event(ev: Event, ts: &mut TuiState, pose: &SharedPose) -> Vec<InputEvent> {
    match ev {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(key.code, ts, pose),
        Event::Mouse(m) => match m.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                move_active_hand(ts, pose, m.column, m.row);
                vec![]
            }
            MouseEventKind::Down(MouseButton::Left) => {
                move_active_hand(ts, pose, m.column, m.row);
                let (x, y) = cell_to_px(m.column, m.row);
                vec![InputEvent::FocusAt(x, y)]
            }
            _ => vec![],
        },
        Event::Resize(cols, rows) => {
            ts.set_size(cols, rows);
            // hands keep their pixel position; re-send so normalization follows
            push_hand(ts, pose, HandRole::Left);
            push_hand(ts, pose, HandRole::Right);
            vec![InputEvent::Resize(ts.viewport())]
        }
        _ => vec![],
    }
}

pub fn handle_key(code: KeyCode, ts: &mut TuiState, pose: &SharedPose) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::TogglePlay],
        KeyCode::Enter => vec![InputEvent::Restart],
        KeyCode::Char('s') => vec![InputEvent::ToggleSliders],

        KeyCode::Tab => {
            ts.active = ts.active.other();
            vec![]
        }

        KeyCode::Char(c @ ('1' | '2' | '3' | '4' | '7' | '8' | '9' | '0')) => {
            if let Some((role, gesture)) = char_to_gesture(c) {
                ts.hand_mut(role).gesture = gesture;
                push_hand(ts, pose, role);
            }
            vec![]
        }

        KeyCode::Char('[') => vec![InputEvent::NudgeMaster(-VOLUME_STEP)],
        KeyCode::Char(']') => vec![InputEvent::NudgeMaster(VOLUME_STEP)],
        KeyCode::Char('-') => vec![InputEvent::NudgeSlider(-VOLUME_STEP)],
        KeyCode::Char('=') => vec![InputEvent::NudgeSlider(VOLUME_STEP)],

        _ => vec![],
    }
}

fn move_active_hand(ts: &mut TuiState, pose: &SharedPose, col: u16, row: u16) {
    let (x, y) = cell_to_px(col, row);
    let vp = ts.viewport();
    let hand = ts.hand_mut(ts.active);
    hand.x = x.min(vp.width);
    hand.y = y.min(vp.height);
    push_hand(ts, pose, ts.active);
}

fn push_hand(ts: &TuiState, pose: &SharedPose, role: HandRole) {
    pose.observe(&ts.observation(role));
}

// left hand on 1-4, right hand on 7-0
fn char_to_gesture(c: char) -> Option<(HandRole, GestureLabel)> {
    let g = match c {
        '1' | '7' => GestureLabel::PointingUp,
        '2' | '8' => GestureLabel::OpenPalm,
        '3' | '9' => GestureLabel::ClosedFist,
        '4' | '0' => GestureLabel::None,
        _ => return None,
    };
    let role = if matches!(c, '1'..='4') { HandRole::Left } else { HandRole::Right };
    Some((role, g))
}
