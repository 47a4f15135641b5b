use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Paragraph};

use crate::layout::BBox;
use crate::pose::{GestureLabel, HandRole};
use crate::shared::{HandView, UnitFill, UnitView};

use super::mode::{PX_PER_COL, PX_PER_ROW};

const ACCENT: Color = Color::Rgb(150, 200, 175);
const TIMELINE_MUTED: Color = Color::Rgb(255, 90, 90);
const SELECTED: Color = Color::Rgb(169, 213, 175);

pub fn fill_color(fill: UnitFill) -> Color {
    match fill {
        UnitFill::Accent => ACCENT,
        UnitFill::TimelineMuted => TIMELINE_MUTED,
        UnitFill::Selected => SELECTED,
        UnitFill::Base(v) => Color::Rgb(v, v, v),
    }
}

/// Pixel box -> terminal cells inside `area`, at least one cell each way.
/// `None` if it falls outside.
pub fn px_rect(b: &BBox, area: Rect) -> Option<Rect> {
    let x0 = (b.x / PX_PER_COL).round().max(0.0) as u16;
    let y0 = (b.y / PX_PER_ROW).round().max(0.0) as u16;
    let x1 = ((b.right() / PX_PER_COL).round().max(0.0) as u16).max(x0 + 1);
    let y1 = ((b.bottom() / PX_PER_ROW).round().max(0.0) as u16).max(y0 + 1);
    let r = Rect::new(area.x + x0, area.y + y0, x1 - x0, y1 - y0);
    let clipped = r.intersection(area);
    (clipped.width > 0 && clipped.height > 0).then_some(clipped)
}

// Earlier units are drawn last so they sit on top, the same priority
// hit-testing uses.
pub fn draw_units(frame: &mut Frame, area: Rect, units: &[UnitView]) {
    for unit in units.iter().rev() {
        let Some(rect) = px_rect(&unit.bbox, area) else {
            continue;
        };
        frame.render_widget(Block::default().style(Style::default().bg(fill_color(unit.fill))), rect);

        let shade = Color::Rgb(unit.brightness, unit.brightness, unit.brightness);
        for square in &unit.lit_squares {
            if let Some(sq) = px_rect(square, area) {
                frame.render_widget(Block::default().style(Style::default().bg(shade)), sq);
            }
        }

        let fg = if unit.text_light { Color::White } else { Color::Black };
        let mut style = Style::default().fg(fg);
        if unit.focused {
            style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        let label_row = Rect::new(rect.x, rect.y + rect.height / 2, rect.width, 1);
        frame.render_widget(
            Paragraph::new(unit.name.as_str()).style(style).alignment(Alignment::Center),
            label_row,
        );
    }
}

fn cursor_glyph(hand: &HandView) -> (&'static str, Color) {
    let idle = match hand.role {
        HandRole::Left => Color::Red,
        HandRole::Right => Color::Blue,
    };
    match hand.gesture {
        GestureLabel::PointingUp => ("▲", Color::Green),
        GestureLabel::OpenPalm => ("▬", Color::Yellow),
        GestureLabel::ClosedFist => ("•", idle),
        GestureLabel::None => ("●", idle),
    }
}

pub fn draw_hands(frame: &mut Frame, area: Rect, hands: &[HandView]) {
    for hand in hands {
        let col = (hand.x / PX_PER_COL).floor();
        let row = (hand.y / PX_PER_ROW).floor();
        if col < 0.0 || row < 0.0 || col >= area.width as f32 || row >= area.height as f32 {
            continue;
        }
        let (glyph, color) = cursor_glyph(hand);
        let pos = (area.x + col as u16, area.y + row as u16);
        if let Some(cell) = frame.buffer_mut().cell_mut(pos) {
            cell.set_symbol(glyph).set_fg(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxes_map_onto_terminal_cells() {
        let area = Rect::new(0, 0, 100, 40);
        let r = px_rect(&BBox::new(80.0, 32.0, 160.0, 48.0), area).unwrap();
        assert_eq!(r, Rect::new(10, 2, 20, 3));
    }

    #[test]
    fn tiny_boxes_still_get_a_cell_and_offscreen_ones_none() {
        let area = Rect::new(0, 0, 100, 40);
        let r = px_rect(&BBox::new(80.0, 32.0, 1.0, 1.0), area).unwrap();
        assert_eq!((r.width, r.height), (1, 1));
        assert!(px_rect(&BBox::new(5000.0, 0.0, 10.0, 10.0), area).is_none());
    }

    #[test]
    fn fill_colors_match_state() {
        assert_eq!(fill_color(UnitFill::Base(255)), Color::Rgb(255, 255, 255));
        assert_eq!(fill_color(UnitFill::TimelineMuted), Color::Rgb(255, 90, 90));
    }
}
