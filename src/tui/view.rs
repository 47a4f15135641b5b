use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph};

use crate::shared::DisplayState;
use crate::timeline::TransportState;

use super::grid;
use super::mode::STATUS_ROWS;

const SLIDER_PANEL_WIDTH: u16 = 36;

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState) {
    if let Some(progress) = state.loading {
        draw_loading(frame, area, progress, &state.status_text);
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),               // orchestra
            Constraint::Length(STATUS_ROWS), // transport + help
        ])
        .split(area);

    grid::draw_units(frame, sections[0], &state.units);
    grid::draw_hands(frame, sections[0], &state.hands);
    draw_status(frame, sections[1], state);

    if state.show_sliders {
        draw_sliders(frame, sections[0], state);
    }
}

fn draw_loading(frame: &mut Frame, area: Rect, progress: f32, status: &str) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(3), Constraint::Fill(1)])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(20), Constraint::Percentage(60), Constraint::Percentage(20)])
        .split(rows[1]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(format!(" {status} ")))
        .gauge_style(Style::default().fg(Color::Rgb(150, 200, 175)))
        .ratio(progress.clamp(0.0, 1.0) as f64);
    frame.render_widget(gauge, cols[1]);
}

fn mmss(ms: f64) -> String {
    let secs = (ms.max(0.0) / 1000.0) as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let transport = match (state.finished, state.transport) {
        (true, _) => Span::styled("■ finished", Style::default().fg(Color::Red)),
        (_, TransportState::Playing) => Span::styled("▶ playing", Style::default().fg(Color::Green)),
        (_, TransportState::Paused) => Span::raw("❚❚ paused"),
        (_, TransportState::Stopped) => Span::raw("■ stopped"),
    };
    let mut top = vec![
        transport,
        Span::raw(format!("  {} / {}", mmss(state.elapsed_ms), mmss(state.total_ms))),
        Span::raw(format!("  master {:>3.0}%", state.master_volume * 100.0)),
    ];
    if state.global_mute {
        top.push(Span::styled("  MUTE", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)));
    }
    top.push(Span::styled(format!("  {}", state.status_text), Style::default().fg(Color::DarkGray)));

    let help = Line::from(Span::styled(
        "space play/pause  enter restart  tab hand  1-4/7-0 gestures  [ ] master  - = slider  s sliders  esc quit",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(vec![Line::from(top), help]), area);
}

fn draw_sliders(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let width = SLIDER_PANEL_WIDTH.min(area.width);
    let height = (state.units.len() as u16 + 3).min(area.height);
    let panel = Rect::new(area.right() - width, area.y, width, height);
    frame.render_widget(Clear, panel);
    let block = Block::default().borders(Borders::ALL).title(" volumes ");
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    let mut constraints = vec![Constraint::Length(1); state.units.len() + 1];
    constraints.push(Constraint::Min(0));
    let rows = Layout::default().direction(Direction::Vertical).constraints(constraints).split(inner);

    slider_row(frame, rows[0], "Master", state.master_volume, false, false);
    for (unit, row) in state.units.iter().zip(rows.iter().skip(1)) {
        slider_row(frame, *row, &unit.name, unit.slider_volume, unit.focused, unit.muted);
    }
}

fn slider_row(frame: &mut Frame, row: Rect, name: &str, value: f32, focused: bool, muted: bool) {
    if row.height == 0 {
        return;
    }
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(14), Constraint::Min(4)])
        .split(row);

    let mut style = Style::default();
    if focused {
        style = style.add_modifier(Modifier::BOLD).fg(Color::Rgb(169, 213, 175));
    }
    if muted {
        style = style.fg(Color::DarkGray);
    }
    let marker = if focused { ">" } else { " " };
    frame.render_widget(Paragraph::new(format!("{marker}{name}")).style(style), cols[0]);

    let gauge = Gauge::default()
        .gauge_style(if muted { Style::default().fg(Color::DarkGray) } else { Style::default().fg(Color::Gray) })
        .ratio(value.clamp(0.0, 1.0) as f64)
        .label(format!("{:.2}", value));
    frame.render_widget(gauge, cols[1]);
}
