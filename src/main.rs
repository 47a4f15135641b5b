mod audio;
mod audio_api;
mod control;
mod core;
mod feedback;
mod layout;
mod loader;
mod logging;
mod middle;
mod pose;
mod score;
mod shared;
mod timeline;
mod tui;

#[cfg(test)]
mod test_fixture;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use audio_api::{AudioCommand, AudioControl};
use loader::LoadEvent;
use middle::Middle;
use pose::SharedPose;
use shared::InputEvent;

/// Conduct a recorded orchestra with your hands (or mouse and keys).
#[derive(Parser, Debug)]
#[command(name = "orchestty", version, about)]
struct Cli {
    /// Directory holding one `<Instrument>.wav` per unit.
    #[arg(default_value = ".")]
    assets: PathBuf,

    /// Orchestra layout as JSON; the built-in seating when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// File or FIFO of newline-delimited JSON pose frames.
    #[arg(long)]
    pose_feed: Option<PathBuf>,

    #[arg(long, default_value = "orchestty.log")]
    log_file: PathBuf,

    /// Open with the volume panel showing.
    #[arg(long)]
    show_sliders: bool,

    /// Print the active configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // everything that can fail on bad input fails before the terminal is taken
    let config = score::files::load_config(cli.config.as_deref())?;
    if cli.print_config {
        println!("{}", score::files::config_json(&config)?);
        return Ok(());
    }
    let orchestra = config.into_orchestra().context("invalid orchestra configuration")?;
    logging::init(&cli.log_file)?;

    let names: Vec<String> = orchestra.units.iter().map(|u| u.name.clone()).collect();
    let missing = loader::track_loader::missing_tracks(&cli.assets, &names);
    if !missing.is_empty() {
        log::warn!("no track file for: {}", missing.join(", "));
    }

    let audio = audio::start_audio(names.len())?;
    let load_rx = loader::spawn_loading(cli.assets.clone(), names, audio.sample_rate());

    let pose = SharedPose::new();
    if let Some(path) = cli.pose_feed.clone() {
        pose::feed::spawn_pose_feed(path, pose.clone());
    }

    let (cols, rows) = terminal::size()?;
    let mut tui_state = tui::mode::TuiState::with_size(cols, rows);
    let mut middle = Middle::new(orchestra, tui_state.viewport());
    middle.set_show_sliders(cli.show_sliders);

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    crossterm::execute!(std::io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    let mut last_tick = Instant::now();

    loop {
        for event in load_rx.try_iter() {
            match event {
                LoadEvent::Loaded { unit, buffer } => match audio.send(AudioCommand::Register { track: unit, buffer }) {
                    Ok(()) => middle.on_track_loaded(unit),
                    Err(e) => middle.on_track_failed(unit, &e.to_string()),
                },
                LoadEvent::Failed { unit, reason } => middle.on_track_failed(unit, &reason),
            }
        }
        for unit in audio.poll_ended() {
            middle.on_track_ended(unit);
        }

        let ds = middle.display_state();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds);
        })?;

        let events = tui::input::poll_input(tick_rate, &mut tui_state, &pose)?;
        for event in events {
            if event == InputEvent::Quit {
                log::info!("quit");
                return Ok(());
            }
            for cmd in middle.handle_input(event) {
                if let Err(e) = audio.send(cmd) {
                    log::warn!("audio command dropped: {e}");
                }
            }
        }

        let elapsed_ms = last_tick.elapsed().as_secs_f64() * 1000.0;
        last_tick = Instant::now();
        let report = middle.tick(elapsed_ms, pose.snapshot(), &audio);
        if report.failed > 0 {
            log::debug!("mix: {} volume updates failed", report.failed);
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
