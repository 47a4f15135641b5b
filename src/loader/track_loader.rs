use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::Receiver;

use crate::audio::TrackBuffer;
use crate::shared::UnitId;

/// One track settled, either way.
#[derive(Debug)]
pub enum LoadEvent {
    Loaded { unit: UnitId, buffer: TrackBuffer },
    Failed { unit: UnitId, reason: String },
}

// <assets>/<Name>.wav
pub fn track_path(assets_dir: &Path, name: &str) -> PathBuf {
    assets_dir.join(format!("{name}.wav"))
}

/// Names in `names` that have no track file in `assets_dir`.
pub fn missing_tracks<'a>(assets_dir: &Path, names: &'a [String]) -> Vec<&'a str> {
    names
        .iter()
        .filter(|n| !track_path(assets_dir, n).is_file())
        .map(String::as_str)
        .collect()
}

/// Decode every unit's track on a background thread, in configuration
/// order. Exactly one event per unit comes back over the channel.
pub fn spawn_loading(assets_dir: PathBuf, names: Vec<String>, sample_rate: u32) -> Receiver<LoadEvent> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        for (i, name) in names.iter().enumerate() {
            let unit = UnitId(i as u8);
            let path = track_path(&assets_dir, name);
            let event = match TrackBuffer::load_wav(&path, sample_rate) {
                Ok(buffer) if buffer.is_empty() => {
                    log::warn!("{} has no audio frames", path.display());
                    LoadEvent::Failed { unit, reason: String::from("empty track") }
                }
                Ok(buffer) => {
                    log::info!("loaded {} ({} frames)", path.display(), buffer.len());
                    LoadEvent::Loaded { unit, buffer }
                }
                Err(e) => {
                    log::warn!("could not load {}: {:#}", path.display(), e);
                    LoadEvent::Failed { unit, reason: format!("{e:#}") }
                }
            };
            if tx.send(event).is_err() {
                break; // receiver gone, app is shutting down
            }
        }
    });
    rx
}
