// Pose feed: reads newline-delimited JSON pose frames from a file or FIFO,
// so an external hand-tracking process can drive the orchestra.
//
//   {"hands":[{"x":0.41,"y":0.22,"gesture":"Pointing_Up","handedness":"Right"}]}
//
// Coordinates are camera space; SharedPose::observe does the mirroring.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::thread;

use serde::Deserialize;

use super::{HandObservation, SharedPose};

#[derive(Debug, Deserialize)]
pub struct PoseFrame {
    #[serde(default)]
    pub hands: Vec<HandObservation>,
}

/// Parse one line and push its hands into the shared pose.
/// Returns how many hands were applied; blank lines apply nothing.
pub fn apply_line(line: &str, pose: &SharedPose) -> Result<usize, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(0);
    }
    let frame: PoseFrame = serde_json::from_str(line)?;
    for hand in &frame.hands {
        pose.observe(hand);
    }
    Ok(frame.hands.len())
}

/// Spawn the reader thread. Opening happens on the thread because opening a
/// FIFO blocks until the writer shows up.
pub fn spawn_pose_feed(path: PathBuf, pose: SharedPose) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                log::error!("pose feed: cannot open {}: {}", path.display(), e);
                return;
            }
        };
        log::info!("pose feed: reading {}", path.display());

        let mut bad_lines = 0usize;
        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    log::error!("pose feed: read error: {}", e);
                    break;
                }
            };
            if let Err(e) = apply_line(&line, &pose) {
                bad_lines += 1;
                // one bad frame is noise; keep the log readable
                if bad_lines <= 5 {
                    log::warn!("pose feed: skipping malformed frame: {}", e);
                }
            }
        }
        log::info!("pose feed: {} closed ({} malformed frames)", path.display(), bad_lines);
    })
}
