use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Per-track values shared between the control thread and the audio
/// callback without locking. Floats are stored as their bit patterns.
#[derive(Debug)]
pub struct TrackMeters {
    volume: Vec<AtomicU32>, // written by control, read by the callback
    level: Vec<AtomicU32>,  // written by the callback, read by control
    registered: Vec<AtomicBool>,
}

impl TrackMeters {
    pub fn new(track_count: usize) -> Self {
        Self {
            volume: (0..track_count).map(|_| AtomicU32::new(0.0f32.to_bits())).collect(),
            level: (0..track_count).map(|_| AtomicU32::new(0.0f32.to_bits())).collect(),
            registered: (0..track_count).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.volume.len()
    }

    pub fn volume(&self, track: usize) -> f32 {
        load(&self.volume, track)
    }

    pub fn set_volume(&self, track: usize, volume: f32) {
        store(&self.volume, track, volume.clamp(0.0, 1.0));
    }

    pub fn level(&self, track: usize) -> f32 {
        load(&self.level, track)
    }

    pub fn set_level(&self, track: usize, level: f32) {
        store(&self.level, track, level);
    }

    pub fn is_registered(&self, track: usize) -> bool {
        self.registered.get(track).is_some_and(|f| f.load(Ordering::Acquire))
    }

    pub fn mark_registered(&self, track: usize) {
        if let Some(f) = self.registered.get(track) {
            f.store(true, Ordering::Release);
        }
    }
}

fn load(cells: &[AtomicU32], i: usize) -> f32 {
    cells.get(i).map_or(0.0, |c| f32::from_bits(c.load(Ordering::Relaxed)))
}

fn store(cells: &[AtomicU32], i: usize, v: f32) {
    if let Some(c) = cells.get(i) {
        c.store(v.to_bits(), Ordering::Relaxed);
    }
}
