use super::frame::StereoFrame;
use super::track_buffer::TrackBuffer;

/// Playback cursor for one instrument track. Tracks play at their native
/// speed from start to end; there is no looping.
#[derive(Clone, Debug, Default)]
pub struct TrackVoice {
    pos: usize,
    gain: f32, // last gain applied, ramped toward the target each block
    playing: bool,
    ended: bool,
}

impl TrackVoice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self) {
        if self.ended {
            self.pos = 0;
            self.ended = false;
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Back to the first frame. Play/pause state is kept.
    pub fn rewind(&mut self) {
        self.pos = 0;
        self.ended = false;
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    /// Mix this voice into `out` and return the RMS of what it contributed.
    /// Gain moves linearly from the previous block's gain to `target_gain`
    /// across the block so volume jumps don't click.
    pub fn render_into(&mut self, buffer: &TrackBuffer, out: &mut [StereoFrame], target_gain: f32) -> f32 {
        if !self.playing || out.is_empty() {
            return 0.0;
        }
        let data = &buffer.data;
        let start_gain = self.gain;
        let step = (target_gain - start_gain) / out.len() as f32;

        let mut power = 0.0f32;
        for (i, frame) in out.iter_mut().enumerate() {
            let Some(sample) = data.get(self.pos) else {
                self.playing = false;
                self.ended = true;
                break;
            };
            let gain = start_gain + step * (i + 1) as f32;
            let s = sample.scaled(gain);
            frame.left += s.left;
            frame.right += s.right;
            power += s.power();
            self.pos += 1;
        }
        self.gain = target_gain;

        if self.playing && self.pos >= data.len() {
            self.playing = false;
            self.ended = true;
        }
        (power / out.len() as f32).sqrt()
    }
}
