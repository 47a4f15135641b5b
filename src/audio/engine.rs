use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::audio_api::AudioCommand;
use crate::shared::UnitId;

use super::frame::StereoFrame;
use super::meters::TrackMeters;
use super::track_buffer::TrackBuffer;
use super::voice::TrackVoice;

const MIX_CAPACITY: usize = 8192; // frames; pre-sized so the callback rarely allocates

struct TrackSlot {
    buffer: TrackBuffer,
    voice: TrackVoice,
}

/// Lives inside the cpal output callback. Owns every track's playback
/// cursor; volumes come in through the shared meters, transport through
/// the command queue.
pub struct Engine {
    tracks: Vec<Option<TrackSlot>>,
    meters: Arc<TrackMeters>,
    ended_tx: Sender<UnitId>,
    mix: Vec<StereoFrame>,
}

impl Engine {
    pub fn new(meters: Arc<TrackMeters>, ended_tx: Sender<UnitId>) -> Self {
        let count = meters.len();
        Self {
            tracks: (0..count).map(|_| None).collect(),
            meters,
            ended_tx,
            mix: Vec::with_capacity(MIX_CAPACITY),
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Register { track, buffer } => {
                if let Some(slot) = self.tracks.get_mut(track.index()) {
                    *slot = Some(TrackSlot { buffer, voice: TrackVoice::new() });
                    self.meters.mark_registered(track.index());
                }
            }
            AudioCommand::Play(track) => self.with_voice(track, TrackVoice::play),
            AudioCommand::Pause(track) => self.with_voice(track, TrackVoice::pause),
            AudioCommand::Rewind(track) => self.with_voice(track, TrackVoice::rewind),
        }
    }

    fn with_voice(&mut self, track: UnitId, f: impl FnOnce(&mut TrackVoice)) {
        if let Some(Some(slot)) = self.tracks.get_mut(track.index()) {
            f(&mut slot.voice);
        }
    }

    /// Mix every playing track into `out`, publish per-track levels and
    /// report tracks that just ran out.
    pub fn render_block(&mut self, n_frames: usize) -> &[StereoFrame] {
        self.mix.clear();
        self.mix.resize(n_frames, StereoFrame::zero());

        for (i, slot) in self.tracks.iter_mut().enumerate() {
            let Some(slot) = slot else {
                continue;
            };
            let was_ended = slot.voice.has_ended();
            let target = self.meters.volume(i);
            let level = slot.voice.render_into(&slot.buffer, &mut self.mix, target);
            self.meters.set_level(i, level);
            if slot.voice.has_ended() && !was_ended {
                let _ = self.ended_tx.try_send(UnitId(i as u8));
            }
        }
        &self.mix
    }

    /// Render straight into a cpal interleaved buffer of any channel count.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let n_frames = data.len() / channels;
        self.render_block(n_frames);
        for (out, frame) in data.chunks_exact_mut(channels).zip(self.mix.iter()) {
            if channels == 1 {
                out[0] = (0.5 * (frame.left + frame.right)).clamp(-1.0, 1.0);
                continue;
            }
            out[0] = frame.left.clamp(-1.0, 1.0);
            out[1] = frame.right.clamp(-1.0, 1.0);
            for extra in &mut out[2..] {
                *extra = 0.0;
            }
        }
    }
}
