// The middle layer owns every bit of control state and runs the per-frame
// pipeline: timeline -> gestures -> mix -> feedback. The TUI and the audio
// thread never touch it directly; input comes in as `InputEvent`s, audio
// work goes out as `AudioCommand`s plus volume targets.

use crate::audio_api::{AudioCommand, AudioControl};
use crate::control;
use crate::core::{self, MixReport};
use crate::feedback;
use crate::layout::{Layout, LayoutParams, Placement, Viewport};
use crate::pose::{HandRole, PoseSnapshot};
use crate::score::Orchestra;
use crate::shared::{DisplayState, HandView, InputEvent, Unit, UnitFill, UnitId, UnitView};
use crate::timeline::{Timeline, TransportAction, TransportError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TrackStatus {
    Pending,
    Loaded,
    Failed, // settled, but stays silent
}

pub struct Middle {
    units: Vec<Unit>,
    params: LayoutParams,
    layout: Layout,
    timeline: Timeline,
    tracks: Vec<TrackStatus>,
    solo: UnitId,

    master_volume: f32,
    global_mute: bool,
    pose: PoseSnapshot, // last frame's, for drawing the cursors
    focused: Option<UnitId>,
    show_sliders: bool,
    status: String,
}

impl Middle {
    pub fn new(orchestra: Orchestra, viewport: Viewport) -> Self {
        let count = orchestra.units.len();
        let layout = derive_layout(&orchestra.units, orchestra.params, viewport);
        Self {
            timeline: Timeline::new(count, orchestra.schedule, orchestra.total_ms),
            tracks: vec![TrackStatus::Pending; count],
            solo: orchestra.solo,
            master_volume: orchestra.master_volume,
            params: orchestra.params,
            units: orchestra.units,
            layout,
            global_mute: false,
            pose: PoseSnapshot::default(),
            focused: None,
            show_sliders: false,
            status: String::from("loading tracks"),
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.layout = derive_layout(&self.units, self.params, viewport);
    }

    // -- track loading --

    pub fn on_track_loaded(&mut self, unit: UnitId) {
        self.settle(unit, TrackStatus::Loaded);
    }

    pub fn on_track_failed(&mut self, unit: UnitId, reason: &str) {
        log::warn!("track {} failed to load: {}", unit, reason);
        self.settle(unit, TrackStatus::Failed);
    }

    fn settle(&mut self, unit: UnitId, status: TrackStatus) {
        if let Some(slot) = self.tracks.get_mut(unit.index()) {
            *slot = status;
        }
        if self.is_ready() {
            let failed = self.tracks.iter().filter(|t| **t == TrackStatus::Failed).count();
            self.status = if failed == 0 {
                String::from("ready - space to play")
            } else {
                format!("ready ({failed} tracks missing) - space to play")
            };
            log::info!("all {} tracks settled, {} failed", self.tracks.len(), failed);
        }
    }

    pub fn on_track_ended(&mut self, unit: UnitId) {
        if let Some(u) = self.units.get_mut(unit.index()) {
            u.ended = true;
            log::debug!("{} ({}) reached the end", u.name, unit);
        }
    }

    fn settled_count(&self) -> usize {
        self.tracks.iter().filter(|t| **t != TrackStatus::Pending).count()
    }

    pub fn loading_progress(&self) -> f32 {
        if self.tracks.is_empty() {
            return 1.0;
        }
        self.settled_count() as f32 / self.tracks.len() as f32
    }

    pub fn is_ready(&self) -> bool {
        self.settled_count() == self.tracks.len()
    }

    // -- transport --

    /// Units that actually get transport commands: loaded and either not
    /// config-muted or the solo.
    fn playable(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.iter().filter(|u| {
            self.tracks.get(u.id.index()) == Some(&TrackStatus::Loaded) && (!u.muted || u.id == self.solo)
        })
    }

    pub fn toggle_play(&mut self) -> Result<Vec<AudioCommand>, TransportError> {
        if !self.is_ready() {
            return Err(TransportError::NotReady {
                settled: self.settled_count(),
                total: self.tracks.len(),
            });
        }
        let action = self.timeline.toggle()?;
        let cmds: Vec<AudioCommand> = match action {
            TransportAction::StartFromTop | TransportAction::Resume => self
                .playable()
                .filter(|u| !u.ended)
                .map(|u| AudioCommand::Play(u.id))
                .collect(),
            TransportAction::Pause => self.playable().map(|u| AudioCommand::Pause(u.id)).collect(),
        };
        self.status = match action {
            TransportAction::Pause => String::from("paused"),
            _ => String::from("playing"),
        };
        log::info!("transport: {:?} at {:.0} ms", action, self.timeline.elapsed_ms());
        Ok(cmds)
    }

    /// Back to the top: clock, scheduled mutes and every track rewound.
    /// Keeps playing if it was playing.
    pub fn restart(&mut self) -> Vec<AudioCommand> {
        self.timeline.restart();
        let playing = self.timeline.is_playing();
        let mut cmds = Vec::new();
        for u in self.playable() {
            cmds.push(AudioCommand::Rewind(u.id));
            if playing {
                cmds.push(AudioCommand::Play(u.id));
            }
        }
        for u in self.units.iter_mut() {
            u.ended = false;
        }
        self.status = String::from(if playing { "restarted" } else { "rewound" });
        log::info!("restart (playing: {playing})");
        cmds
    }

    // -- setters for the on-screen controls --

    pub fn set_master_volume(&mut self, volume: f32) {
        if volume.is_finite() {
            self.master_volume = volume.clamp(0.0, 1.0);
        }
    }

    pub fn set_slider_volume(&mut self, unit: UnitId, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        if let Some(u) = self.units.get_mut(unit.index()) {
            u.slider_volume = volume.clamp(0.0, 1.0);
        }
    }

    pub fn set_show_sliders(&mut self, show: bool) {
        self.show_sliders = show;
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<AudioCommand> {
        match event {
            InputEvent::TogglePlay => match self.toggle_play() {
                Ok(cmds) => return cmds,
                Err(e) => {
                    log::info!("play/pause rejected: {e}");
                    self.status = e.to_string();
                }
            },
            InputEvent::Restart => return self.restart(),
            InputEvent::NudgeMaster(d) => self.set_master_volume(self.master_volume + d),
            InputEvent::NudgeSlider(d) => {
                if let Some(unit) = self.focused {
                    let current = self.units[unit.index()].slider_volume;
                    self.set_slider_volume(unit, current + d);
                }
            }
            InputEvent::FocusAt(x, y) => {
                if let Some(unit) = self.layout.locate_loose(x, y) {
                    self.focused = Some(unit);
                }
            }
            InputEvent::ToggleSliders => self.show_sliders = !self.show_sliders,
            InputEvent::Resize(viewport) => self.resize(viewport),
            InputEvent::Quit => {}
        }
        vec![]
    }

    /// One frame. `pose` is the snapshot copied out at the start of the frame.
    pub fn tick<A: AudioControl>(&mut self, delta_ms: f64, pose: PoseSnapshot, audio: &A) -> MixReport {
        self.pose = pose;

        for unit in self.timeline.advance(delta_ms) {
            if let Some(u) = self.units.get(unit.index()) {
                log::info!(
                    "timeline mute: {} at {:.0} ms ({}/{})",
                    u.name,
                    self.timeline.elapsed_ms(),
                    self.timeline.consumed(),
                    self.timeline.scheduled()
                );
            }
        }

        let outcome = control::evaluate(&pose, &self.layout);
        control::apply(&outcome, &mut self.units, &mut self.master_volume);
        self.global_mute = outcome.global_mute;
        if outcome.selected.is_some() {
            self.focused = outcome.selected;
        }

        let report = core::apply_mix(
            &mut self.units,
            self.master_volume,
            self.timeline.active_flags(),
            self.global_mute,
            self.solo,
            audio,
        );
        feedback::refresh_levels(&mut self.units, audio);
        report
    }

    pub fn display_state(&self) -> DisplayState {
        let units = self
            .units
            .iter()
            .map(|u| {
                let fill = if u.is_accent() {
                    UnitFill::Accent
                } else if !self.timeline.is_active(u.id) {
                    UnitFill::TimelineMuted
                } else if u.selected {
                    UnitFill::Selected
                } else {
                    UnitFill::Base(u.base_color.clamp(0, 255) as u8)
                };
                UnitView {
                    id: u.id,
                    name: u.name.clone(),
                    bbox: self.layout.box_of(u.id).unwrap_or_default(),
                    // accent units carry no level squares
                    lit_squares: if u.is_accent() { Vec::new() } else { self.layout.squares_of(u.id).to_vec() },
                    fill,
                    brightness: if u.ended { 255 } else { feedback::brightness(u.amplitude_level) },
                    text_light: u.text_light(),
                    slider_volume: u.slider_volume,
                    output_volume: u.output_volume,
                    muted: u.muted,
                    focused: self.focused == Some(u.id),
                }
            })
            .collect();

        let viewport = self.layout.viewport();
        let hand = |role: HandRole| {
            let h = self.pose.hand(role);
            let (x, y) = h.to_pixels(viewport);
            HandView { role, x, y, gesture: h.gesture }
        };

        DisplayState {
            viewport,
            grid_region: self.layout.grid_region(),
            units,
            hands: [hand(HandRole::Left), hand(HandRole::Right)],
            master_volume: self.master_volume,
            global_mute: self.global_mute,
            transport: self.timeline.transport(),
            finished: self.timeline.is_finished(),
            elapsed_ms: self.timeline.elapsed_ms(),
            total_ms: self.timeline.total_ms(),
            loading: (!self.is_ready()).then(|| self.loading_progress()),
            show_sliders: self.show_sliders,
            status_text: self.status.clone(),
        }
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

fn derive_layout(units: &[Unit], params: LayoutParams, viewport: Viewport) -> Layout {
    let placements: Vec<Placement> = units.iter().map(|u| u.placement).collect();
    Layout::derive(&placements, params.fit(viewport), viewport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LOW_VOICE, SOLO_VOLUME};
    use crate::pose::{GestureLabel, HandSample};
    use crate::score::OrchestraConfig;
    use crate::test_fixture::{self, FakeAudio, REFERENCE_VIEWPORT};
    use crate::timeline::{ScheduledMute, TransportState};

    const FRAME_MS: f64 = 16.0;

    fn ready_middle(config: OrchestraConfig) -> (Middle, FakeAudio) {
        let orchestra = config.into_orchestra().unwrap();
        let count = orchestra.units.len();
        let mut m = Middle::new(orchestra, REFERENCE_VIEWPORT);
        for i in 0..count {
            m.on_track_loaded(UnitId(i as u8));
        }
        (m, FakeAudio::all_loaded(count))
    }

    fn pointing_at(m: &Middle, unit: u8) -> HandSample {
        let (x, y) = test_fixture::unit_center_normalized(m.layout(), UnitId(unit));
        HandSample::new(x, y, GestureLabel::PointingUp)
    }

    #[test]
    fn play_is_rejected_until_every_track_settles() {
        let orchestra = test_fixture::default_orchestra();
        let mut m = Middle::new(orchestra, REFERENCE_VIEWPORT);
        m.on_track_loaded(UnitId(0));
        assert_eq!(m.toggle_play(), Err(TransportError::NotReady { settled: 1, total: 18 }));
        assert!(m.display_state().loading.is_some());

        for i in 1..18 {
            if i == 4 {
                m.on_track_failed(UnitId(i), "missing");
            } else {
                m.on_track_loaded(UnitId(i));
            }
        }
        assert!(m.is_ready());
        assert!(m.display_state().loading.is_none());
        let cmds = m.toggle_play().unwrap();
        // failed and config-muted tracks get no Play
        assert!(!cmds.iter().any(|c| matches!(c, AudioCommand::Play(UnitId(4)))));
        assert!(!cmds.iter().any(|c| matches!(c, AudioCommand::Play(UnitId(9)))));
        assert_eq!(cmds.len(), 18 - 1 - 3);
    }

    #[test]
    fn pointing_at_flute_with_palm_sets_its_slider_and_mix() {
        let (mut m, audio) = ready_middle(OrchestraConfig::default());
        let pose = PoseSnapshot {
            left: pointing_at(&m, 0),
            right: HandSample::new(0.8, 0.2, GestureLabel::OpenPalm),
        };
        m.tick(FRAME_MS, pose, &audio);

        let flute = &m.units()[0];
        assert!(flute.selected);
        assert!((flute.slider_volume - 0.8).abs() < 1e-6);
        // master stays at 0.5 because the other hand is pointing
        assert_eq!(m.master_volume(), 0.5);
        assert!((audio.volume(UnitId(0)).unwrap() - 0.4).abs() < 1e-6);

        let ds = m.display_state();
        assert_eq!(ds.units[0].fill, UnitFill::Selected);
        assert!(ds.units[0].focused);
    }

    #[test]
    fn fists_mute_everything_but_the_solo() {
        let (mut m, audio) = ready_middle(OrchestraConfig::default());
        let pose = PoseSnapshot {
            left: HandSample::new(0.3, 0.3, GestureLabel::ClosedFist),
            right: HandSample::new(0.7, 0.3, GestureLabel::ClosedFist),
        };
        m.tick(FRAME_MS, pose, &audio);
        assert!(m.display_state().global_mute);
        assert_eq!(audio.volume(UnitId(10)), Some(SOLO_VOLUME));
        assert_eq!(audio.volume(UnitId(0)), Some(LOW_VOICE));
        assert_eq!(audio.volume(UnitId(9)), Some(0.0)); // config-muted stays silent

        // the mute lasts only while the fist is held
        m.tick(FRAME_MS, PoseSnapshot::default(), &audio);
        assert_eq!(audio.volume(UnitId(0)), Some(0.25));
    }

    #[test]
    fn scheduled_mute_drops_unit_to_low_voice_and_turns_red() {
        let config = OrchestraConfig {
            schedule: vec![ScheduledMute { at_ms: 100.0, unit: 13 }],
            ..Default::default()
        };
        let (mut m, audio) = ready_middle(config);
        m.toggle_play().unwrap();
        for _ in 0..7 {
            m.tick(FRAME_MS, PoseSnapshot::default(), &audio); // 112 ms
        }
        assert_eq!(audio.volume(UnitId(13)), Some(LOW_VOICE));
        assert_eq!(m.display_state().units[13].fill, UnitFill::TimelineMuted);

        // even a gesture aimed at it can't bring it back
        let pose = PoseSnapshot {
            left: pointing_at(&m, 13),
            right: HandSample::new(0.9, 0.0, GestureLabel::OpenPalm),
        };
        m.tick(FRAME_MS, pose, &audio);
        assert_eq!(audio.volume(UnitId(13)), Some(LOW_VOICE));

        audio.take_transport();
        let cmds = m.restart();
        assert!(cmds.contains(&AudioCommand::Rewind(UnitId(13))));
        m.tick(FRAME_MS, PoseSnapshot::default(), &audio);
        assert_eq!(m.display_state().units[13].fill, UnitFill::Base(255));
        assert!(audio.volume(UnitId(13)).unwrap() > LOW_VOICE);
    }

    #[test]
    fn clock_freezes_while_paused() {
        let (mut m, audio) = ready_middle(OrchestraConfig::default());
        m.toggle_play().unwrap();
        m.tick(100.0, PoseSnapshot::default(), &audio);
        let cmds = m.handle_input(InputEvent::TogglePlay);
        assert!(cmds.iter().all(|c| matches!(c, AudioCommand::Pause(_))));
        m.tick(500.0, PoseSnapshot::default(), &audio);
        let ds = m.display_state();
        assert_eq!(ds.elapsed_ms, 100.0);
        assert_eq!(ds.transport, TransportState::Paused);
    }

    #[test]
    fn finished_playback_ignores_play_pause_until_restart() {
        let config = OrchestraConfig { total_ms: 1_000.0, ..Default::default() };
        let (mut m, audio) = ready_middle(config);
        m.toggle_play().unwrap();
        m.tick(1_001.0, PoseSnapshot::default(), &audio);
        assert!(m.display_state().finished);
        assert!(m.handle_input(InputEvent::TogglePlay).is_empty());
        assert_eq!(m.toggle_play(), Err(TransportError::Finished));

        m.handle_input(InputEvent::Restart);
        assert!(!m.display_state().finished);
        assert!(m.toggle_play().is_ok());
    }

    #[test]
    fn restart_rewinds_and_replays_tracks_when_playing() {
        let (mut m, _audio) = ready_middle(OrchestraConfig::default());
        m.toggle_play().unwrap();
        m.on_track_ended(UnitId(0));
        let cmds = m.restart();
        assert!(cmds.contains(&AudioCommand::Rewind(UnitId(0))));
        assert!(cmds.contains(&AudioCommand::Play(UnitId(0))));
        assert!(!cmds.contains(&AudioCommand::Rewind(UnitId(16)))); // Harp is muted
        assert!(!m.units()[0].ended);
    }

    #[test]
    fn ended_track_stops_lighting_up() {
        let (mut m, audio) = ready_middle(OrchestraConfig::default());
        audio.set_level(UnitId(3), 0.2);
        m.tick(FRAME_MS, PoseSnapshot::default(), &audio);
        assert!(m.display_state().units[3].brightness < 255);
        m.on_track_ended(UnitId(3));
        assert_eq!(m.display_state().units[3].brightness, 255);
    }

    #[test]
    fn keyboard_sliders_follow_focus() {
        let (mut m, audio) = ready_middle(OrchestraConfig::default());
        m.handle_input(InputEvent::NudgeSlider(0.1)); // nothing focused, no-op
        assert!(m.units().iter().all(|u| u.slider_volume <= 0.7));

        let (cx, cy) = m.layout().box_of(UnitId(12)).unwrap().center();
        m.handle_input(InputEvent::FocusAt(cx, cy));
        m.handle_input(InputEvent::NudgeSlider(0.2));
        assert!((m.units()[12].slider_volume - 0.7).abs() < 1e-6);

        m.handle_input(InputEvent::NudgeMaster(0.8));
        assert_eq!(m.master_volume(), 1.0);
        m.tick(FRAME_MS, PoseSnapshot::default(), &audio);
        assert!((audio.volume(UnitId(12)).unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn resize_rederives_boxes_and_keeps_hit_testing_consistent() {
        let (mut m, _audio) = ready_middle(OrchestraConfig::default());
        m.handle_input(InputEvent::Resize(Viewport::new(2000.0, 1200.0)));
        let b = m.layout().box_of(UnitId(0)).unwrap();
        let (cx, cy) = b.center();
        assert_eq!(m.layout().locate(cx, cy), Some(UnitId(0)));
        let region = m.display_state().grid_region;
        assert!(m.display_state().units.iter().all(|u| region.contains_box(&u.bbox)));

        // too small: cells shrink so the grid still fits
        m.resize(Viewport::new(800.0, 400.0));
        let region = m.layout().grid_region();
        assert!(region.width <= 800.0 && region.height <= 400.0);
    }

    #[test]
    fn unloaded_tracks_are_retried_every_frame() {
        let orchestra = test_fixture::default_orchestra();
        let mut m = Middle::new(orchestra, REFERENCE_VIEWPORT);
        let audio = FakeAudio::new(18);
        let report = m.tick(FRAME_MS, PoseSnapshot::default(), &audio);
        assert_eq!(report.not_ready, 18);

        audio
            .send(AudioCommand::Register {
                track: UnitId(0),
                buffer: crate::audio::TrackBuffer::from_frames(vec![]),
            })
            .unwrap();
        let report = m.tick(FRAME_MS, PoseSnapshot::default(), &audio);
        assert_eq!(report.applied, 1);
    }

    #[test]
    fn accent_unit_keeps_its_fill_when_selected() {
        let (mut m, audio) = ready_middle(OrchestraConfig::default());
        let pose = PoseSnapshot { left: pointing_at(&m, 17), right: HandSample::default() };
        m.tick(FRAME_MS, pose, &audio);
        assert!(m.units()[17].selected);
        assert_eq!(m.display_state().units[17].fill, UnitFill::Accent);
    }
}
