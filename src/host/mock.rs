//! In-memory host used by the test suite
//!
//! Mirrors the facade faithfully enough to exercise banking, FX mapping,
//! transport and persistence without a real host. Interior mutability keeps
//! the facade methods `&self` like a real integration layer.

use super::{
    FxRef, HostFacade, TrackParam, TrackRef, TransportCommand, TransportState, ViewMode,
};
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone)]
struct MockFx {
    guid: String,
    name: String,
    params: Vec<f64>,
}

#[derive(Debug, Clone)]
struct MockTrack {
    guid: String,
    name: String,
    visible_mixer: bool,
    visible_arrange: bool,
    color: u32,
    params: HashMap<TrackParam, f64>,
    fx: Vec<MockFx>,
}

impl MockTrack {
    fn new(guid: &str, name: &str) -> Self {
        let mut params = HashMap::new();
        params.insert(TrackParam::Volume, 1.0);
        params.insert(TrackParam::Pan, 0.0);
        params.insert(TrackParam::Width, 1.0);
        params.insert(TrackParam::Mute, 0.0);
        params.insert(TrackParam::Solo, 0.0);
        params.insert(TrackParam::RecordArm, 0.0);
        params.insert(TrackParam::Selected, 0.0);
        params.insert(TrackParam::AutomationMode, 0.0);
        Self {
            guid: guid.to_string(),
            name: name.to_string(),
            visible_mixer: true,
            visible_arrange: true,
            color: 0,
            params,
            fx: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    tracks: Vec<MockTrack>,
    selected: Option<String>,
    transport: TransportState,
    automation_override: i32,
    ext: HashMap<(String, String), String>,
    open_windows: Vec<(String, usize)>,
    next_guid: usize,
}

/// In-memory [`HostFacade`] implementation for tests.
#[derive(Debug, Default)]
pub struct MockHost {
    state: RefCell<MockState>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host with `n` tracks named "Track 1".."Track n".
    pub fn with_tracks(n: usize) -> Self {
        let host = Self::new();
        for i in 0..n {
            host.add_track(&format!("Track {}", i + 1));
        }
        host
    }

    /// Append a track and return its reference.
    pub fn add_track(&self, name: &str) -> TrackRef {
        let mut state = self.state.borrow_mut();
        state.next_guid += 1;
        let guid = format!("{{track-{}}}", state.next_guid);
        state.tracks.push(MockTrack::new(&guid, name));
        TrackRef::new(guid)
    }

    /// Remove a track, invalidating its reference.
    pub fn remove_track(&self, track: &TrackRef) {
        let mut state = self.state.borrow_mut();
        state.tracks.retain(|t| t.guid != track.as_str());
        if state.selected.as_deref() == Some(track.as_str()) {
            state.selected = None;
        }
    }

    /// Set per-view visibility flags for a track.
    pub fn set_track_visible(&self, track: &TrackRef, mixer: bool, arrange: bool) {
        let mut state = self.state.borrow_mut();
        if let Some(t) = state.tracks.iter_mut().find(|t| t.guid == track.as_str()) {
            t.visible_mixer = mixer;
            t.visible_arrange = arrange;
        }
    }

    /// Append an FX instance to a track's chain and return its slot index.
    pub fn add_fx(&self, track: &TrackRef, name: &str, param_count: usize) -> usize {
        let mut state = self.state.borrow_mut();
        state.next_guid += 1;
        let guid = format!("{{fx-{}}}", state.next_guid);
        let t = state
            .tracks
            .iter_mut()
            .find(|t| t.guid == track.as_str())
            .expect("unknown track in test setup");
        t.fx.push(MockFx {
            guid,
            name: name.to_string(),
            params: vec![0.0; param_count],
        });
        t.fx.len() - 1
    }

    /// Remove the FX at `slot`, shifting later slots down.
    pub fn remove_fx(&self, track: &TrackRef, slot: usize) {
        let mut state = self.state.borrow_mut();
        if let Some(t) = state.tracks.iter_mut().find(|t| t.guid == track.as_str()) {
            if slot < t.fx.len() {
                t.fx.remove(slot);
            }
        }
    }

    /// FX windows currently open, in open order.
    pub fn open_windows(&self) -> Vec<(TrackRef, usize)> {
        self.state
            .borrow()
            .open_windows
            .iter()
            .map(|(g, s)| (TrackRef::new(g.clone()), *s))
            .collect()
    }

    fn with_track<R>(&self, track: &TrackRef, f: impl FnOnce(&MockTrack) -> R) -> Option<R> {
        let state = self.state.borrow();
        state
            .tracks
            .iter()
            .find(|t| t.guid == track.as_str())
            .map(f)
    }

    fn with_track_mut<R>(&self, track: &TrackRef, f: impl FnOnce(&mut MockTrack) -> R) -> Option<R> {
        let mut state = self.state.borrow_mut();
        state
            .tracks
            .iter_mut()
            .find(|t| t.guid == track.as_str())
            .map(f)
    }
}

impl HostFacade for MockHost {
    fn visible_tracks(&self, view: ViewMode) -> Vec<TrackRef> {
        let state = self.state.borrow();
        state
            .tracks
            .iter()
            .filter(|t| match view {
                ViewMode::Mixer => t.visible_mixer,
                ViewMode::Arrange => t.visible_arrange,
            })
            .map(|t| TrackRef::new(t.guid.clone()))
            .collect()
    }

    fn is_track_visible(&self, track: &TrackRef, view: ViewMode) -> bool {
        self.with_track(track, |t| match view {
            ViewMode::Mixer => t.visible_mixer,
            ViewMode::Arrange => t.visible_arrange,
        })
        .unwrap_or(false)
    }

    fn is_track_valid(&self, track: &TrackRef) -> bool {
        self.with_track(track, |_| ()).is_some()
    }

    fn track_name(&self, track: &TrackRef) -> Option<String> {
        self.with_track(track, |t| t.name.clone())
    }

    fn track_color(&self, track: &TrackRef) -> Option<u32> {
        self.with_track(track, |t| t.color)
    }

    fn set_track_color(&self, track: &TrackRef, color: u32) {
        self.with_track_mut(track, |t| t.color = color);
    }

    fn selected_track(&self) -> Option<TrackRef> {
        self.state
            .borrow()
            .selected
            .as_ref()
            .map(|g| TrackRef::new(g.clone()))
    }

    fn select_track(&self, track: &TrackRef) {
        let mut state = self.state.borrow_mut();
        if state.tracks.iter().any(|t| t.guid == track.as_str()) {
            state.selected = Some(track.as_str().to_string());
        }
    }

    fn track_param(&self, track: &TrackRef, param: TrackParam) -> Option<f64> {
        self.with_track(track, |t| t.params.get(&param).copied())
            .flatten()
    }

    fn set_track_param(&self, track: &TrackRef, param: TrackParam, value: f64) {
        trace!("mock host: set {:?} = {} on {}", param, value, track);
        self.with_track_mut(track, |t| {
            t.params.insert(param, value);
        });
    }

    fn fx_count(&self, track: &TrackRef) -> usize {
        self.with_track(track, |t| t.fx.len()).unwrap_or(0)
    }

    fn fx_name(&self, track: &TrackRef, slot: usize) -> Option<String> {
        self.with_track(track, |t| t.fx.get(slot).map(|fx| fx.name.clone()))
            .flatten()
    }

    fn fx_guid(&self, track: &TrackRef, slot: usize) -> Option<FxRef> {
        self.with_track(track, |t| t.fx.get(slot).map(|fx| FxRef::new(fx.guid.clone())))
            .flatten()
    }

    fn fx_param(&self, track: &TrackRef, slot: usize, param: usize) -> Option<f64> {
        self.with_track(track, |t| {
            t.fx.get(slot).and_then(|fx| fx.params.get(param).copied())
        })
        .flatten()
    }

    fn set_fx_param(&self, track: &TrackRef, slot: usize, param: usize, value: f64) {
        self.with_track_mut(track, |t| {
            if let Some(p) = t.fx.get_mut(slot).and_then(|fx| fx.params.get_mut(param)) {
                *p = value;
            }
        });
    }

    fn open_fx_window(&self, track: &TrackRef, slot: usize) {
        let mut state = self.state.borrow_mut();
        let entry = (track.as_str().to_string(), slot);
        if !state.open_windows.contains(&entry) {
            state.open_windows.push(entry);
        }
    }

    fn close_fx_window(&self, track: &TrackRef, slot: usize) {
        let mut state = self.state.borrow_mut();
        state
            .open_windows
            .retain(|(g, s)| !(g == track.as_str() && *s == slot));
    }

    fn transport(&self) -> TransportState {
        self.state.borrow().transport
    }

    fn transport_command(&self, cmd: TransportCommand) {
        let mut state = self.state.borrow_mut();
        match cmd {
            TransportCommand::Play => state.transport.playing = true,
            TransportCommand::Stop => {
                state.transport.playing = false;
                state.transport.recording = false;
            }
            TransportCommand::Record => {
                state.transport.recording = true;
                state.transport.playing = true;
            }
            TransportCommand::Rewind | TransportCommand::FastForward => {}
            TransportCommand::ToggleRepeat => {
                state.transport.repeat_enabled = !state.transport.repeat_enabled;
            }
        }
    }

    fn global_automation_override(&self) -> i32 {
        self.state.borrow().automation_override
    }

    fn set_global_automation_override(&self, mode: i32) {
        self.state.borrow_mut().automation_override = mode;
    }

    fn ext_state(&self, section: &str, key: &str) -> Option<String> {
        self.state
            .borrow()
            .ext
            .get(&(section.to_string(), key.to_string()))
            .cloned()
    }

    fn set_ext_state(&self, section: &str, key: &str, value: &str) {
        self.state
            .borrow_mut()
            .ext
            .insert((section.to_string(), key.to_string()), value.to_string());
    }

    fn delete_ext_state(&self, section: &str, key: &str) {
        self.state
            .borrow_mut()
            .ext
            .remove(&(section.to_string(), key.to_string()));
    }
}

/// Feedback sink that records every write, for assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub writes: Vec<(String, crate::widget::DisplayMode, crate::widget::FeedbackValue)>,
}

impl crate::widget::FeedbackSink for RecordingSink {
    fn set_value(
        &mut self,
        widget: &str,
        mode: crate::widget::DisplayMode,
        value: crate::widget::FeedbackValue,
    ) {
        self.writes.push((widget.to_string(), mode, value));
    }
}

impl RecordingSink {
    /// Writes addressed to one widget role.
    pub fn for_widget(&self, role: &str) -> Vec<&crate::widget::FeedbackValue> {
        self.writes
            .iter()
            .filter(|(w, _, _)| w == role)
            .map(|(_, _, v)| v)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_lifecycle() {
        let host = MockHost::with_tracks(3);
        let tracks = host.visible_tracks(ViewMode::Mixer);
        assert_eq!(tracks.len(), 3);

        assert!(host.is_track_valid(&tracks[1]));
        host.remove_track(&tracks[1]);
        assert!(!host.is_track_valid(&tracks[1]));
        assert_eq!(host.visible_tracks(ViewMode::Mixer).len(), 2);
    }

    #[test]
    fn test_visibility_filter() {
        let host = MockHost::with_tracks(2);
        let tracks = host.visible_tracks(ViewMode::Mixer);
        host.set_track_visible(&tracks[0], false, true);

        assert_eq!(host.visible_tracks(ViewMode::Mixer).len(), 1);
        assert_eq!(host.visible_tracks(ViewMode::Arrange).len(), 2);
    }

    #[test]
    fn test_fx_chain() {
        let host = MockHost::with_tracks(1);
        let track = &host.visible_tracks(ViewMode::Mixer)[0];

        host.add_fx(track, "EQ", 4);
        let slot = host.add_fx(track, "Comp", 2);
        assert_eq!(slot, 1);
        assert_eq!(host.fx_name(track, 0).as_deref(), Some("EQ"));

        host.remove_fx(track, 0);
        assert_eq!(host.fx_name(track, 0).as_deref(), Some("Comp"));
        assert_eq!(host.fx_count(track), 1);
    }

    #[test]
    fn test_ext_state_round_trip() {
        let host = MockHost::new();
        host.set_ext_state("Mixer", "Channel3", "{track-7}");
        assert_eq!(host.ext_state("Mixer", "Channel3").as_deref(), Some("{track-7}"));
        host.delete_ext_state("Mixer", "Channel3");
        assert_eq!(host.ext_state("Mixer", "Channel3"), None);
    }
}
