//! Host facade: the engine's only view of the multi-track audio host
//!
//! Everything the engine knows about tracks, FX, transport and persistence
//! goes through [`HostFacade`]. Track and FX identities are opaque,
//! GUID-like strings owned by the host: they survive reordering and become
//! invalid on deletion. The engine only stores and compares them.

pub mod mock;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, opaque identifier for a host track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackRef(String);

impl TrackRef {
    pub fn new(id: impl Into<String>) -> Self {
        TrackRef(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable, opaque identifier for one FX instance on a track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FxRef(String);

impl FxRef {
    pub fn new(id: impl Into<String>) -> Self {
        FxRef(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-track parameters readable and writable through the facade.
///
/// Values are in host units: volume is amplitude (1.0 = 0 dB), pan and
/// width are -1.0..=1.0, the boolean-like parameters are 0.0/1.0, and
/// automation mode is an integer mode number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackParam {
    Volume,
    Pan,
    Width,
    Mute,
    Solo,
    RecordArm,
    Selected,
    AutomationMode,
}

/// Which visibility rule applies when enumerating tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Main mixer visibility flags.
    Mixer,
    /// Arrange-view visibility flags.
    Arrange,
}

/// Transport commands issued by transport actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Play,
    Stop,
    Record,
    Rewind,
    FastForward,
    ToggleRepeat,
}

/// Snapshot of the host transport, queried fresh every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportState {
    pub playing: bool,
    pub recording: bool,
    pub repeat_enabled: bool,
}

/// Abstract host integration layer.
///
/// All methods take `&self`; implementations use interior mutability. The
/// engine is single-threaded and never blocks inside these calls.
pub trait HostFacade {
    // Track enumeration and identity
    fn visible_tracks(&self, view: ViewMode) -> Vec<TrackRef>;
    fn is_track_visible(&self, track: &TrackRef, view: ViewMode) -> bool;
    fn is_track_valid(&self, track: &TrackRef) -> bool;
    fn track_name(&self, track: &TrackRef) -> Option<String>;
    fn track_color(&self, track: &TrackRef) -> Option<u32>;
    fn set_track_color(&self, track: &TrackRef, color: u32);
    fn selected_track(&self) -> Option<TrackRef>;
    fn select_track(&self, track: &TrackRef);

    // Track parameters
    fn track_param(&self, track: &TrackRef, param: TrackParam) -> Option<f64>;
    fn set_track_param(&self, track: &TrackRef, param: TrackParam, value: f64);

    // FX chain
    fn fx_count(&self, track: &TrackRef) -> usize;
    fn fx_name(&self, track: &TrackRef, slot: usize) -> Option<String>;
    fn fx_guid(&self, track: &TrackRef, slot: usize) -> Option<FxRef>;
    fn fx_param(&self, track: &TrackRef, slot: usize, param: usize) -> Option<f64>;
    fn set_fx_param(&self, track: &TrackRef, slot: usize, param: usize, value: f64);
    fn open_fx_window(&self, track: &TrackRef, slot: usize);
    fn close_fx_window(&self, track: &TrackRef, slot: usize);

    // Transport
    fn transport(&self) -> TransportState;
    fn transport_command(&self, cmd: TransportCommand);

    // Global automation override (-1 = none)
    fn global_automation_override(&self) -> i32;
    fn set_global_automation_override(&self, mode: i32);

    // Per-project extended-state persistence (pinned-channel records)
    fn ext_state(&self, section: &str, key: &str) -> Option<String>;
    fn set_ext_state(&self, section: &str, key: &str, value: &str);
    fn delete_ext_state(&self, section: &str, key: &str);
}
