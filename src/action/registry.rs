//! Action registry: name -> kind lookups for binding-table assembly
//!
//! Built once at startup and handed to the manager inside `EngineConfig`;
//! never reached through ambient global state. The standard registry is
//! cached after first construction.

use super::kinds::ActionKind;
use crate::modifiers::Modifier;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static STANDARD: Lazy<ActionRegistry> = Lazy::new(ActionRegistry::build_standard);

/// Maps action names from the binding table to [`ActionKind`]s.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, ActionKind>,
}

impl ActionRegistry {
    /// The standard registry with every built-in action (cached after the
    /// first call).
    pub fn standard() -> Self {
        STANDARD.clone()
    }

    fn build_standard() -> Self {
        let mut reg = Self::default();
        use ActionKind::*;
        for (name, kind) in [
            ("TrackVolume", TrackVolume),
            ("TrackPan", TrackPan),
            ("TrackPanWidth", TrackPanWidth),
            ("TrackMute", TrackMute),
            ("TrackSolo", TrackSolo),
            ("TrackRecordArm", TrackRecordArm),
            ("TrackSelect", TrackSelect),
            ("TrackAutomationMode", TrackAutomationMode),
            ("TrackNameDisplay", TrackNameDisplay),
            ("TrackVolumeDisplay", TrackVolumeDisplay),
            ("TrackPanDisplay", TrackPanDisplay),
            ("TrackColorDisplay", TrackColorDisplay),
            ("FXParam", FxParam),
            ("TransportPlay", TransportPlay),
            ("TransportStop", TransportStop),
            ("TransportRecord", TransportRecord),
            ("TransportRewind", TransportRewind),
            ("TransportFastForward", TransportFastForward),
            ("TransportRepeat", TransportRepeat),
            ("GlobalAutomationOverride", GlobalAutomationOverride),
            ("NextPage", NextPage),
            ("PrevPage", PrevPage),
            ("GoPage", GoPage),
            ("TrackBank", BankScroll),
            ("PinChannel", PinChannel),
        ] {
            reg.register(name, kind);
        }
        // The ActionKind glob above shadows the Modifier type, so spell
        // out the path here.
        for m in crate::modifiers::Modifier::ALL {
            reg.register(m.as_str(), ActionKind::Modifier(m));
        }
        reg
    }

    /// Register (or override) an action name.
    pub fn register(&mut self, name: &str, kind: ActionKind) {
        self.actions.insert(name.to_string(), kind);
    }

    /// Look up an action by its table name.
    pub fn lookup(&self, name: &str) -> Option<ActionKind> {
        self.actions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
