//! Action kinds and the commands they raise against the engine
//!
//! An action kind is a stateless behavior descriptor: how to read a value
//! from the host facade and how to issue a command to it, for one semantic
//! parameter kind. Many contexts share the same kind.

use crate::modifiers::Modifier;
use crate::widget::{DisplayMode, WidgetId};

/// Every action behavior the engine knows. Target-specific data lives in
/// [`super::ActionTarget`], not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    // Track parameters
    TrackVolume,
    TrackPan,
    TrackPanWidth,
    TrackMute,
    TrackSolo,
    TrackRecordArm,
    TrackSelect,
    TrackAutomationMode,

    // Track displays
    TrackNameDisplay,
    TrackVolumeDisplay,
    TrackPanDisplay,
    TrackColorDisplay,

    // FX
    FxParam,

    // Transport
    TransportPlay,
    TransportStop,
    TransportRecord,
    TransportRewind,
    TransportFastForward,
    TransportRepeat,

    // Global
    GlobalAutomationOverride,

    // Engine navigation and structure
    NextPage,
    PrevPage,
    GoPage,
    BankScroll,
    PinChannel,
    Modifier(Modifier),
}

/// Which target descriptor shape a kind expects, used when assembling
/// binding tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetShape {
    Global,
    Track,
    TrackWithInt,
    TrackWithString,
    Fx,
}

impl ActionKind {
    /// The target shape this kind's descriptor must carry.
    pub fn shape(self) -> TargetShape {
        use ActionKind::*;
        match self {
            TrackVolume | TrackPan | TrackPanWidth | TrackMute | TrackSolo | TrackRecordArm
            | TrackSelect | TrackNameDisplay | TrackVolumeDisplay | TrackPanDisplay
            | TrackColorDisplay => TargetShape::Track,
            TrackAutomationMode => TargetShape::TrackWithInt,
            FxParam => TargetShape::Fx,
            GoPage => TargetShape::TrackWithString,
            BankScroll | GlobalAutomationOverride => TargetShape::TrackWithInt,
            TransportPlay | TransportStop | TransportRecord | TransportRewind
            | TransportFastForward | TransportRepeat | NextPage | PrevPage | PinChannel
            | Modifier(_) => TargetShape::Global,
        }
    }

    /// How feedback for this kind is rendered on the surface.
    pub fn display_mode(self) -> DisplayMode {
        use ActionKind::*;
        match self {
            TrackVolume | TrackPan | TrackPanWidth | FxParam => DisplayMode::Position,
            TrackNameDisplay | TrackVolumeDisplay | TrackPanDisplay => DisplayMode::Text,
            TrackColorDisplay => DisplayMode::Color,
            _ => DisplayMode::OnOff,
        }
    }
}

/// Structural effect raised by an action during dispatch.
///
/// Modifier changes are applied between events within the same cycle;
/// everything else mutates page structure and is queued until the end of
/// the current tick.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    NextPage,
    PrevPage,
    GoPage(String),
    BankScroll(i32),
    TogglePin(WidgetId),
    SetModifier(Modifier, bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        assert_eq!(ActionKind::TrackVolume.shape(), TargetShape::Track);
        assert_eq!(ActionKind::FxParam.shape(), TargetShape::Fx);
        assert_eq!(ActionKind::GoPage.shape(), TargetShape::TrackWithString);
        assert_eq!(ActionKind::BankScroll.shape(), TargetShape::TrackWithInt);
        assert_eq!(
            ActionKind::Modifier(Modifier::Shift).shape(),
            TargetShape::Global
        );
    }

    #[test]
    fn test_display_modes() {
        assert_eq!(ActionKind::TrackVolume.display_mode(), DisplayMode::Position);
        assert_eq!(ActionKind::TrackMute.display_mode(), DisplayMode::OnOff);
        assert_eq!(ActionKind::TrackNameDisplay.display_mode(), DisplayMode::Text);
        assert_eq!(ActionKind::TrackColorDisplay.display_mode(), DisplayMode::Color);
    }
}
