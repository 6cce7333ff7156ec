//! ActionContext: one action bound to a concrete target and widget
//!
//! Created once when the binding table is assembled and never mutated
//! afterwards, except for the FX slot index which the page rewrites in
//! place when a track's FX chain is rescanned. A context whose track is no
//! longer resolvable clears its widget's feedback and turns `do_action`
//! into a no-op.

use super::kinds::{ActionKind, EngineCommand};
use crate::context::ModeSlot;
use crate::convert;
use crate::host::{HostFacade, TrackParam, TrackRef, TransportCommand};
use crate::modifiers::ModifierChord;
use crate::widget::{FeedbackSink, FeedbackValue, Widget, WidgetId};
use tracing::trace;

/// Concrete target descriptor, carrying only the fields its kind needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionTarget {
    Global,
    /// Resolved from the widget's bound track at call time.
    Track,
    /// Track target plus an integer literal (automation mode, bank stride).
    TrackWithInt { value: i32 },
    /// Track target plus a string literal (page name).
    TrackWithString { value: String },
    /// FX parameter addressed by slot index within the track's chain. The
    /// slot is rewritten when the chain is rescanned; out-of-range slots
    /// resolve to no-ops.
    Fx { slot: usize, param: usize },
}

/// What a feedback query produced.
enum Feedback {
    /// Live value to push (subject to the widget's cache).
    Push(FeedbackValue),
    /// Target is gone; force the widget to a neutral state.
    Clear,
    /// This kind has no feedback at all.
    Skip,
}

/// An [`ActionKind`] bound to a target and a widget.
#[derive(Debug, Clone)]
pub struct ActionContext {
    action: ActionKind,
    widget: WidgetId,
    mode: ModeSlot,
    target: ActionTarget,
    invert: bool,
}

impl ActionContext {
    pub fn new(
        action: ActionKind,
        widget: WidgetId,
        mode: ModeSlot,
        target: ActionTarget,
        invert: bool,
    ) -> Self {
        Self {
            action,
            widget,
            mode,
            target,
            invert,
        }
    }

    pub fn action(&self) -> ActionKind {
        self.action
    }

    pub fn widget(&self) -> WidgetId {
        self.widget
    }

    pub fn mode(&self) -> ModeSlot {
        self.mode
    }

    pub fn fx_slot(&self) -> Option<usize> {
        match &self.target {
            ActionTarget::Fx { slot, .. } => Some(*slot),
            _ => None,
        }
    }

    /// Rewrite the FX slot index after a chain rescan.
    pub fn set_fx_slot(&mut self, new_slot: usize) {
        if let ActionTarget::Fx { slot, .. } = &mut self.target {
            *slot = new_slot;
        }
    }

    fn int_param(&self) -> i32 {
        match &self.target {
            ActionTarget::TrackWithInt { value } => *value,
            _ => 0,
        }
    }

    fn str_param(&self) -> &str {
        match &self.target {
            ActionTarget::TrackWithString { value } => value,
            _ => "",
        }
    }

    /// The widget's bound track, only if the host still knows it.
    fn live_track(&self, host: &dyn HostFacade, widget: &Widget) -> Option<TrackRef> {
        let track = widget.track()?;
        if host.is_track_valid(track) {
            Some(track.clone())
        } else {
            None
        }
    }

    /// Execute this binding for an incoming widget value. Inversion is
    /// applied before the action sees the value. Structural effects are
    /// returned as commands, never applied here.
    pub fn do_action(
        &self,
        host: &dyn HostFacade,
        widget: &Widget,
        value: f64,
    ) -> Option<EngineCommand> {
        let value = if self.invert { 1.0 - value } else { value };
        let pressed = value > 0.5;
        use ActionKind::*;

        match self.action {
            TrackVolume => {
                let track = self.live_track(host, widget)?;
                host.set_track_param(&track, TrackParam::Volume, convert::normalized_to_vol(value));
            }
            TrackPan => {
                let track = self.live_track(host, widget)?;
                host.set_track_param(&track, TrackParam::Pan, convert::normalized_to_pan(value));
            }
            TrackPanWidth => {
                let track = self.live_track(host, widget)?;
                host.set_track_param(&track, TrackParam::Width, convert::normalized_to_pan(value));
            }
            TrackMute => {
                let track = self.live_track(host, widget)?;
                host.set_track_param(&track, TrackParam::Mute, if pressed { 1.0 } else { 0.0 });
            }
            TrackSolo => {
                let track = self.live_track(host, widget)?;
                host.set_track_param(&track, TrackParam::Solo, if pressed { 1.0 } else { 0.0 });
            }
            TrackRecordArm => {
                let track = self.live_track(host, widget)?;
                host.set_track_param(&track, TrackParam::RecordArm, if pressed { 1.0 } else { 0.0 });
            }
            TrackSelect => {
                if pressed {
                    let track = self.live_track(host, widget)?;
                    host.select_track(&track);
                }
            }
            TrackAutomationMode => {
                if pressed {
                    let track = self.live_track(host, widget)?;
                    host.set_track_param(&track, TrackParam::AutomationMode, self.int_param() as f64);
                }
            }
            TrackNameDisplay | TrackVolumeDisplay | TrackPanDisplay | TrackColorDisplay => {
                // Displays are feedback-only
            }
            FxParam => {
                let track = self.live_track(host, widget)?;
                let ActionTarget::Fx { slot, param } = self.target else {
                    return None;
                };
                if slot >= host.fx_count(&track) {
                    trace!("stale FX slot {} on {}, ignoring", slot, track);
                    return None;
                }
                host.set_fx_param(&track, slot, param, value);
            }
            TransportPlay => {
                if pressed {
                    host.transport_command(TransportCommand::Play);
                }
            }
            TransportStop => {
                if pressed {
                    host.transport_command(TransportCommand::Stop);
                }
            }
            TransportRecord => {
                if pressed {
                    host.transport_command(TransportCommand::Record);
                }
            }
            TransportRewind => {
                if pressed {
                    host.transport_command(TransportCommand::Rewind);
                }
            }
            TransportFastForward => {
                if pressed {
                    host.transport_command(TransportCommand::FastForward);
                }
            }
            TransportRepeat => {
                if pressed {
                    host.transport_command(TransportCommand::ToggleRepeat);
                }
            }
            GlobalAutomationOverride => {
                if pressed {
                    host.set_global_automation_override(self.int_param());
                }
            }
            NextPage => {
                if pressed {
                    return Some(EngineCommand::NextPage);
                }
            }
            PrevPage => {
                if pressed {
                    return Some(EngineCommand::PrevPage);
                }
            }
            GoPage => {
                if pressed {
                    return Some(EngineCommand::GoPage(self.str_param().to_string()));
                }
            }
            BankScroll => {
                if pressed {
                    return Some(EngineCommand::BankScroll(self.int_param()));
                }
            }
            PinChannel => {
                if pressed {
                    return Some(EngineCommand::TogglePin(self.widget));
                }
            }
            Modifier(m) => {
                return Some(EngineCommand::SetModifier(m, value > 0.5));
            }
        }
        None
    }

    fn feedback(&self, host: &dyn HostFacade, widget: &Widget, chord: ModifierChord) -> Feedback {
        use ActionKind::*;

        // Track-addressed kinds share the dead-target rule: clear, don't
        // show stale values.
        let track = self.live_track(host, widget);
        let on_off = |on: bool| Feedback::Push(FeedbackValue::Number(if on { 1.0 } else { 0.0 }));

        match self.action {
            TrackVolume => match track
                .and_then(|t| host.track_param(&t, TrackParam::Volume))
            {
                Some(vol) => Feedback::Push(FeedbackValue::Number(convert::vol_to_normalized(vol))),
                None => Feedback::Clear,
            },
            TrackPan => match track.and_then(|t| host.track_param(&t, TrackParam::Pan)) {
                Some(pan) => Feedback::Push(FeedbackValue::Number(convert::pan_to_normalized(pan))),
                None => Feedback::Clear,
            },
            TrackPanWidth => match track.and_then(|t| host.track_param(&t, TrackParam::Width)) {
                Some(w) => Feedback::Push(FeedbackValue::Number(convert::pan_to_normalized(w))),
                None => Feedback::Clear,
            },
            TrackMute | TrackSolo | TrackRecordArm | TrackSelect => {
                let param = match self.action {
                    TrackMute => TrackParam::Mute,
                    TrackSolo => TrackParam::Solo,
                    TrackRecordArm => TrackParam::RecordArm,
                    _ => TrackParam::Selected,
                };
                match track.and_then(|t| host.track_param(&t, param)) {
                    Some(v) => on_off(v >= 0.5),
                    None => Feedback::Clear,
                }
            }
            TrackAutomationMode => {
                match track.and_then(|t| host.track_param(&t, TrackParam::AutomationMode)) {
                    Some(mode) => on_off(mode as i32 == self.int_param()),
                    None => Feedback::Clear,
                }
            }
            TrackNameDisplay => match track.and_then(|t| host.track_name(&t)) {
                Some(name) => Feedback::Push(FeedbackValue::Text(name)),
                None => Feedback::Clear,
            },
            TrackVolumeDisplay => match track
                .and_then(|t| host.track_param(&t, TrackParam::Volume))
            {
                Some(vol) => Feedback::Push(FeedbackValue::Text(convert::vol_to_string(vol))),
                None => Feedback::Clear,
            },
            TrackPanDisplay => match track.and_then(|t| host.track_param(&t, TrackParam::Pan)) {
                Some(pan) => Feedback::Push(FeedbackValue::Text(convert::pan_to_string(pan))),
                None => Feedback::Clear,
            },
            TrackColorDisplay => match track.and_then(|t| host.track_color(&t)) {
                Some(color) => Feedback::Push(FeedbackValue::Number(color as f64)),
                None => Feedback::Clear,
            },
            FxParam => {
                let ActionTarget::Fx { slot, param } = self.target else {
                    return Feedback::Clear;
                };
                match track.and_then(|t| host.fx_param(&t, slot, param)) {
                    Some(v) => Feedback::Push(FeedbackValue::Number(v)),
                    None => Feedback::Clear,
                }
            }
            TransportPlay => on_off(host.transport().playing),
            TransportStop => on_off(!host.transport().playing),
            TransportRecord => on_off(host.transport().recording),
            TransportRepeat => on_off(host.transport().repeat_enabled),
            TransportRewind | TransportFastForward => Feedback::Skip,
            GlobalAutomationOverride => on_off(host.global_automation_override() == self.int_param()),
            Modifier(m) => on_off(chord.contains(m)),
            NextPage | PrevPage | GoPage | BankScroll | PinChannel => Feedback::Skip,
        }
    }

    /// Force the widget to a neutral state (blank text, zero position).
    pub fn clear_feedback(&self, widget: &mut Widget, sink: &mut dyn FeedbackSink) {
        let mode = self.action.display_mode();
        let neutral = match mode {
            crate::widget::DisplayMode::Text => FeedbackValue::Text(String::new()),
            _ => FeedbackValue::Number(0.0),
        };
        widget.push_if_changed(sink, mode, neutral);
    }

    /// Compare host state against the widget's cache and push feedback if
    /// anything changed. Dead targets force a neutral value instead of
    /// leaving stale feedback on the surface.
    pub fn request_update(
        &self,
        host: &dyn HostFacade,
        widget: &mut Widget,
        chord: ModifierChord,
        sink: &mut dyn FeedbackSink,
    ) {
        match self.feedback(host, widget, chord) {
            Feedback::Push(value) => {
                let inverted = match value {
                    FeedbackValue::Number(n) if self.invert => FeedbackValue::Number(1.0 - n),
                    other => other,
                };
                widget.push_if_changed(sink, self.action.display_mode(), inverted);
            }
            Feedback::Clear => self.clear_feedback(widget, sink),
            Feedback::Skip => {}
        }
    }
}
