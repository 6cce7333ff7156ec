//! Widgets: addressable logical controls and their feedback cache
//!
//! A widget is one logical control (fader, button, encoder, display) on a
//! surface, identified by its role name. It carries the track it is
//! currently bound to and the last value pushed to the feedback sink, so
//! unchanged host state never produces a second hardware write.

use crate::host::TrackRef;

/// Index of a widget within a page: surface slot + widget slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId {
    pub surface: usize,
    pub widget: usize,
}

/// Value pushed to the feedback sink: numeric (fader/LED) or text (display).
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackValue {
    Number(f64),
    Text(String),
}

/// How the transport layer should render a feedback value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Continuous position (motor fader, encoder ring).
    Position,
    /// Binary indicator (button LED).
    OnOff,
    /// Text display segment.
    Text,
    /// Color swatch (scribble strip color).
    Color,
}

/// Last value observed by a widget, with an explicit unset sentinel so the
/// first update after a resync always reaches the hardware.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CachedValue {
    #[default]
    Unset,
    Number(f64),
    Text(String),
}

/// The engine's only outbound call: the transport layer maps this onto
/// hardware-specific signaling.
pub trait FeedbackSink {
    fn set_value(&mut self, widget: &str, mode: DisplayMode, value: FeedbackValue);
}

/// A normalized input event from the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetEvent {
    pub role: String,
    pub value: f64,
}

impl WidgetEvent {
    pub fn new(role: impl Into<String>, value: f64) -> Self {
        Self {
            role: role.into(),
            value,
        }
    }
}

/// One logical control on a surface.
#[derive(Debug)]
pub struct Widget {
    role: String,
    track: Option<TrackRef>,
    cached: CachedValue,
    repeat_ms: Option<u64>,
}

impl Widget {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            track: None,
            cached: CachedValue::Unset,
            repeat_ms: None,
        }
    }

    pub fn with_repeat(mut self, repeat_ms: Option<u64>) -> Self {
        self.repeat_ms = repeat_ms;
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn track(&self) -> Option<&TrackRef> {
        self.track.as_ref()
    }

    pub fn set_track(&mut self, track: Option<TrackRef>) {
        self.track = track;
    }

    /// Press-and-hold repeat interval, if this widget is a repeat widget.
    pub fn repeat_ms(&self) -> Option<u64> {
        self.repeat_ms
    }

    /// Drop the cached value so the next update is always pushed.
    pub fn reset_cache(&mut self) {
        self.cached = CachedValue::Unset;
    }

    /// Push `value` to the sink only if it differs from the cache.
    /// Returns true if a write was issued.
    pub fn push_if_changed(
        &mut self,
        sink: &mut dyn FeedbackSink,
        mode: DisplayMode,
        value: FeedbackValue,
    ) -> bool {
        let unchanged = match (&self.cached, &value) {
            (CachedValue::Number(a), FeedbackValue::Number(b)) => a == b,
            (CachedValue::Text(a), FeedbackValue::Text(b)) => a == b,
            _ => false,
        };
        if unchanged {
            return false;
        }
        self.cached = match &value {
            FeedbackValue::Number(n) => CachedValue::Number(*n),
            FeedbackValue::Text(t) => CachedValue::Text(t.clone()),
        };
        sink.set_value(&self.role, mode, value);
        true
    }
}

/// Sink that discards all feedback. Useful when a transport layer only
/// consumes input events.
#[derive(Debug, Default)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn set_value(&mut self, _widget: &str, _mode: DisplayMode, _value: FeedbackValue) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::RecordingSink;

    #[test]
    fn test_push_if_changed_idempotent() {
        let mut sink = RecordingSink::default();
        let mut w = Widget::new("Fader1");

        assert!(w.push_if_changed(&mut sink, DisplayMode::Position, FeedbackValue::Number(0.5)));
        assert!(!w.push_if_changed(&mut sink, DisplayMode::Position, FeedbackValue::Number(0.5)));
        assert_eq!(sink.writes.len(), 1);

        assert!(w.push_if_changed(&mut sink, DisplayMode::Position, FeedbackValue::Number(0.6)));
        assert_eq!(sink.writes.len(), 2);
    }

    #[test]
    fn test_reset_cache_forces_write() {
        let mut sink = RecordingSink::default();
        let mut w = Widget::new("Mute1");

        w.push_if_changed(&mut sink, DisplayMode::OnOff, FeedbackValue::Number(1.0));
        w.reset_cache();
        assert!(w.push_if_changed(&mut sink, DisplayMode::OnOff, FeedbackValue::Number(1.0)));
        assert_eq!(sink.writes.len(), 2);
    }

    #[test]
    fn test_text_and_number_caches_are_distinct() {
        let mut sink = RecordingSink::default();
        let mut w = Widget::new("Display1");

        assert!(w.push_if_changed(
            &mut sink,
            DisplayMode::Text,
            FeedbackValue::Text("Bass".into())
        ));
        assert!(!w.push_if_changed(
            &mut sink,
            DisplayMode::Text,
            FeedbackValue::Text("Bass".into())
        ));
        // Switching value class always writes
        assert!(w.push_if_changed(&mut sink, DisplayMode::Position, FeedbackValue::Number(0.0)));
    }
}
