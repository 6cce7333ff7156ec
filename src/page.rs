//! Page orchestration: surfaces, mode/modifier broadcast, FX mapping
//!
//! A page is one complete, independently switchable mapping configuration.
//! It owns its surfaces and widgets, the `ActionContext` arena, one
//! modifier state, one track navigator, and the open-FX-window list for
//! the currently mapped track.

use crate::action::{ActionContext, EngineCommand};
use crate::bank::{BankableChannel, TrackNavigator};
use crate::context::{BindingId, ModeSlot, WidgetContext, TRACK_MODE};
use crate::host::{HostFacade, TrackRef, ViewMode};
use crate::modifiers::{Modifier, ModifierChord, ModifierState};
use crate::widget::{FeedbackSink, Widget, WidgetId};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// A named collection of widgets (one physical device or device section).
#[derive(Debug)]
pub struct Surface {
    name: String,
    widgets: Vec<Widget>,
}

impl Surface {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }
}

/// One complete mapping configuration.
#[derive(Debug)]
pub struct Page {
    name: String,
    surfaces: Vec<Surface>,
    roles: HashMap<String, WidgetId>,
    contexts: HashMap<WidgetId, WidgetContext>,
    bindings: Vec<ActionContext>,
    modifiers: ModifierState,
    navigator: TrackNavigator,
    /// Interned mode tags; slot 0 is Track, the rest are FX names.
    mode_names: Vec<String>,
    /// FX slot resolved for each FX mode on the mapped track.
    fx_slots: HashMap<ModeSlot, usize>,
    /// Set when the mapped track's FX chain mutated; FX-mode bindings are
    /// inert until the next map pass.
    fx_stale: bool,
    open_fx_windows: Vec<(TrackRef, usize)>,
    show_fx_windows: bool,
    follow_selection: bool,
    mapped_track: Option<TrackRef>,
}

impl Page {
    pub fn new(name: impl Into<String>, view: ViewMode, show_fx_windows: bool) -> Self {
        let name = name.into();
        let navigator = TrackNavigator::new(name.clone(), view, Vec::new());
        Self {
            name,
            surfaces: Vec::new(),
            roles: HashMap::new(),
            contexts: HashMap::new(),
            bindings: Vec::new(),
            modifiers: ModifierState::new(),
            navigator,
            mode_names: vec!["Track".to_string()],
            fx_slots: HashMap::new(),
            fx_stale: false,
            open_fx_windows: Vec::new(),
            show_fx_windows,
            follow_selection: true,
            mapped_track: None,
        }
    }

    /// Whether this page remaps to the host's selected track when the
    /// selection moves. On by default.
    pub fn follow_selection(&self) -> bool {
        self.follow_selection
    }

    pub fn set_follow_selection(&mut self, follow: bool) {
        self.follow_selection = follow;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn navigator(&self) -> &TrackNavigator {
        &self.navigator
    }

    pub fn modifiers(&self) -> &ModifierState {
        &self.modifiers
    }

    pub fn widget(&self, id: WidgetId) -> &Widget {
        &self.surfaces[id.surface].widgets[id.widget]
    }

    pub fn widget_by_role(&self, role: &str) -> Option<WidgetId> {
        self.roles.get(role).copied()
    }

    pub fn context(&self, id: WidgetId) -> Option<&WidgetContext> {
        self.contexts.get(&id)
    }

    // ---- construction (used by the assembler and tests) ----

    pub fn add_surface(&mut self, name: impl Into<String>) -> usize {
        self.surfaces.push(Surface {
            name: name.into(),
            widgets: Vec::new(),
        });
        self.surfaces.len() - 1
    }

    /// Add a widget to a surface and register its role. Returns None if
    /// the role is already taken on this page.
    pub fn add_widget(&mut self, surface: usize, widget: Widget) -> Option<WidgetId> {
        let role = widget.role().to_string();
        if self.roles.contains_key(&role) {
            warn!("duplicate widget role '{}' on page '{}'", role, self.name);
            return None;
        }
        let widgets = &mut self.surfaces[surface].widgets;
        widgets.push(widget);
        let id = WidgetId {
            surface,
            widget: widgets.len() - 1,
        };
        let modifier_role = Modifier::parse(&role);
        self.contexts.insert(id, WidgetContext::new(modifier_role));
        self.roles.insert(role, id);
        Some(id)
    }

    /// Intern a mode name, returning its slot (Track is always slot 0).
    pub fn intern_mode(&mut self, name: &str) -> ModeSlot {
        if let Some(pos) = self.mode_names.iter().position(|m| m == name) {
            return pos as ModeSlot;
        }
        self.mode_names.push(name.to_string());
        (self.mode_names.len() - 1) as ModeSlot
    }

    pub fn mode_slot(&self, name: &str) -> Option<ModeSlot> {
        self.mode_names
            .iter()
            .position(|m| m == name)
            .map(|p| p as ModeSlot)
    }

    /// Store a binding in the arena and register it in its widget's table.
    pub fn add_binding(&mut self, chord: ModifierChord, binding: ActionContext) -> BindingId {
        let id = self.bindings.len();
        let widget = binding.widget();
        let mode = binding.mode();
        self.bindings.push(binding);
        if let Some(ctx) = self.contexts.get_mut(&widget) {
            ctx.insert(mode, chord, id);
        }
        id
    }

    /// Install the bank channels (replaces the navigator's slot list).
    pub fn set_channels(&mut self, channels: Vec<BankableChannel>) {
        let view = self.navigator.view();
        self.navigator = TrackNavigator::new(self.name.clone(), view, channels);
    }

    // ---- runtime ----

    /// Dispatch one widget event to the currently active binding list.
    /// Structural effects come back as commands; nothing is applied here.
    pub fn dispatch(
        &self,
        host: &dyn HostFacade,
        role: &str,
        value: f64,
    ) -> Vec<EngineCommand> {
        let Some(id) = self.widget_by_role(role) else {
            trace!("no widget with role '{}' on page '{}'", role, self.name);
            return Vec::new();
        };
        let Some(ctx) = self.contexts.get(&id) else {
            return Vec::new();
        };
        if self.fx_stale && ctx.mode() != TRACK_MODE {
            // FX chain mutated under us; bindings are inert until remap
            return Vec::new();
        }
        let widget = self.widget(id);
        let mut commands = Vec::new();
        for &binding in ctx.active() {
            if let Some(cmd) = self.bindings[binding].do_action(host, widget, value) {
                commands.push(cmd);
            }
        }
        commands
    }

    /// Set a modifier flag; on change, every widget context recomputes its
    /// current selection for the new chord.
    pub fn set_modifier(&mut self, modifier: Modifier, held: bool) {
        if self.modifiers.set(modifier, held) {
            let chord = self.modifiers.chord();
            debug!("page '{}' modifiers -> [{}]", self.name, chord);
            for ctx in self.contexts.values_mut() {
                ctx.on_modifiers(chord);
            }
        }
    }

    /// Push host-state changes to every widget's feedback sink.
    pub fn update_feedback(&mut self, host: &dyn HostFacade, sink: &mut dyn FeedbackSink) {
        let chord = self.modifiers.chord();
        let Page {
            surfaces,
            contexts,
            bindings,
            fx_stale,
            ..
        } = self;
        for (sidx, surface) in surfaces.iter_mut().enumerate() {
            for (widx, widget) in surface.widgets.iter_mut().enumerate() {
                let id = WidgetId {
                    surface: sidx,
                    widget: widx,
                };
                let Some(ctx) = contexts.get(&id) else {
                    continue;
                };
                let stale = *fx_stale && ctx.mode() != TRACK_MODE;
                for &binding in ctx.active() {
                    let binding = &bindings[binding];
                    if stale {
                        binding.clear_feedback(widget, sink);
                    } else {
                        binding.request_update(host, widget, chord, sink);
                    }
                }
            }
        }
    }

    /// Drop every widget's cached value so the next feedback pass resends
    /// fresh state.
    pub fn reset_feedback(&mut self) {
        for surface in &mut self.surfaces {
            for widget in &mut surface.widgets {
                widget.reset_cache();
            }
        }
    }

    /// Copy the navigator's slot layout onto the channel-strip widgets.
    fn apply_bank_layout(&mut self) {
        let Page {
            surfaces, navigator, ..
        } = self;
        for channel in navigator.channels() {
            for &id in channel.widgets() {
                surfaces[id.surface].widgets[id.widget].set_track(channel.track().cloned());
            }
        }
    }

    /// Reload persisted pins from the host's extended state.
    pub fn restore_pins(&mut self, host: &dyn HostFacade) {
        self.navigator.restore_pins(host);
    }

    /// Scroll the bank and apply the resulting layout.
    pub fn adjust_bank(&mut self, host: &dyn HostFacade, stride: isize) {
        self.navigator.adjust_bank(host, stride);
        self.navigator.refresh_layout(host);
        self.apply_bank_layout();
    }

    /// Toggle the pin on the channel owning `widget`, then relayout.
    pub fn toggle_pin(&mut self, host: &dyn HostFacade, widget: WidgetId) {
        let Some(slot) = self.navigator.channel_for_widget(widget) else {
            trace!("pin request from widget outside any channel strip");
            return;
        };
        self.navigator.toggle_pin(host, slot);
        self.navigator.refresh_layout(host);
        self.apply_bank_layout();
    }

    /// React to a host track-list change: relayout only when the
    /// navigator reports drift.
    pub fn on_track_list_changed(&mut self, host: &dyn HostFacade) -> bool {
        if self.navigator.track_list_changed(host) {
            self.navigator.refresh_layout(host);
            self.apply_bank_layout();
            true
        } else {
            false
        }
    }

    /// Bind `track` to the selection-following widgets and resolve every
    /// statically named FX mode against its FX chain. Previously tracked
    /// FX windows are always closed and cleared before re-registering.
    pub fn map_track_and_fx_to_widgets(&mut self, host: &dyn HostFacade, track: &TrackRef) {
        for (t, slot) in self.open_fx_windows.drain(..) {
            host.close_fx_window(&t, slot);
        }
        self.fx_slots.clear();
        self.fx_stale = false;

        let Page {
            surfaces,
            contexts,
            bindings,
            mode_names,
            fx_slots,
            open_fx_windows,
            ..
        } = self;

        // Widgets with FX-mode bindings follow the selected track and
        // start back in Track mode until an FX match claims them.
        for (id, ctx) in contexts.iter_mut() {
            if ctx.has_fx_modes() {
                surfaces[id.surface].widgets[id.widget].set_track(Some(track.clone()));
                ctx.set_mode(TRACK_MODE);
            }
        }

        for slot in 0..host.fx_count(track) {
            let Some(name) = host.fx_name(track, slot) else {
                continue;
            };
            let Some(mode) = mode_names
                .iter()
                .position(|m| *m == name)
                .map(|p| p as ModeSlot)
            else {
                continue;
            };
            if mode == TRACK_MODE {
                continue;
            }
            if fx_slots.contains_key(&mode) {
                debug!(
                    "duplicate FX name '{}' at slot {}, first instance wins",
                    name, slot
                );
                continue;
            }
            fx_slots.insert(mode, slot);
            for binding in bindings.iter_mut() {
                if binding.mode() == mode {
                    binding.set_fx_slot(slot);
                }
            }
            for ctx in contexts.values_mut() {
                if ctx.has_mode(mode) && ctx.mode() == TRACK_MODE {
                    ctx.set_mode(mode);
                }
            }
            open_fx_windows.push((track.clone(), slot));
        }

        if self.show_fx_windows {
            for (t, slot) in &self.open_fx_windows {
                host.open_fx_window(t, *slot);
            }
        }
        self.mapped_track = Some(track.clone());
        debug!(
            "page '{}': mapped track {} with {} FX mode(s)",
            self.name,
            track,
            self.fx_slots.len()
        );
    }

    /// The mapped track's FX chain mutated: slot indices are unreliable
    /// until the next map pass.
    pub fn track_fx_list_changed(&mut self, track: &TrackRef) {
        if self.mapped_track.as_ref() == Some(track) {
            self.fx_slots.clear();
            self.fx_stale = true;
        }
    }

    /// Bring the page up as the active page: resync feedback, rebuild the
    /// bank layout and remap the selected track.
    pub fn activate(&mut self, host: &dyn HostFacade) {
        self.reset_feedback();
        self.navigator.refresh_layout(host);
        self.apply_bank_layout();
        if let Some(track) = host.selected_track() {
            self.map_track_and_fx_to_widgets(host, &track);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, ActionTarget};
    use crate::host::mock::{MockHost, RecordingSink};
    use crate::host::TrackParam;
    use crate::widget::FeedbackValue;

    /// Page with one surface: Fader1 (volume, plus Shift-variant pan) and
    /// Knob1 (track pan; "EQ"-mode FX param 1).
    fn test_page(host: &MockHost) -> Page {
        let mut page = Page::new("Mixer", ViewMode::Mixer, false);
        let s = page.add_surface("main");
        let fader = page.add_widget(s, Widget::new("Fader1")).unwrap();
        let knob = page.add_widget(s, Widget::new("Knob1")).unwrap();
        let shift = page.add_widget(s, Widget::new("Shift")).unwrap();

        page.add_binding(
            ModifierChord::NONE,
            ActionContext::new(ActionKind::TrackVolume, fader, TRACK_MODE, ActionTarget::Track, false),
        );
        page.add_binding(
            ModifierChord::NONE.with(Modifier::Shift),
            ActionContext::new(ActionKind::TrackPan, fader, TRACK_MODE, ActionTarget::Track, false),
        );
        page.add_binding(
            ModifierChord::NONE,
            ActionContext::new(ActionKind::TrackPan, knob, TRACK_MODE, ActionTarget::Track, false),
        );
        let eq = page.intern_mode("EQ");
        page.add_binding(
            ModifierChord::NONE,
            ActionContext::new(
                ActionKind::FxParam,
                knob,
                eq,
                ActionTarget::Fx { slot: 0, param: 1 },
                false,
            ),
        );
        page.add_binding(
            ModifierChord::NONE,
            ActionContext::new(
                ActionKind::Modifier(Modifier::Shift),
                shift,
                TRACK_MODE,
                ActionTarget::Global,
                false,
            ),
        );

        // One-slot channel strip owning Fader1
        page.set_channels(vec![BankableChannel::new(vec![fader])]);
        page.navigator.refresh_layout(host);
        page.apply_bank_layout();
        page
    }

    #[test]
    fn test_modifier_chord_rebinds_fader() {
        let host = MockHost::with_tracks(2);
        let track = host.visible_tracks(ViewMode::Mixer)[0].clone();
        let mut page = test_page(&host);

        page.dispatch(&host, "Fader1", 1.0);
        assert!(host.track_param(&track, TrackParam::Volume).unwrap() > 1.0);

        page.set_modifier(Modifier::Shift, true);
        page.dispatch(&host, "Fader1", 1.0);
        assert_eq!(host.track_param(&track, TrackParam::Pan), Some(1.0));

        // Releasing shift restores the volume binding
        page.set_modifier(Modifier::Shift, false);
        page.dispatch(&host, "Fader1", 0.715);
        let vol = host.track_param(&track, TrackParam::Volume).unwrap();
        assert!((vol - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_modifier_widget_is_isolated() {
        let host = MockHost::with_tracks(1);
        let mut page = test_page(&host);
        let shift = page.widget_by_role("Shift").unwrap();

        let before: Vec<_> = page.context(shift).unwrap().active().to_vec();
        page.set_modifier(Modifier::Shift, true);
        let after: Vec<_> = page.context(shift).unwrap().active().to_vec();
        assert_eq!(before, after);
    }

    #[test]
    fn test_fx_mapping_scenario() {
        let host = MockHost::with_tracks(1);
        let track = host.visible_tracks(ViewMode::Mixer)[0].clone();
        host.add_fx(&track, "Gate", 2);
        host.add_fx(&track, "Comp", 2);
        host.add_fx(&track, "EQ", 4);

        let mut page = test_page(&host);
        page.map_track_and_fx_to_widgets(&host, &track);

        let knob = page.widget_by_role("Knob1").unwrap();
        let eq = page.mode_slot("EQ").unwrap();
        assert_eq!(page.context(knob).unwrap().mode(), eq);

        // Slot index was rewritten to the EQ's position
        page.dispatch(&host, "Knob1", 0.8);
        assert_eq!(host.fx_param(&track, 2, 1), Some(0.8));

        // FX removed: dispatch is a no-op until remap
        host.remove_fx(&track, 2);
        page.track_fx_list_changed(&track);
        page.dispatch(&host, "Knob1", 0.3);
        assert_eq!(host.fx_param(&track, 0, 1), Some(0.0));
        assert_eq!(host.fx_param(&track, 1, 1), Some(0.0));

        // Remap drops the widget back to Track mode
        page.map_track_and_fx_to_widgets(&host, &track);
        assert_eq!(page.context(knob).unwrap().mode(), TRACK_MODE);
    }

    #[test]
    fn test_fx_windows_closed_before_reregister() {
        let host = MockHost::with_tracks(2);
        let tracks = host.visible_tracks(ViewMode::Mixer);
        host.add_fx(&tracks[0], "EQ", 4);
        host.add_fx(&tracks[1], "EQ", 4);

        let mut page = Page::new("FX", ViewMode::Mixer, true);
        let s = page.add_surface("main");
        let knob = page.add_widget(s, Widget::new("Knob1")).unwrap();
        let eq = page.intern_mode("EQ");
        page.add_binding(
            ModifierChord::NONE,
            ActionContext::new(
                ActionKind::FxParam,
                knob,
                eq,
                ActionTarget::Fx { slot: 0, param: 0 },
                false,
            ),
        );

        page.map_track_and_fx_to_widgets(&host, &tracks[0]);
        assert_eq!(host.open_windows(), vec![(tracks[0].clone(), 0)]);

        page.map_track_and_fx_to_widgets(&host, &tracks[1]);
        assert_eq!(host.open_windows(), vec![(tracks[1].clone(), 0)]);
    }

    #[test]
    fn test_duplicate_fx_names_first_wins() {
        let host = MockHost::with_tracks(1);
        let track = host.visible_tracks(ViewMode::Mixer)[0].clone();
        host.add_fx(&track, "EQ", 4);
        host.add_fx(&track, "EQ", 4);

        let mut page = test_page(&host);
        page.map_track_and_fx_to_widgets(&host, &track);

        page.dispatch(&host, "Knob1", 0.9);
        assert_eq!(host.fx_param(&track, 0, 1), Some(0.9));
        assert_eq!(host.fx_param(&track, 1, 1), Some(0.0));
    }

    #[test]
    fn test_feedback_resync_after_activate() {
        let host = MockHost::with_tracks(1);
        let mut page = test_page(&host);
        let mut sink = RecordingSink::default();

        page.update_feedback(&host, &mut sink);
        let first = sink.for_widget("Fader1").len();
        assert_eq!(first, 1);
        assert_eq!(
            sink.for_widget("Fader1")[0],
            &FeedbackValue::Number(0.715)
        );

        // Unchanged host state: no second write
        page.update_feedback(&host, &mut sink);
        assert_eq!(sink.for_widget("Fader1").len(), 1);

        // Activation resets caches, forcing a fresh write
        page.activate(&host);
        page.update_feedback(&host, &mut sink);
        assert_eq!(sink.for_widget("Fader1").len(), 2);
    }
}
