//! Per-widget binding resolution: mode and modifier-chord selection
//!
//! Each (page, widget) pair owns one [`WidgetContext`]: the full
//! `(mode, chord) -> binding list` table populated at load time, plus the
//! key of the currently active list. Modifier or mode changes only swap
//! that key; resolution is a single hash lookup with no allocation, and an
//! unmapped combination resolves to a shared empty slice.

use crate::modifiers::{Modifier, ModifierChord};
use std::collections::HashMap;

/// Index into a page's `ActionContext` arena.
pub type BindingId = usize;

/// Interned mode tag. Slot 0 is always Track mode; higher slots are FX
/// names interned per page.
pub type ModeSlot = u16;

/// The Track mode every page starts in.
pub const TRACK_MODE: ModeSlot = 0;

/// Binding table and current selection for one widget on one page.
#[derive(Debug, Default)]
pub struct WidgetContext {
    table: HashMap<(ModeSlot, ModifierChord), Vec<BindingId>>,
    mode: ModeSlot,
    chord: ModifierChord,
    /// Set when this widget's role is itself a modifier key; such widgets
    /// always resolve with the empty chord so holding the key cannot
    /// rebind the key itself.
    modifier_role: Option<Modifier>,
}

impl WidgetContext {
    pub fn new(modifier_role: Option<Modifier>) -> Self {
        Self {
            modifier_role,
            ..Default::default()
        }
    }

    /// Add a binding to the list for `(mode, chord)`, preserving insertion
    /// order within the list.
    pub fn insert(&mut self, mode: ModeSlot, chord: ModifierChord, binding: BindingId) {
        self.table.entry((mode, chord)).or_default().push(binding);
    }

    /// The currently active binding list. Unmapped combinations are inert.
    pub fn active(&self) -> &[BindingId] {
        let chord = if self.modifier_role.is_some() {
            ModifierChord::NONE
        } else {
            self.chord
        };
        self.table
            .get(&(self.mode, chord))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Recompute the current selection for a new modifier chord.
    pub fn on_modifiers(&mut self, chord: ModifierChord) {
        self.chord = chord;
    }

    /// Switch between Track mode and a named-FX mode.
    pub fn set_mode(&mut self, mode: ModeSlot) {
        self.mode = mode;
    }

    pub fn mode(&self) -> ModeSlot {
        self.mode
    }

    pub fn modifier_role(&self) -> Option<Modifier> {
        self.modifier_role
    }

    /// Whether any bindings exist for `mode` under any chord.
    pub fn has_mode(&self, mode: ModeSlot) -> bool {
        self.table.keys().any(|(m, _)| *m == mode)
    }

    /// Whether this widget has bindings outside Track mode.
    pub fn has_fx_modes(&self) -> bool {
        self.table.keys().any(|(m, _)| *m != TRACK_MODE)
    }
}
