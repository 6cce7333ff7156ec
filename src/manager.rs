//! Engine manager: page list, tick loop and deferred structural commands
//!
//! The manager owns every assembled page and the active-page pointer. The
//! host integration layer feeds it widget events as they arrive and calls
//! [`Manager::run_cycle`] from its processing callback. Dispatch never
//! mutates engine structure directly: structural effects are queued as
//! [`EngineCommand`]s and applied between cycles, so a binding that
//! switches pages cannot pull the page out from under the event that
//! triggered it. Modifier changes are the exception and apply immediately.

mod assemble;

pub use assemble::BindingError;

use crate::action::{ActionRegistry, EngineCommand};
use crate::config::BindingTable;
use crate::host::{HostFacade, TrackRef};
use crate::page::Page;
use crate::widget::{FeedbackSink, WidgetEvent};
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Everything the manager needs to come up.
pub struct EngineConfig {
    pub table: BindingTable,
    pub registry: ActionRegistry,
}

impl EngineConfig {
    /// Config with the standard action registry.
    pub fn new(table: BindingTable) -> Self {
        Self {
            table,
            registry: ActionRegistry::standard(),
        }
    }

    pub fn with_registry(mut self, registry: ActionRegistry) -> Self {
        self.registry = registry;
        self
    }
}

/// A widget currently held down that re-fires on a wall-clock interval.
#[derive(Debug)]
struct HeldRepeat {
    value: f64,
    interval_ms: u64,
    last_fired: Instant,
}

/// Top-level engine state machine.
pub struct Manager {
    pages: Vec<Page>,
    active: usize,
    /// Held repeat widgets on the active page, by role.
    held: HashMap<String, HeldRepeat>,
    queue: Vec<EngineCommand>,
    last_selected: Option<TrackRef>,
}

impl Manager {
    /// Assemble pages from the config, restore persisted pins and bring up
    /// the initial page.
    pub fn new(config: EngineConfig, host: &dyn HostFacade) -> Result<Self> {
        let mut pages = assemble::assemble(&config.table, &config.registry)?;
        if pages.is_empty() {
            bail!("binding table produced no pages");
        }
        for page in &mut pages {
            page.restore_pins(host);
        }

        let active = match &config.table.initial_page {
            Some(name) => match pages.iter().position(|p| p.name() == name) {
                Some(idx) => idx,
                None => {
                    warn!("initial page '{}' not found, using first page", name);
                    0
                }
            },
            None => 0,
        };

        let mut manager = Self {
            pages,
            active,
            held: HashMap::new(),
            queue: Vec::new(),
            last_selected: host.selected_track(),
        };
        manager.pages[active].activate(host);
        info!(
            "engine up: {} page(s), active '{}'",
            manager.pages.len(),
            manager.pages[active].name()
        );
        Ok(manager)
    }

    pub fn active_page(&self) -> &Page {
        &self.pages[self.active]
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Feed one normalized input event into the active page.
    ///
    /// Modifier commands apply immediately so the next event in the same
    /// cycle already sees the new chord; everything else is queued until
    /// the end of the current cycle.
    pub fn on_widget_event(&mut self, host: &dyn HostFacade, event: &WidgetEvent) {
        trace!("event: {} = {}", event.role, event.value);
        self.track_repeat_state(event);
        let commands = self.pages[self.active].dispatch(host, &event.role, event.value);
        self.absorb_commands(commands);
    }

    /// One engine tick: re-fire held repeat widgets, apply queued
    /// structural commands, follow the host selection, then run the
    /// feedback pass for the active page.
    pub fn run_cycle(&mut self, host: &dyn HostFacade, sink: &mut dyn FeedbackSink) {
        self.fire_repeats(host);

        let queued = std::mem::take(&mut self.queue);
        for command in queued {
            self.apply_command(host, command);
        }

        self.follow_selection(host);
        self.pages[self.active].update_feedback(host, sink);
    }

    /// The host's track list changed (add, remove, reorder, visibility).
    pub fn notify_track_list_changed(&mut self, host: &dyn HostFacade) {
        for page in &mut self.pages {
            page.on_track_list_changed(host);
        }
    }

    /// The FX chain on `track` changed.
    pub fn notify_fx_list_changed(&mut self, track: &TrackRef) {
        for page in &mut self.pages {
            page.track_fx_list_changed(track);
        }
    }

    fn track_repeat_state(&mut self, event: &WidgetEvent) {
        let page = &self.pages[self.active];
        let Some(id) = page.widget_by_role(&event.role) else {
            return;
        };
        let Some(interval_ms) = page.widget(id).repeat_ms() else {
            return;
        };
        if event.value > 0.5 {
            self.held.insert(
                event.role.clone(),
                HeldRepeat {
                    value: event.value,
                    interval_ms,
                    last_fired: Instant::now(),
                },
            );
        } else {
            self.held.remove(&event.role);
        }
    }

    fn fire_repeats(&mut self, host: &dyn HostFacade) {
        let now = Instant::now();
        let due: Vec<(String, f64)> = self
            .held
            .iter_mut()
            .filter(|(_, h)| now.duration_since(h.last_fired).as_millis() as u64 >= h.interval_ms)
            .map(|(role, h)| {
                h.last_fired = now;
                (role.clone(), h.value)
            })
            .collect();
        for (role, value) in due {
            trace!("repeat fire: {}", role);
            let commands = self.pages[self.active].dispatch(host, &role, value);
            self.absorb_commands(commands);
        }
    }

    fn absorb_commands(&mut self, commands: Vec<EngineCommand>) {
        for command in commands {
            match command {
                EngineCommand::SetModifier(m, held) => {
                    self.pages[self.active].set_modifier(m, held);
                }
                other => self.queue.push(other),
            }
        }
    }

    fn apply_command(&mut self, host: &dyn HostFacade, command: EngineCommand) {
        match command {
            EngineCommand::NextPage => {
                self.goto_page(host, (self.active + 1) % self.pages.len());
            }
            EngineCommand::PrevPage => {
                let count = self.pages.len();
                self.goto_page(host, (self.active + count - 1) % count);
            }
            EngineCommand::GoPage(name) => match self.pages.iter().position(|p| p.name() == name) {
                Some(idx) => self.goto_page(host, idx),
                None => warn!("GoPage: no page named '{}'", name),
            },
            EngineCommand::BankScroll(stride) => {
                self.pages[self.active].adjust_bank(host, stride as isize);
            }
            EngineCommand::TogglePin(widget) => {
                self.pages[self.active].toggle_pin(host, widget);
            }
            EngineCommand::SetModifier(m, held) => {
                self.pages[self.active].set_modifier(m, held);
            }
        }
    }

    fn goto_page(&mut self, host: &dyn HostFacade, index: usize) {
        if index == self.active {
            return;
        }
        self.held.clear();
        self.active = index;
        self.pages[index].activate(host);
        debug!("active page -> '{}'", self.pages[index].name());
    }

    fn follow_selection(&mut self, host: &dyn HostFacade) {
        let selected = host.selected_track();
        if selected == self.last_selected {
            return;
        }
        self.last_selected = selected.clone();
        if !self.pages[self.active].follow_selection() {
            return;
        }
        if let Some(track) = selected {
            debug!("selection moved to {}, remapping", track);
            self.pages[self.active].map_track_and_fx_to_widgets(host, &track);
        }
    }
}
