//! Binding/dispatch engine for control surfaces
//!
//! Maps physical control-surface widgets (faders, encoders, buttons,
//! displays) onto a multi-track audio host: resolves which action is bound
//! to a widget at any moment (per page, modifier chord, Track/FX mode and
//! bank position), keeps motorized/visual feedback in sync with host state,
//! and drives the bank/page/modifier state machine.
//!
//! The engine is synchronous and tick-driven: the host integration layer
//! calls [`manager::Manager::run_cycle`] from its own processing callback.
//! Wire transport, host bindings and config-file parsing live outside this
//! crate behind the [`host::HostFacade`], [`widget::FeedbackSink`] and
//! [`config::BindingTable`] seams.

pub mod action;
pub mod bank;
pub mod config;
pub mod context;
pub mod convert;
pub mod host;
pub mod manager;
pub mod modifiers;
pub mod page;
pub mod widget;

pub use action::{ActionContext, ActionKind, ActionRegistry, ActionTarget, EngineCommand};
pub use config::BindingTable;
pub use host::{FxRef, HostFacade, TrackRef};
pub use manager::{EngineConfig, Manager};
pub use widget::{DisplayMode, FeedbackSink, FeedbackValue, WidgetEvent, WidgetId};
