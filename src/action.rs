//! Action model: stateless behaviors, concrete targets, dispatch contexts

mod context;
mod kinds;
mod registry;

pub use context::{ActionContext, ActionTarget};
pub use kinds::{ActionKind, EngineCommand, TargetShape};
pub use registry::ActionRegistry;
