//! Binding-table assembly: config descriptors -> runtime pages
//!
//! Assembly is lenient at the entry level: a malformed binding or channel
//! reference is logged and dropped, never fatal, so one typo in a large
//! table does not take the whole surface down. Only an empty page list is
//! an error.

use crate::action::{ActionContext, ActionRegistry, ActionTarget, TargetShape};
use crate::bank::BankableChannel;
use crate::config::{BindingDescriptor, BindingTable, PageDescriptor};
use crate::context::TRACK_MODE;
use crate::modifiers::ModifierChord;
use crate::page::Page;
use crate::widget::Widget;
use anyhow::{bail, Result};
use thiserror::Error;
use tracing::{info, warn};

/// Why a single binding descriptor was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum BindingError {
    #[error("unknown widget role '{0}'")]
    UnknownWidget(String),
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("unrecognized modifier '{0}'")]
    BadModifier(String),
    #[error("action '{action}' requires {expected}")]
    MissingParam {
        action: String,
        expected: &'static str,
    },
    #[error("FX parameter binding requires a mode")]
    MissingMode,
}

/// Build every page in the table.
pub fn assemble(table: &BindingTable, registry: &ActionRegistry) -> Result<Vec<Page>> {
    if table.pages.is_empty() {
        bail!("binding table declares no pages");
    }
    Ok(table
        .pages
        .iter()
        .map(|desc| assemble_page(desc, registry))
        .collect())
}

fn assemble_page(desc: &PageDescriptor, registry: &ActionRegistry) -> Page {
    let mut page = Page::new(&desc.name, desc.view, desc.show_fx_windows);
    page.set_follow_selection(desc.follow_selection);

    for surface in &desc.surfaces {
        let sid = page.add_surface(&surface.name);
        for w in &surface.widgets {
            page.add_widget(sid, Widget::new(w.role()).with_repeat(w.repeat_ms()));
        }
    }

    if let Some(channels) = &desc.channels {
        let mut built = Vec::with_capacity(channels.len());
        for channel in channels {
            let mut ids = Vec::with_capacity(channel.widgets.len());
            for role in &channel.widgets {
                match page.widget_by_role(role) {
                    Some(id) => ids.push(id),
                    None => warn!(
                        "page '{}': channel references unknown widget '{}'",
                        desc.name, role
                    ),
                }
            }
            built.push(BankableChannel::new(ids));
        }
        page.set_channels(built);
    }

    let mut dropped = 0usize;
    for (index, binding) in desc.bindings.iter().enumerate() {
        if let Err(err) = build_binding(&mut page, binding, registry) {
            dropped += 1;
            warn!(
                "page '{}': dropping binding #{} ({} -> {}): {}",
                desc.name, index, binding.widget, binding.action, err
            );
        }
    }
    info!(
        "page '{}': {} surface(s), {} binding(s) loaded, {} dropped",
        desc.name,
        desc.surfaces.len(),
        desc.bindings.len() - dropped,
        dropped
    );
    page
}

fn build_binding(
    page: &mut Page,
    desc: &BindingDescriptor,
    registry: &ActionRegistry,
) -> Result<(), BindingError> {
    let widget = page
        .widget_by_role(&desc.widget)
        .ok_or_else(|| BindingError::UnknownWidget(desc.widget.clone()))?;
    let kind = registry
        .lookup(&desc.action)
        .ok_or_else(|| BindingError::UnknownAction(desc.action.clone()))?;
    let chord = match &desc.modifiers {
        Some(s) => ModifierChord::parse(s).map_err(BindingError::BadModifier)?,
        None => ModifierChord::NONE,
    };
    let target = build_target(kind.shape(), desc)?;

    let mode = match &desc.mode {
        Some(name) => page.intern_mode(name),
        None if kind.shape() == TargetShape::Fx => return Err(BindingError::MissingMode),
        None => TRACK_MODE,
    };

    page.add_binding(
        chord,
        ActionContext::new(kind, widget, mode, target, desc.invert),
    );
    Ok(())
}

fn build_target(shape: TargetShape, desc: &BindingDescriptor) -> Result<ActionTarget, BindingError> {
    let params = desc.params.as_deref().unwrap_or(&[]);
    match shape {
        TargetShape::Global => Ok(ActionTarget::Global),
        TargetShape::Track => Ok(ActionTarget::Track),
        TargetShape::TrackWithInt => params
            .first()
            .and_then(|v| v.as_i64())
            .map(|v| ActionTarget::TrackWithInt { value: v as i32 })
            .ok_or(BindingError::MissingParam {
                action: desc.action.clone(),
                expected: "an integer parameter",
            }),
        TargetShape::TrackWithString => params
            .first()
            .and_then(|v| v.as_str())
            .map(|s| ActionTarget::TrackWithString {
                value: s.to_string(),
            })
            .ok_or(BindingError::MissingParam {
                action: desc.action.clone(),
                expected: "a string parameter",
            }),
        // The slot index starts at 0 and is rewritten when the page maps a
        // track's FX chain.
        TargetShape::Fx => params
            .first()
            .and_then(|v| v.as_u64())
            .map(|p| ActionTarget::Fx {
                slot: 0,
                param: p as usize,
            })
            .ok_or(BindingError::MissingParam {
                action: desc.action.clone(),
                expected: "an FX parameter index",
            }),
    }
}
