//! Binding-table data model and YAML loading
//!
//! The table is the human-edited description of pages, surfaces, widgets,
//! channel strips and bindings. Loading only parses; descriptor validation
//! happens during assembly, where malformed entries are dropped one by one
//! instead of failing the whole table.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root of the binding table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BindingTable {
    /// Page shown at startup; defaults to the first page in the list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_page: Option<String>,
    pub pages: Vec<PageDescriptor>,
}

/// One page: a full mapping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageDescriptor {
    pub name: String,
    #[serde(default = "default_view")]
    pub view: crate::host::ViewMode,
    #[serde(default = "default_true")]
    pub follow_selection: bool,
    #[serde(default)]
    pub show_fx_windows: bool,
    pub surfaces: Vec<SurfaceDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<ChannelDescriptor>>,
    pub bindings: Vec<BindingDescriptor>,
}

/// One physical surface (or surface section) and its widgets.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SurfaceDescriptor {
    pub name: String,
    pub widgets: Vec<WidgetDescriptor>,
}

/// Widget declaration. A plain string is shorthand for a role with no
/// repeat behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WidgetDescriptor {
    Role(String),
    Full {
        role: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        repeat_ms: Option<u64>,
    },
}

impl WidgetDescriptor {
    pub fn role(&self) -> &str {
        match self {
            WidgetDescriptor::Role(r) => r,
            WidgetDescriptor::Full { role, .. } => role,
        }
    }

    pub fn repeat_ms(&self) -> Option<u64> {
        match self {
            WidgetDescriptor::Role(_) => None,
            WidgetDescriptor::Full { repeat_ms, .. } => *repeat_ms,
        }
    }
}

/// One bankable channel strip: the widget roles that follow its track.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelDescriptor {
    pub widgets: Vec<String>,
}

/// One binding entry: widget role + action name + optional qualifiers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BindingDescriptor {
    pub widget: String,
    pub action: String,
    /// Modifier chord like "Shift" or "Shift+Option"; absent means the
    /// empty chord.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<String>,
    /// FX display name; absent means Track mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Positional action parameters (integers, strings).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub invert: bool,
}

impl BindingTable {
    /// Load a table from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read binding table: {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse binding table: {}", path.display()))
    }

    /// Parse a table from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let table: BindingTable =
            serde_yaml::from_str(contents).context("Invalid binding-table YAML")?;
        Ok(table)
    }
}

// Default value functions
fn default_view() -> crate::host::ViewMode {
    crate::host::ViewMode::Mixer
}
fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ViewMode;

    const SAMPLE: &str = r#"
initial_page: Mixer
pages:
  - name: Mixer
    surfaces:
      - name: main
        widgets:
          - Fader1
          - Mute1
          - role: BankLeft
            repeat_ms: 250
          - Shift
    channels:
      - widgets: [Fader1, Mute1]
    bindings:
      - widget: Fader1
        action: TrackVolume
      - widget: Fader1
        action: TrackPan
        modifiers: Shift
      - widget: Mute1
        action: TrackMute
        invert: true
      - widget: BankLeft
        action: TrackBank
        params: [-1]
      - widget: Shift
        action: Shift
  - name: FX
    view: arrange
    follow_selection: false
    show_fx_windows: true
    surfaces:
      - name: main
        widgets: [Knob1]
    bindings:
      - widget: Knob1
        action: FXParam
        mode: EQ
        params: [3]
"#;

    #[test]
    fn test_parse_sample_table() {
        let table = BindingTable::from_yaml(SAMPLE).unwrap();
        assert_eq!(table.initial_page.as_deref(), Some("Mixer"));
        assert_eq!(table.pages.len(), 2);

        let mixer = &table.pages[0];
        assert_eq!(mixer.view, ViewMode::Mixer);
        assert!(mixer.follow_selection);
        assert!(!mixer.show_fx_windows);
        assert_eq!(mixer.channels.as_ref().unwrap()[0].widgets, ["Fader1", "Mute1"]);

        let widgets = &mixer.surfaces[0].widgets;
        assert_eq!(widgets[0].role(), "Fader1");
        assert_eq!(widgets[0].repeat_ms(), None);
        assert_eq!(widgets[2].role(), "BankLeft");
        assert_eq!(widgets[2].repeat_ms(), Some(250));

        assert!(mixer.bindings[2].invert);
        assert_eq!(mixer.bindings[1].modifiers.as_deref(), Some("Shift"));

        let fx = &table.pages[1];
        assert_eq!(fx.view, ViewMode::Arrange);
        assert!(!fx.follow_selection);
        assert!(fx.show_fx_windows);
        assert_eq!(fx.bindings[0].mode.as_deref(), Some("EQ"));
        assert_eq!(fx.bindings[0].params.as_ref().unwrap()[0], 3);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(BindingTable::from_yaml("pages: 12").is_err());
    }
}
