//! Persisted application and widget configuration

use crate::protocol::{ComponentType, Props};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

pub const DEFAULT_THEME: &str = "neon";
pub const DEFAULT_OPACITY: f64 = 0.72;
pub const MIN_OPACITY: f64 = 0.1;
pub const MAX_OPACITY: f64 = 1.0;
pub const DEFAULT_GRID_COLUMNS: u32 = 2;
pub const MIN_GRID_COLUMNS: u32 = 1;
pub const MAX_GRID_COLUMNS: u32 = 6;

/// Whether the HUD window accepts mouse input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    #[default]
    Normal,
    /// Click-through
    Locked,
}

impl WindowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowMode::Normal => "normal",
            WindowMode::Locked => "locked",
        }
    }
}

impl FromStr for WindowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(WindowMode::Normal),
            "locked" => Ok(WindowMode::Locked),
            other => Err(format!("invalid window mode: {:?}", other)),
        }
    }
}

impl std::fmt::Display for WindowMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Hand-edited configs may carry "" or junk here; fall back to normal instead of
// refusing to load the whole file.
impl<'de> Deserialize<'de> for WindowMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(raw.parse().unwrap_or_else(|_| {
            if !raw.is_empty() {
                log::warn!("Unknown window mode {:?} in config, using normal", raw);
            }
            WindowMode::Normal
        }))
    }
}

/// One entry of the ordered widget list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub id: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Props::is_empty")]
    pub props: Props,
    /// Persisted so an offline placeholder can be rendered before the sidecar reconnects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar_type: Option<ComponentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar_title: Option<String>,
}

impl WidgetConfig {
    pub fn new(id: impl Into<String>, enabled: bool) -> Self {
        Self {
            id: id.into(),
            enabled,
            ..Default::default()
        }
    }

    /// True if this entry was written for a sidecar and carries enough
    /// metadata to rebuild its display template
    pub fn has_sidecar_template(&self) -> bool {
        self.sidecar_type.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// Application-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub widgets: Vec<WidgetConfig>,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub minimal_mode: bool,
    #[serde(default = "default_grid_columns")]
    pub grid_columns: u32,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub window_mode: WindowMode,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_grid_columns() -> u32 {
    DEFAULT_GRID_COLUMNS
}

fn default_opacity() -> f64 {
    DEFAULT_OPACITY
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            widgets: Vec::new(),
            theme: default_theme(),
            minimal_mode: false,
            grid_columns: DEFAULT_GRID_COLUMNS,
            opacity: DEFAULT_OPACITY,
            window_mode: WindowMode::Normal,
        }
    }
}

impl AppConfig {
    /// Replace out-of-range or unset global settings with their defaults
    pub fn with_defaults(mut self) -> Self {
        if !(MIN_OPACITY..=MAX_OPACITY).contains(&self.opacity) {
            self.opacity = DEFAULT_OPACITY;
        }
        if !(MIN_GRID_COLUMNS..=MAX_GRID_COLUMNS).contains(&self.grid_columns) {
            self.grid_columns = DEFAULT_GRID_COLUMNS;
        }
        if self.theme.is_empty() {
            self.theme = default_theme();
        }
        self
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetConfig> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn contains_widget(&self, id: &str) -> bool {
        self.widget(id).is_some()
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.widget(id).is_some_and(|w| w.enabled)
    }
}
