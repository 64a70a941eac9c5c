//! Outbound notifications consumed by the UI

use serde::Serialize;
use serde_json::Value;
use vitals_hud_types::{DataPayload, UpdateEvent, WindowMode};

/// Body of a `mode-change` notification; only the fields that changed are set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_mode: Option<WindowMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_mode: Option<bool>,
}

/// Body of a `config-update` notification
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

/// A notification emitted by the registry
#[derive(Debug, Clone, PartialEq)]
pub enum HudEvent {
    /// A widget has new data
    StatsUpdate(UpdateEvent),
    /// The module list changed and must be re-fetched
    ConfigReload,
    ModeChange(ModeChange),
    ConfigUpdate(ConfigUpdate),
}

impl HudEvent {
    pub fn stats_update(id: impl Into<String>, data: DataPayload) -> Self {
        HudEvent::StatsUpdate(UpdateEvent {
            id: id.into(),
            data,
        })
    }

    /// Event name as seen by the UI
    pub fn name(&self) -> &'static str {
        match self {
            HudEvent::StatsUpdate(_) => "stats-update",
            HudEvent::ConfigReload => "config-reload",
            HudEvent::ModeChange(_) => "mode-change",
            HudEvent::ConfigUpdate(_) => "config-update",
        }
    }

    /// Event body as JSON
    pub fn payload(&self) -> Value {
        let result = match self {
            HudEvent::StatsUpdate(update) => serde_json::to_value(update),
            HudEvent::ConfigReload => Ok(Value::Object(Default::default())),
            HudEvent::ModeChange(change) => serde_json::to_value(change),
            HudEvent::ConfigUpdate(update) => serde_json::to_value(update),
        };
        result.unwrap_or(Value::Null)
    }

    /// Widget id for `stats-update`, `None` otherwise
    pub fn widget_id(&self) -> Option<&str> {
        match self {
            HudEvent::StatsUpdate(update) => Some(&update.id),
            _ => None,
        }
    }
}

/// Fire-and-forget notification sink
///
/// Implementations must not block: there is no delivery guarantee and no
/// backpressure, a slow consumer only ever sees the latest state.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: HudEvent);
}
