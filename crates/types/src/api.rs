//! Sidecar API messages and registry snapshot types.

use crate::protocol::{ComponentType, ConfigSchema, DataPayload, Props, RenderConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of a sidecar push (`POST /api/widget`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidecarRequest {
    pub module_id: String,
    /// Required the first time a sidecar wants to be displayed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<RenderConfig>,
    /// Optional settings form for the widget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<ConfigSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataPayload>,
}

/// Reply to a sidecar push
///
/// `props` carries the user's settings for the widget so the sidecar can read
/// its effective configuration back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidecarResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Props>,
}

impl SidecarResponse {
    pub fn ok(props: Option<Props>) -> Self {
        Self {
            status: "ok".to_string(),
            props,
        }
    }
}

/// Snapshot of one widget's current state (`GET /api/stats`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub title: String,
    pub data: Option<DataPayload>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_offline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Keyed by render identity
    pub widgets: BTreeMap<String, StatEntry>,
}

/// Pairs the short config id with the display template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    /// Short id used in the config file ("cpu", "custom.gpu", ...)
    pub module_id: String,
    pub config: RenderConfig,
    pub enabled: bool,
    pub is_sidecar: bool,
}
