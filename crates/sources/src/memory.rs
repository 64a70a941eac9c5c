//! Memory (RAM) usage source

use crate::util::{alert_props, bool_prop, number_prop, round};
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;
use sysinfo::System;
use vitals_hud_core::{MetricSource, WidgetSource, BYTES_PER_GB, MINIMAL_MODE_PROP};
use vitals_hud_types::{
    ComponentType, ConfigSchema, ConfigType, DataPayload, KeyValueItem, Props, RenderConfig,
};

pub const MEMORY_SOURCE_ID: &str = "mem";
const RENDER_ID: &str = "hud.core.mem";
const DEFAULT_ALERT_THRESHOLD: f64 = 85.0;

/// Shared sysinfo::System instance for memory sampling.
static SHARED_MEMORY_SYSTEM: Lazy<Mutex<System>> = Lazy::new(|| {
    log::info!("Creating shared Memory sysinfo::System instance");
    Mutex::new(System::new())
});

/// RAM usage, drawn as a gauge (or a key-value row in minimal mode)
pub struct MemorySource {
    minimal_mode: bool,
    alert_threshold: f64,
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            minimal_mode: false,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
        }
    }

    fn build_payload(&self, used_bytes: u64, total_bytes: u64) -> DataPayload {
        let usage = if total_bytes > 0 {
            round(used_bytes as f64 / total_bytes as f64 * 100.0, 1)
        } else {
            0.0
        };
        let used_gb = round(used_bytes as f64 / BYTES_PER_GB, 1);
        let total_gb = round(total_bytes as f64 / BYTES_PER_GB, 0);

        let mut payload = DataPayload::with_value(usage);
        payload.label = Some(format!("{:.1}%", usage));
        if usage > self.alert_threshold {
            payload.props = Some(alert_props());
        }

        payload.items = if self.minimal_mode {
            let items = vec![
                KeyValueItem::new("RAM", format!("{:.1} G", used_gb)).with_icon("MemoryStick"),
            ];
            serde_json::to_value(items).ok()
        } else {
            Some(json!({
                "used": format!("{:.1} GB", used_gb),
                "total": format!("{:.0} GB", total_gb),
            }))
        };
        payload
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetSource for MemorySource {
    fn id(&self) -> &str {
        MEMORY_SOURCE_ID
    }

    fn render_template(&self) -> RenderConfig {
        if self.minimal_mode {
            return RenderConfig::new(RENDER_ID, ComponentType::key_value(), "RAM")
                .with_prop("layout", "row");
        }
        RenderConfig::new(RENDER_ID, ComponentType::gauge(), "Memory")
            .with_prop("min", 0)
            .with_prop("max", 100)
            .with_prop("unit", "%")
    }

    fn config_schema(&self) -> Vec<ConfigSchema> {
        vec![ConfigSchema::new(
            "alert_threshold",
            "Alert Threshold (%)",
            ConfigType::Number,
            DEFAULT_ALERT_THRESHOLD,
        )]
    }

    fn apply_config(&mut self, props: &Props) {
        if let Some(minimal) = bool_prop(props, MINIMAL_MODE_PROP) {
            self.minimal_mode = minimal;
        }
        if let Some(threshold) = number_prop(props, "alert_threshold") {
            self.alert_threshold = threshold;
        }
    }
}

impl MetricSource for MemorySource {
    fn update(&mut self) -> Result<DataPayload> {
        let mut system = SHARED_MEMORY_SYSTEM
            .lock()
            .map_err(|e| anyhow!("Memory system mutex poisoned: {}", e))?;
        system.refresh_memory();
        let used = system.used_memory();
        let total = system.total_memory();
        // Drop the lock before doing any other processing
        drop(system);

        Ok(self.build_payload(used, total))
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(2)
    }
}
