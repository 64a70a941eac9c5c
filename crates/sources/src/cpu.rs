//! CPU usage source

use crate::util::{alert_props, bool_prop, number_prop, round};
use anyhow::Result;
use std::time::Duration;
use sysinfo::{CpuRefreshKind, RefreshKind, System};
use vitals_hud_core::{MetricSource, WidgetSource, MINIMAL_MODE_PROP};
use vitals_hud_types::{
    ComponentType, ConfigSchema, ConfigType, DataPayload, KeyValueItem, Props, RenderConfig,
};

pub const CPU_SOURCE_ID: &str = "cpu";
const RENDER_ID: &str = "hud.core.cpu";
const DEFAULT_ALERT_THRESHOLD: f64 = 80.0;

/// Overall CPU usage, drawn as a sparkline (or a key-value row in minimal mode)
pub struct CpuSource {
    system: System,
    minimal_mode: bool,
    alert_threshold: f64,
}

impl CpuSource {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new().with_cpu(CpuRefreshKind::everything()),
        );
        Self {
            system,
            minimal_mode: false,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
        }
    }

    fn build_payload(&self, usage: f64) -> DataPayload {
        let mut payload = DataPayload::with_value(usage);
        // Turn the sparkline red above the threshold
        if usage > self.alert_threshold {
            payload.props = Some(alert_props());
        }
        if self.minimal_mode {
            let items = vec![KeyValueItem::new("CPU", format!("{:.1}%", usage)).with_icon("Cpu")];
            payload.items = serde_json::to_value(items).ok();
        }
        payload
    }
}

impl Default for CpuSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetSource for CpuSource {
    fn id(&self) -> &str {
        CPU_SOURCE_ID
    }

    fn render_template(&self) -> RenderConfig {
        if self.minimal_mode {
            return RenderConfig::new(RENDER_ID, ComponentType::key_value(), "CPU")
                .with_prop("layout", "row");
        }
        RenderConfig::new(RENDER_ID, ComponentType::sparkline(), "CPU")
            .with_prop("unit", "%")
            // 60s of history at 1s interval
            .with_prop("maxPoints", 60)
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

impl MetricSource for CpuSource {
    fn update(&mut self) -> Result<DataPayload> {
        self.system.refresh_cpu_all();
        let usage = round(self.system.global_cpu_usage() as f64, 1);
        Ok(self.build_payload(usage))
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(1)
    }
}
