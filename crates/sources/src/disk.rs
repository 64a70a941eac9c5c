//! Disk usage source

use crate::util::{bool_prop, round, string_prop};
use anyhow::Result;
use std::time::Duration;
use sysinfo::Disks;
use vitals_hud_core::{MetricSource, WidgetSource, BYTES_PER_GB, MINIMAL_MODE_PROP};
use vitals_hud_types::{
    BarListItem, ComponentType, ConfigSchema, ConfigType, DataPayload, KeyValueItem, Props,
    RenderConfig,
};

pub const DISK_SOURCE_ID: &str = "disk";
const RENDER_ID: &str = "hud.core.disk";

/// Space figures for one mount point
#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub mount_point: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl DiskUsage {
    fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes() as f64 / self.total_bytes as f64 * 100.0
    }
}

/// Usage of one configured mount point, or of every physical partition
pub struct DiskSource {
    disks: Disks,
    /// Empty means auto-detect
    path: String,
    minimal_mode: bool,
}

impl DiskSource {
    pub fn new() -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
            path: String::new(),
            minimal_mode: false,
        }
    }

    /// Snap and loop mounts are not interesting to look at
    fn is_ignored_mount(mount_point: &str) -> bool {
        mount_point.is_empty() || mount_point.starts_with("/snap") || mount_point.starts_with("/loop")
    }

    fn collect_usage(&self) -> Vec<DiskUsage> {
        let all: Vec<DiskUsage> = self
            .disks
            .iter()
            .map(|disk| DiskUsage {
                mount_point: disk.mount_point().to_string_lossy().to_string(),
                total_bytes: disk.total_space(),
                available_bytes: disk.available_space(),
            })
            .collect();

        if !self.path.is_empty() {
            return all
                .into_iter()
                .filter(|usage| usage.mount_point == self.path)
                .collect();
        }

        let physical: Vec<DiskUsage> = all
            .iter()
            .filter(|usage| !Self::is_ignored_mount(&usage.mount_point))
            .cloned()
            .collect();
        if !physical.is_empty() {
            return physical;
        }
        // Fallback to the root filesystem
        all.into_iter().filter(|usage| usage.mount_point == "/").collect()
    }

    fn build_payload(&self, usages: &[DiskUsage]) -> DataPayload {
        let items = if self.minimal_mode {
            let items: Vec<KeyValueItem> = usages
                .iter()
                .map(|usage| {
                    KeyValueItem::new(
                        usage.mount_point.clone(),
                        format!("{:.0}%", usage.used_percent()),
                    )
                    .with_icon("HardDrive")
                })
                .collect();
            serde_json::to_value(items)
        } else {
            let items: Vec<BarListItem> = usages
                .iter()
                .map(|usage| {
                    let total = round(usage.total_bytes as f64 / BYTES_PER_GB, 0);
                    let used = round(usage.used_bytes() as f64 / BYTES_PER_GB, 1);
                    BarListItem {
                        label: usage.mount_point.clone(),
                        percent: round(usage.used_percent(), 1),
                        value: format!("{:.1} / {:.0} GB", used, total),
                    }
                })
                .collect();
            serde_json::to_value(items)
        };

        DataPayload {
            items: items.ok(),
            ..Default::default()
        }
    }
}

impl Default for DiskSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetSource for DiskSource {
    fn id(&self) -> &str {
        DISK_SOURCE_ID
    }

    fn render_template(&self) -> RenderConfig {
        if self.minimal_mode {
            return RenderConfig::new(RENDER_ID, ComponentType::key_value(), "Disk")
                .with_prop("layout", "column");
        }
        RenderConfig::new(RENDER_ID, ComponentType::bar_list(), "Disk Usage")
            .with_prop("headers", vec!["Drive", "Usage", "Details"])
    }

    fn config_schema(&self) -> Vec<ConfigSchema> {
        vec![
            ConfigSchema::new(
                "path",
                "Disk path (empty = auto-detect)",
                ConfigType::Text,
                "",
            ),
            ConfigSchema::new(MINIMAL_MODE_PROP, "Minimal mode", ConfigType::Bool, false),
        ]
    }

    fn apply_config(&mut self, props: &Props) {
        if let Some(path) = string_prop(props, "path") {
            self.path = path;
        }
        if let Some(minimal) = bool_prop(props, MINIMAL_MODE_PROP) {
            self.minimal_mode = minimal;
        }
    }
}

impl MetricSource for DiskSource {
    fn update(&mut self) -> Result<DataPayload> {
        self.disks.refresh();
        let usages = self.collect_usage();
        if usages.is_empty() {
            log::debug!("No disk matched path {:?}", self.path);
        }
        Ok(self.build_payload(&usages))
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(10)
    }
}
