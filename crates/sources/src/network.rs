//! Network throughput source

use crate::util::round;
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::Networks;
use vitals_hud_core::{MetricSource, WidgetSource, BYTES_PER_KB};
use vitals_hud_types::{
    ComponentType, ConfigSchema, DataPayload, KeyValueItem, Props, RenderConfig,
};

pub const NETWORK_SOURCE_ID: &str = "net";
const RENDER_ID: &str = "hud.core.net";

/// Shared Networks instance for network sampling.
static SHARED_NETWORKS: Lazy<Mutex<Networks>> = Lazy::new(|| {
    log::info!("Creating shared Networks sysinfo instance");
    Mutex::new(Networks::new_with_refreshed_list())
});

/// Upload/download rate summed over all interfaces
pub struct NetworkSource {
    prev_received: u64,
    prev_transmitted: u64,
    prev_time: Option<Instant>,
}

impl NetworkSource {
    pub fn new() -> Self {
        Self {
            prev_received: 0,
            prev_transmitted: 0,
            prev_time: None,
        }
    }

    /// Turn cumulative counters into KB/s rates; the first sample is always zero
    fn rates(&mut self, total_received: u64, total_transmitted: u64, now: Instant) -> (f64, f64) {
        let (down, up) = match self.prev_time {
            Some(prev_time) => {
                let elapsed = now.duration_since(prev_time).as_secs_f64();
                if elapsed > 0.0 {
                    (
                        total_received.saturating_sub(self.prev_received) as f64
                            / elapsed
                            / BYTES_PER_KB,
                        total_transmitted.saturating_sub(self.prev_transmitted) as f64
                            / elapsed
                            / BYTES_PER_KB,
                    )
                } else {
                    (0.0, 0.0)
                }
            }
            None => (0.0, 0.0),
        };

        self.prev_received = total_received;
        self.prev_transmitted = total_transmitted;
        self.prev_time = Some(now);
        (round(down, 1), round(up, 1))
    }

    fn build_payload(down: f64, up: f64) -> DataPayload {
        let items = vec![
            KeyValueItem::new("UP", format!("{:.1} KB/s", up)).with_icon("ArrowUp"),
            KeyValueItem::new("DOWN", format!("{:.1} KB/s", down)).with_icon("ArrowDown"),
        ];
        DataPayload {
            items: serde_json::to_value(items).ok(),
            ..Default::default()
        }
    }
}

impl Default for NetworkSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetSource for NetworkSource {
    fn id(&self) -> &str {
        NETWORK_SOURCE_ID
    }

    fn render_template(&self) -> RenderConfig {
        RenderConfig::new(RENDER_ID, ComponentType::key_value(), "Network")
            .with_prop("layout", "column")
    }

    fn config_schema(&self) -> Vec<ConfigSchema> {
        Vec::new()
    }

    fn apply_config(&mut self, _props: &Props) {}
}

impl MetricSource for NetworkSource {
    fn update(&mut self) -> Result<DataPayload> {
        let mut networks = SHARED_NETWORKS
            .lock()
            .map_err(|e| anyhow!("Networks mutex poisoned: {}", e))?;
        networks.refresh();
        let (received, transmitted) = networks.iter().fold((0u64, 0u64), |(rx, tx), (_, data)| {
            (rx + data.total_received(), tx + data.total_transmitted())
        });
        // Drop the lock before doing any other processing
        drop(networks);

        let (down, up) = self.rates(received, transmitted, Instant::now());
        Ok(Self::build_payload(down, up))
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(1)
    }
}
