//! Widget source abstraction shared by native and sidecar sources

use crate::constants::DEFAULT_NATIVE_INTERVAL;
use crate::sidecar::SidecarSource;
use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vitals_hud_types::{ConfigSchema, DataPayload, Props, RenderConfig};

/// Capabilities every widget source has
pub trait WidgetSource: Send {
    /// Short identity used in the config file ("cpu", "custom.gpu", ...)
    fn id(&self) -> &str;

    /// Current display template
    ///
    /// May change after `apply_config` (e.g. minimal mode switches a gauge
    /// to a key-value list) but the template id stays the same.
    fn render_template(&self) -> RenderConfig;

    /// Settings form for this widget
    fn config_schema(&self) -> Vec<ConfigSchema>;

    /// Apply merged per-widget settings and global overrides
    fn apply_config(&mut self, props: &Props);
}

/// Trait for native, in-process metric sources
///
/// Native sources are polled by the registry on their own interval.
/// `update` is called from a monitor task without the registry lock held,
/// so it may take a moment, but should stay bounded (<10ms ideally).
pub trait MetricSource: WidgetSource {
    /// Sample the metric and build the payload to display
    fn update(&mut self) -> Result<DataPayload>;

    /// How often this source wants to be polled
    fn interval(&self) -> Duration {
        DEFAULT_NATIVE_INTERVAL
    }
}

/// Native source shared between the registry and its monitor task
pub type SharedMetricSource = Arc<Mutex<dyn MetricSource>>;

/// A native source as held by the registry
///
/// Template and schema are snapshotted so that snapshot reads never wait on
/// the source mutex while a sample is in flight.
pub struct NativeSource {
    id: String,
    template: RenderConfig,
    schema: Vec<ConfigSchema>,
    interval: Duration,
    source: SharedMetricSource,
}

impl NativeSource {
    pub fn new<S: MetricSource + 'static>(source: S) -> Self {
        let id = source.id().to_string();
        let template = source.render_template();
        let schema = source.config_schema();
        let interval = source.interval();
        Self {
            id,
            template,
            schema,
            interval,
            source: Arc::new(Mutex::new(source)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn render_template(&self) -> &RenderConfig {
        &self.template
    }

    pub fn config_schema(&self) -> &[ConfigSchema] {
        &self.schema
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Handle for a monitor task
    pub fn handle(&self) -> SharedMetricSource {
        Arc::clone(&self.source)
    }

    /// Forward settings to the source and refresh the snapshots
    pub fn apply_config(&mut self, props: &Props) -> Result<()> {
        let mut source = self
            .source
            .lock()
            .map_err(|e| anyhow!("Source {} lock poisoned: {}", self.id, e))?;
        source.apply_config(props);
        self.template = source.render_template();
        self.schema = source.config_schema();
        let interval = source.interval();
        if interval != self.interval {
            log::debug!("{} now polls every {:?}", self.id, interval);
        }
        self.interval = interval;
        Ok(())
    }
}

/// Sample a shared native source
pub fn sample(source: &SharedMetricSource) -> Result<DataPayload> {
    let mut guard = source
        .lock()
        .map_err(|e| anyhow!("Source lock poisoned: {}", e))?;
    guard.update()
}

/// Tagged variant over the two acquisition models
///
/// Whether a source gets a monitor task is decided by matching on this enum,
/// never by probing capabilities at runtime.
pub enum Source {
    /// Pulled in-process on a fixed interval
    Native(NativeSource),
    /// Pushed by an external process, liveness via TTL
    Sidecar(SidecarSource),
}

impl Source {
    pub fn id(&self) -> &str {
        match self {
            Source::Native(native) => native.id(),
            Source::Sidecar(sidecar) => sidecar.id(),
        }
    }

    pub fn render_template(&self) -> &RenderConfig {
        match self {
            Source::Native(native) => native.render_template(),
            Source::Sidecar(sidecar) => sidecar.template(),
        }
    }

    /// Identity the UI and the cache know this widget by
    pub fn render_id(&self) -> &str {
        &self.render_template().id
    }

    pub fn config_schema(&self) -> &[ConfigSchema] {
        match self {
            Source::Native(native) => native.config_schema(),
            Source::Sidecar(sidecar) => sidecar.schema(),
        }
    }

    pub fn apply_config(&mut self, props: &Props) -> Result<()> {
        match self {
            Source::Native(native) => native.apply_config(props),
            Source::Sidecar(sidecar) => {
                sidecar.apply_config(props);
                Ok(())
            }
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Source::Native(_))
    }

    pub fn is_sidecar(&self) -> bool {
        matches!(self, Source::Sidecar(_))
    }

    pub fn is_offline(&self) -> bool {
        match self {
            Source::Native(_) => false,
            Source::Sidecar(sidecar) => sidecar.is_offline(),
        }
    }

    pub fn as_sidecar(&self) -> Option<&SidecarSource> {
        match self {
            Source::Sidecar(sidecar) => Some(sidecar),
            Source::Native(_) => None,
        }
    }

    pub fn as_sidecar_mut(&mut self) -> Option<&mut SidecarSource> {
        match self {
            Source::Sidecar(sidecar) => Some(sidecar),
            Source::Native(_) => None,
        }
    }
}
