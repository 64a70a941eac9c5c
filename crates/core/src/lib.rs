//! vitals-hud-core: Core traits and primitives for the vitals-hud registry.
//!
//! This crate contains the widget source abstraction (native pull sources and
//! sidecar push sources under one tagged variant), the notification sink
//! trait, payload change detection and the registry error type.

pub mod constants;
pub mod diff;
mod error;
mod events;
mod sidecar;
mod widget_source;

pub use constants::{
    ALERT_COLOR, ALERT_COLOR_PROP, BYTES_PER_GB, BYTES_PER_KB, DEFAULT_NATIVE_INTERVAL,
    MINIMAL_MODE_PROP, SIDECAR_TTL, TTL_CHECK_INTERVAL,
};
pub use diff::{fingerprint, payload_changed};
pub use error::{RegistryError, RegistryResult};
pub use events::{ConfigUpdate, EventSink, HudEvent, ModeChange};
pub use sidecar::SidecarSource;
pub use widget_source::{
    sample, MetricSource, NativeSource, SharedMetricSource, Source, WidgetSource,
};

// Re-export types used in trait signatures for convenience
pub use vitals_hud_types::{ConfigSchema, DataPayload, Props, RenderConfig};
