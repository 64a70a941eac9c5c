//! vitals-hud: A system vitals HUD fed by built-in sources and sidecars
//!
//! This library provides the core functionality for vitals-hud, including:
//! - The widget registry and monitoring orchestrator
//! - Persisted configuration management
//! - Event sinks for registry notifications
//! - Transport-independent sidecar API handlers

pub mod api;
pub mod config;
pub mod events;
pub mod service;

// Re-export commonly used types
pub use api::{handle_stats_pull, handle_widget_push, ApiError, DEFAULT_API_ADDR};
pub use config::ConfigService;
pub use events::{BroadcastSink, LogSink, NullSink};
pub use service::SystemService;
pub use vitals_hud_core::{EventSink, HudEvent, RegistryError, RegistryResult};
