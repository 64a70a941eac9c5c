//! vitals-hud-types: Shared data types for the vitals-hud widget registry.
//!
//! This crate contains pure data types (display protocol, config schema,
//! sidecar API messages and the persisted app config) that are shared across
//! all vitals-hud crates. Nothing in here does I/O or spawns tasks, making it
//! suitable as the foundation layer.

pub mod api;
pub mod config;
pub mod protocol;

// Re-export commonly used types at the crate root for convenience
pub use api::{ModuleInfo, SidecarRequest, SidecarResponse, StatEntry, StatsResponse};
pub use config::{
    AppConfig, WidgetConfig, WindowMode, DEFAULT_GRID_COLUMNS, DEFAULT_OPACITY, DEFAULT_THEME,
    MAX_GRID_COLUMNS, MAX_OPACITY, MIN_GRID_COLUMNS, MIN_OPACITY,
};
pub use protocol::{
    BarListItem, ComponentType, ConfigSchema, ConfigType, DataPayload, KeyValueItem, Props,
    RenderConfig, SelectOption, UpdateEvent, OFFLINE_PROP,
};
