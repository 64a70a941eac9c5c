//! vitals-hud-sources: Native metric sources for vitals-hud.
//!
//! Each source samples one system metric with `sysinfo` and builds the
//! payload the HUD displays. Sources are created once at startup and are
//! polled by the registry on their own interval.

mod cpu;
mod disk;
mod memory;
mod network;
mod util;

pub use cpu::{CpuSource, CPU_SOURCE_ID};
pub use disk::{DiskSource, DiskUsage, DISK_SOURCE_ID};
pub use memory::{MemorySource, MEMORY_SOURCE_ID};
pub use network::{NetworkSource, NETWORK_SOURCE_ID};

use vitals_hud_core::NativeSource;

/// Create every built-in source, in the order their widgets appear in a
/// fresh config file
pub fn builtin_sources() -> Vec<NativeSource> {
    vec![
        NativeSource::new(CpuSource::new()),
        NativeSource::new(MemorySource::new()),
        NativeSource::new(DiskSource::new()),
        NativeSource::new(NetworkSource::new()),
    ]
}
