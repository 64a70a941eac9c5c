//! Shared timing constants and well-known prop keys

use std::time::Duration;

/// A sidecar that has not pushed for longer than this is shown as offline
pub const SIDECAR_TTL: Duration = Duration::from_secs(10);

/// Period of the liveness checker, independent of any source interval
pub const TTL_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Poll interval used by native sources that do not pick their own
pub const DEFAULT_NATIVE_INTERVAL: Duration = Duration::from_millis(1000);

/// Global override merged into every widget's props on reconfiguration
pub const MINIMAL_MODE_PROP: &str = "minimal_mode";

/// Bytes per kilobyte (1024)
pub const BYTES_PER_KB: f64 = 1024.0;

/// Bytes per gigabyte (1024^3)
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Payload prop used to tint a widget when a threshold is exceeded
pub const ALERT_COLOR_PROP: &str = "color";

/// Color applied when a threshold is exceeded
pub const ALERT_COLOR: &str = "#ef4444";
