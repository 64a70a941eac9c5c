//! Default widget list for a fresh config file

use vitals_hud_core::NativeSource;
use vitals_hud_types::{ConfigSchema, WidgetConfig};

/// One enabled entry per native source, in the order given
///
/// Each entry starts out with the source's schema defaults as its props, so
/// the settings form has something to show before the user touches it.
pub fn build_default_widgets(natives: &[NativeSource]) -> Vec<WidgetConfig> {
    natives
        .iter()
        .map(|native| WidgetConfig {
            props: ConfigSchema::defaults(native.config_schema()),
            ..WidgetConfig::new(native.id(), true)
        })
        .collect()
}
