//! Small helpers shared by the built-in sources

use serde_json::Value;
use vitals_hud_core::{ALERT_COLOR, ALERT_COLOR_PROP};
use vitals_hud_types::Props;

/// Round to `digits` decimal places
pub fn round(value: f64, digits: i32) -> f64 {
    let pow = 10f64.powi(digits);
    (value * pow).round() / pow
}

pub fn bool_prop(props: &Props, key: &str) -> Option<bool> {
    props.get(key).and_then(Value::as_bool)
}

/// Numbers arrive as ints or floats depending on who wrote the config
pub fn number_prop(props: &Props, key: &str) -> Option<f64> {
    props.get(key).and_then(Value::as_f64)
}

pub fn string_prop(props: &Props, key: &str) -> Option<String> {
    props.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn alert_props() -> Props {
    let mut props = Props::new();
    props.insert(ALERT_COLOR_PROP.to_string(), Value::from(ALERT_COLOR));
    props
}
