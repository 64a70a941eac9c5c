//! Display and settings protocol shared by native sources, sidecars and the UI.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Free-form property bag used for template props, payload overrides and
/// per-widget settings.
///
/// Ordered so that serializing the same props always yields the same bytes.
pub type Props = BTreeMap<String, Value>;

/// Payload prop set on synthesized payloads of sidecars that stopped pushing
pub const OFFLINE_PROP: &str = "isOffline";

/// Component type a widget is rendered with
///
/// Sidecars may send types the built-in set does not know about (e.g. `text`),
/// so this is an open string rather than a closed enum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentType(String);

impl ComponentType {
    pub const GAUGE: &'static str = "gauge";
    pub const BAR_LIST: &'static str = "bar-list";
    pub const KEY_VALUE: &'static str = "key-value";
    pub const GROUP: &'static str = "group";
    pub const SPARKLINE: &'static str = "sparkline";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn gauge() -> Self {
        Self::new(Self::GAUGE)
    }

    pub fn bar_list() -> Self {
        Self::new(Self::BAR_LIST)
    }

    pub fn key_value() -> Self {
        Self::new(Self::KEY_VALUE)
    }

    pub fn group() -> Self {
        Self::new(Self::GROUP)
    }

    pub fn sparkline() -> Self {
        Self::new(Self::SPARKLINE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for ComponentType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static display template of a widget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render identity, e.g. `hud.core.cpu` or the sidecar's module id
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub title: String,
    /// Static settings (min, max, unit...)
    pub props: Props,
}

impl RenderConfig {
    pub fn new(
        id: impl Into<String>,
        component_type: ComponentType,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            component_type,
            title: title.into(),
            props: Props::new(),
        }
    }

    /// Builder-style helper for adding a static prop
    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    /// A template is only usable by the UI once it names a component type
    pub fn is_valid(&self) -> bool {
        !self.component_type.is_empty()
    }
}

/// Dynamic content of a single widget update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPayload {
    /// Number or string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Gauge center text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Sparkline side text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,
    /// List data (`BarListItem`s, `KeyValueItem`s or a plain object)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Value>,
    /// Dynamic prop overrides (alert color, offline flag...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Props>,
}

impl DataPayload {
    pub fn with_value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Minimal payload shown for a widget whose sidecar has not pushed yet
    pub fn offline_placeholder() -> Self {
        let mut props = Props::new();
        props.insert(OFFLINE_PROP.to_string(), Value::Bool(true));
        Self {
            props: Some(props),
            ..Default::default()
        }
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.as_ref().and_then(|props| props.get(key))
    }

    pub fn set_prop(&mut self, key: &str, value: impl Into<Value>) {
        self.props
            .get_or_insert_with(Props::new)
            .insert(key.to_string(), value.into());
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.prop(OFFLINE_PROP), Some(Value::Bool(true)))
    }
}

/// Notification body for a single widget update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub id: String,
    pub data: DataPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarListItem {
    pub label: String,
    pub percent: f64,
    /// e.g. "100.0 / 500 GB"
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValueItem {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl KeyValueItem {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }
}

/// Kind of input a settings field is edited with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    #[default]
    Text,
    Number,
    Bool,
    Select,
    Checkboxes,
    Button,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

/// One field of a widget's settings form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
    /// Prop key; buttons may leave it empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub config_type: ConfigType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Only used by `select`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Only used by `button`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl ConfigSchema {
    pub fn new(name: &str, label: &str, config_type: ConfigType, default: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            config_type,
            default: Some(default.into()),
            ..Default::default()
        }
    }

    /// Collect `name -> default` for every field that has both
    pub fn defaults(schema: &[ConfigSchema]) -> Props {
        schema
            .iter()
            .filter(|field| !field.name.is_empty())
            .filter_map(|field| {
                field
                    .default
                    .as_ref()
                    .filter(|value| !value.is_null())
                    .map(|value| (field.name.clone(), value.clone()))
            })
            .collect()
    }
}
