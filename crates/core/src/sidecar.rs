//! Push-based widget source fed by an external process

use crate::widget_source::WidgetSource;
use std::time::Duration;
use tokio::time::Instant;
use vitals_hud_types::{ConfigSchema, DataPayload, Props, RenderConfig, WidgetConfig, OFFLINE_PROP};

/// State of one sidecar widget
///
/// Sidecars are created lazily on their first registration, or restored from
/// the config file at startup as offline placeholders so the widget can be
/// drawn before the external process reconnects.
#[derive(Debug, Clone)]
pub struct SidecarSource {
    id: String,
    template: RenderConfig,
    schema: Vec<ConfigSchema>,
    current_data: Option<DataPayload>,
    current_props: Props,
    last_seen: Instant,
    is_offline: bool,
    restored: bool,
}

impl SidecarSource {
    /// A freshly registered sidecar, seen now, without a usable template yet
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            template: RenderConfig {
                id: id.clone(),
                ..Default::default()
            },
            id,
            schema: Vec::new(),
            current_data: None,
            current_props: Props::new(),
            last_seen: Instant::now(),
            is_offline: false,
            restored: false,
        }
    }

    /// Rebuild an offline placeholder from a persisted widget entry
    ///
    /// Returns `None` if the entry has no sidecar metadata to render with.
    pub fn restored(widget: &WidgetConfig) -> Option<Self> {
        let component_type = widget.sidecar_type.clone().filter(|t| !t.is_empty())?;
        let mut source = Self::new(widget.id.clone());
        source.template.component_type = component_type;
        source.template.title = widget
            .sidecar_title
            .clone()
            .unwrap_or_else(|| widget.id.clone());
        source.is_offline = true;
        source.restored = true;
        Some(source)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn template(&self) -> &RenderConfig {
        &self.template
    }

    pub fn schema(&self) -> &[ConfigSchema] {
        &self.schema
    }

    pub fn current_data(&self) -> Option<&DataPayload> {
        self.current_data.as_ref()
    }

    /// Settings last applied by the registry, echoed back to the sidecar
    pub fn current_props(&self) -> &Props {
        &self.current_props
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    pub fn is_offline(&self) -> bool {
        self.is_offline
    }

    /// Restored from config and not heard from since
    pub fn is_placeholder(&self) -> bool {
        self.restored
    }

    pub fn has_valid_template(&self) -> bool {
        self.template.is_valid()
    }

    /// Replace the display template and settings schema
    ///
    /// The template id is always forced to this source's id.
    pub fn update_template(&mut self, template: RenderConfig, schema: Vec<ConfigSchema>) {
        self.template = template;
        self.template.id = self.id.clone();
        self.schema = schema;
    }

    pub fn mark_seen(&mut self) {
        self.mark_seen_at(Instant::now());
    }

    pub fn mark_seen_at(&mut self, at: Instant) {
        self.last_seen = at;
        self.is_offline = false;
        self.restored = false;
    }

    pub fn set_data(&mut self, payload: DataPayload) {
        self.current_data = Some(payload);
    }

    /// Online and silent for longer than `ttl`
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        !self.is_offline && now.saturating_duration_since(self.last_seen) > ttl
    }

    /// Flag the source offline and build the payload to show for it
    ///
    /// The payload is a deep copy of the last known one, so the displayed
    /// value survives and the source's own state is never aliased.
    pub fn go_offline(&mut self) -> DataPayload {
        self.is_offline = true;
        self.offline_payload()
    }

    pub fn offline_payload(&self) -> DataPayload {
        let mut payload = self.current_data.clone().unwrap_or_default();
        payload.set_prop(OFFLINE_PROP, true);
        payload
    }
}

impl WidgetSource for SidecarSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn render_template(&self) -> RenderConfig {
        self.template.clone()
    }

    fn config_schema(&self) -> Vec<ConfigSchema> {
        self.schema.clone()
    }

    fn apply_config(&mut self, props: &Props) {
        self.current_props = props.clone();
    }
}
