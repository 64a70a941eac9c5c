//! Widget registry and monitoring orchestrator
//!
//! `SystemService` owns every widget source, the payload cache and the
//! background tasks. Native sources are polled by one task each; sidecars
//! push through `register_sidecar` / `update_sidecar_data` and are flipped
//! offline by the TTL checker when they go quiet.
//!
//! Lock order: the registry lock is never held while calling into the
//! config service, awaiting, or sampling a native source. Sinks are called
//! under the registry lock and must not re-enter it.

mod monitor;
mod state;

#[cfg(test)]
mod tests;

use crate::config::ConfigService;
use log::{debug, info, trace, warn};
use monitor::{run_monitor, run_ttl_checker, MonitorTask};
use state::RegistryState;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use vitals_hud_core::{
    payload_changed, ConfigUpdate, EventSink, HudEvent, ModeChange, NativeSource, RegistryError,
    RegistryResult, SidecarSource, Source, MINIMAL_MODE_PROP, SIDECAR_TTL,
};
use vitals_hud_types::{
    AppConfig, ConfigSchema, DataPayload, ModuleInfo, Props, RenderConfig, StatEntry,
    StatsResponse, WidgetConfig, WindowMode, MAX_OPACITY, MIN_OPACITY,
};

pub struct SystemService {
    config: Arc<ConfigService>,
    state: RwLock<RegistryState>,
    sink: Arc<dyn EventSink>,
    /// Monitor tasks of the current cycle; held for a whole reconfiguration
    /// so cycles never overlap
    monitors: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
    /// Serializes adding newly seen sidecars to the config
    persist_lock: tokio::sync::Mutex<()>,
    ttl_task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl SystemService {
    /// Build the registry from the native sources and the persisted config
    ///
    /// Sidecars found in the config come back as offline placeholders so
    /// their widgets can be laid out before the external process reconnects.
    /// Nothing runs until `start`.
    pub fn new(
        config: Arc<ConfigService>,
        natives: Vec<NativeSource>,
        sink: Arc<dyn EventSink>,
    ) -> Arc<Self> {
        let mut sources = HashMap::new();
        for native in natives {
            let id = native.id().to_string();
            if sources.insert(id.clone(), Source::Native(native)).is_some() {
                warn!("Duplicate native source {}, keeping the last one", id);
            }
        }

        let app_config = config.get_config();
        let mut restored = 0;
        for widget in &app_config.widgets {
            if sources.contains_key(&widget.id) {
                continue;
            }
            if let Some(sidecar) = SidecarSource::restored(widget) {
                sources.insert(widget.id.clone(), Source::Sidecar(sidecar));
                restored += 1;
            }
        }
        if restored > 0 {
            info!("Restored {} sidecar placeholder(s) from config", restored);
        }

        let disabled = disabled_widgets(&app_config);
        Arc::new(Self {
            config,
            state: RwLock::new(RegistryState::new(sources, disabled)),
            sink,
            monitors: tokio::sync::Mutex::new(Vec::new()),
            persist_lock: tokio::sync::Mutex::new(()),
            ttl_task: Mutex::new(None),
        })
    }

    /// Spawn the TTL checker and run the first reconfiguration
    pub async fn start(self: &Arc<Self>) {
        {
            let mut ttl_task = self.ttl_task.lock().unwrap_or_else(PoisonError::into_inner);
            if ttl_task.is_none() {
                let token = CancellationToken::new();
                let handle = tokio::spawn(run_ttl_checker(Arc::clone(self), token.clone()));
                *ttl_task = Some((token, handle));
            }
        }
        self.start_monitoring().await;
    }

    /// Stop every background task and wait for it to exit
    pub async fn shutdown(&self) {
        let ttl_task = self
            .ttl_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let mut monitors = self.monitors.lock().await;
        let cancelled = self.write_state().cancel_all();

        if let Some((token, handle)) = ttl_task {
            token.cancel();
            join_task(handle).await;
        }
        for handle in monitors.drain(..) {
            join_task(handle).await;
        }
        info!("Registry stopped ({} monitor(s) cancelled)", cancelled);
    }

    /// Apply the current config and restart polling
    ///
    /// Old monitor tasks are cancelled under the registry lock and joined
    /// before the new ones are spawned, so two cycles never write the cache
    /// at the same time.
    pub async fn start_monitoring(self: &Arc<Self>) {
        let mut monitors = self.monitors.lock().await;
        let staged = self.stage_cycle();

        for handle in monitors.drain(..) {
            join_task(handle).await;
        }

        info!("Monitoring {} native source(s)", staged.len());
        for task in staged {
            monitors.push(tokio::spawn(run_monitor(Arc::clone(self), task)));
        }
    }

    /// Reset the registry for a new cycle and return the tasks to spawn
    fn stage_cycle(&self) -> Vec<MonitorTask> {
        let config = self.config.get_config();

        let mut guard = self.write_state();
        let state = &mut *guard;
        let cancelled = state.cancel_all();
        if cancelled > 0 {
            debug!("Cancelled {} monitor(s)", cancelled);
        }
        state.cache.clear();
        state.disabled = disabled_widgets(&config);

        let mut staged = Vec::new();
        for widget in config.widgets.iter().filter(|w| w.enabled) {
            let Some(source) = state.sources.get_mut(&widget.id) else {
                trace!("No source for widget {}", widget.id);
                continue;
            };
            if let Err(e) = source.apply_config(&merged_props(widget, &config)) {
                warn!("Failed to configure {}: {:#}", widget.id, e);
                continue;
            }

            match source {
                Source::Native(native) => {
                    if state.active.contains_key(&widget.id) {
                        warn!("Widget {} is listed twice in config", widget.id);
                        continue;
                    }
                    let token = CancellationToken::new();
                    staged.push(MonitorTask {
                        id: widget.id.clone(),
                        render_id: native.render_template().id.clone(),
                        interval: native.interval(),
                        source: native.handle(),
                        token: token.clone(),
                    });
                    state.active.insert(widget.id.clone(), token);
                }
                // Sidecars are not re-polled, so their last push survives the reset
                Source::Sidecar(sidecar) => {
                    let payload = if sidecar.is_offline() {
                        sidecar.current_data().map(|_| sidecar.offline_payload())
                    } else {
                        sidecar.current_data().cloned()
                    };
                    if let Some(payload) = payload {
                        state.cache.insert(sidecar.template().id.clone(), payload);
                    }
                }
            }
        }
        staged
    }

    /// Cache and emit a native sample
    ///
    /// Returns false if the sample was suppressed, either because nothing
    /// changed or because the task was cancelled in the meantime.
    fn publish_native(&self, task: &MonitorTask, payload: DataPayload, force: bool) -> bool {
        if !force {
            let state = self.read_state();
            if !payload_changed(state.cache.get(&task.render_id), &payload) {
                return false;
            }
        }

        let mut state = self.write_state();
        // A cancelled task must not write into the next cycle's cache
        if task.token.is_cancelled() {
            return false;
        }
        state
            .cache
            .insert(task.render_id.clone(), payload.clone());
        self.sink
            .emit(HudEvent::stats_update(task.render_id.clone(), payload));
        true
    }

    /// Announce a sidecar, optionally with its display template
    ///
    /// Ids owned by a native source are ignored. A template seen for the
    /// first time triggers a module reload and, if the widget is not in the
    /// config yet, a background save.
    pub fn register_sidecar(
        self: &Arc<Self>,
        id: &str,
        template: Option<RenderConfig>,
        schema: Option<Vec<ConfigSchema>>,
    ) {
        let template = template.filter(|template| {
            if !template.is_valid() {
                warn!("Ignoring template without component type from sidecar {}", id);
            }
            template.is_valid()
        });

        let gained_template = {
            let mut guard = self.write_state();
            let state = &mut *guard;
            if state.is_native(id) {
                debug!("Sidecar tried to register native id {}, ignoring", id);
                return;
            }

            let is_new = !state.sources.contains_key(id);
            let source = state
                .sources
                .entry(id.to_string())
                .or_insert_with(|| Source::Sidecar(SidecarSource::new(id)));
            let Some(sidecar) = source.as_sidecar_mut() else {
                return;
            };

            let had_template = sidecar.has_valid_template();
            if let Some(template) = &template {
                let schema = schema.clone().unwrap_or_else(|| sidecar.schema().to_vec());
                sidecar.update_template(template.clone(), schema);
            }
            sidecar.mark_seen();

            if is_new {
                info!("Registered sidecar {}", id);
            }
            !had_template && sidecar.has_valid_template()
        };

        if gained_template {
            self.sink.emit(HudEvent::ConfigReload);
        }

        if let Some(template) = template {
            if !self.config.get_config().contains_widget(id) {
                self.spawn_persist(id, template, schema.unwrap_or_default());
            }
        }
    }

    fn spawn_persist(self: &Arc<Self>, id: &str, template: RenderConfig, schema: Vec<ConfigSchema>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, not persisting sidecar {}", id);
            return;
        };
        let service = Arc::clone(self);
        let id = id.to_string();
        runtime.spawn(async move {
            service.ensure_sidecar_in_config(id, template, schema).await;
        });
    }

    async fn ensure_sidecar_in_config(
        self: Arc<Self>,
        id: String,
        template: RenderConfig,
        schema: Vec<ConfigSchema>,
    ) {
        let _guard = self.persist_lock.lock().await;

        let still_registered = self.read_state().sources.contains_key(&id);
        if !still_registered {
            debug!("Sidecar {} was removed before it could be saved", id);
            return;
        }
        let mut config = self.config.get_config();
        if config.contains_widget(&id) {
            return;
        }

        // Template props take precedence over schema defaults
        let mut props = ConfigSchema::defaults(&schema);
        props.extend(template.props);
        config.widgets.push(WidgetConfig {
            id: id.clone(),
            enabled: true,
            props,
            sidecar_type: Some(template.component_type),
            sidecar_title: Some(template.title),
        });

        match self.save_config(config).await {
            Ok(()) => info!("Detected new sidecar, added {} to config", id),
            Err(e) => warn!("Failed to save sidecar {} to config: {}", id, e),
        }
    }

    /// Accept a payload pushed by a sidecar
    ///
    /// Returns the widget's current settings for the sidecar to act on, or
    /// `None` if `id` is not a registered sidecar. Sidecar pushes are never
    /// diffed; every accepted push is emitted unless the widget is disabled.
    pub fn update_sidecar_data(&self, id: &str, payload: DataPayload) -> Option<Props> {
        let mut guard = self.write_state();
        let state = &mut *guard;
        let Some(Source::Sidecar(sidecar)) = state.sources.get_mut(id) else {
            trace!("Data for unknown sidecar {}", id);
            return None;
        };

        sidecar.mark_seen();
        sidecar.set_data(payload.clone());
        let props = sidecar.current_props().clone();

        if state.disabled.contains(id) {
            trace!("Sidecar {} is disabled, not publishing", id);
            return Some(props);
        }

        let render_id = sidecar.template().id.clone();
        state.cache.insert(render_id.clone(), payload.clone());
        self.sink.emit(HudEvent::stats_update(render_id, payload));
        Some(props)
    }

    /// Forget a sidecar and strip it from the config
    ///
    /// The config is written first; if that fails the registry is left as it
    /// was. Holds the persist lock so a pending background save cannot put
    /// the entry back.
    pub async fn remove_sidecar(&self, id: &str) -> RegistryResult<()> {
        let _guard = self.persist_lock.lock().await;

        let registered = match self.read_state().sources.get(id) {
            Some(Source::Native(_)) => return Err(RegistryError::ProtectedNative(id.to_string())),
            Some(Source::Sidecar(_)) => true,
            None => false,
        };

        let mut config = self.config.get_config();
        let before = config.widgets.len();
        config.widgets.retain(|w| w.id != id);
        let persisted = config.widgets.len() != before;
        if !registered && !persisted {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        if persisted {
            self.config.update_config(config)?;
        }

        {
            let mut guard = self.write_state();
            let state = &mut *guard;
            if let Some(source) = state.sources.remove(id) {
                state.cache.remove(source.render_id());
            }
            state.cache.remove(id);
            state.disabled.remove(id);
        }

        info!("Removed sidecar {}", id);
        self.sink.emit(HudEvent::ConfigReload);
        Ok(())
    }

    /// Persist a new config and reconfigure
    pub async fn save_config(self: &Arc<Self>, config: AppConfig) -> RegistryResult<()> {
        self.config.update_config(config)?;
        self.start_monitoring().await;
        Ok(())
    }

    pub fn get_config(&self) -> AppConfig {
        self.config.get_config()
    }

    /// Snapshot of every live widget, keyed by render id
    ///
    /// `filter` matches either the short id or the render id.
    pub fn get_stats(&self, filter: Option<&str>) -> StatsResponse {
        let filter = filter.filter(|f| !f.is_empty());
        let state = self.read_state();

        let mut widgets = BTreeMap::new();
        for (id, source) in &state.sources {
            if !state.is_active(id, source) {
                continue;
            }
            let template = source.render_template();
            if !template.is_valid() {
                continue;
            }
            if let Some(filter) = filter {
                if filter != id.as_str() && filter != template.id {
                    continue;
                }
            }

            widgets.insert(
                template.id.clone(),
                StatEntry {
                    id: template.id.clone(),
                    component_type: template.component_type.clone(),
                    title: template.title.clone(),
                    data: state.cache.get(&template.id).cloned(),
                    is_offline: source.is_offline(),
                },
            );
        }
        StatsResponse { widgets }
    }

    /// Every cached payload, keyed by render id
    ///
    /// Restored placeholders that have not pushed yet show up as offline.
    pub fn get_current_data(&self) -> BTreeMap<String, DataPayload> {
        let state = self.read_state();
        let mut data: BTreeMap<String, DataPayload> = state
            .cache
            .iter()
            .map(|(id, payload)| (id.clone(), payload.clone()))
            .collect();

        for (id, source) in &state.sources {
            let Some(sidecar) = source.as_sidecar() else {
                continue;
            };
            if sidecar.is_placeholder() && !state.disabled.contains(id) {
                data.entry(sidecar.template().id.clone())
                    .or_insert_with(DataPayload::offline_placeholder);
            }
        }
        data
    }

    /// Widgets the UI should lay out, in config order
    ///
    /// Sidecars not yet saved to the config are appended, sorted by id.
    pub fn get_modules(&self) -> Vec<ModuleInfo> {
        let config = self.config.get_config();
        let state = self.read_state();

        let mut modules = Vec::new();
        for widget in config.widgets.iter().filter(|w| w.enabled) {
            let Some(source) = state.sources.get(&widget.id) else {
                continue;
            };
            if source.render_template().is_valid() {
                modules.push(module_info(&widget.id, source));
            }
        }

        let mut unsaved: Vec<(&String, &Source)> = state
            .sources
            .iter()
            .filter(|(id, source)| {
                source.is_sidecar()
                    && !config.contains_widget(id)
                    && source.render_template().is_valid()
            })
            .collect();
        unsaved.sort_by(|a, b| a.0.cmp(b.0));
        modules.extend(unsaved.into_iter().map(|(id, source)| module_info(id, source)));
        modules
    }

    /// Settings form of a widget, by short id or render id
    pub fn get_module_config_schema(&self, id: &str) -> Vec<ConfigSchema> {
        self.read_state()
            .resolve(id)
            .map(|source| source.config_schema().to_vec())
            .unwrap_or_default()
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.read_state().sources.contains_key(id)
    }

    pub fn set_window_mode(&self, mode: &str) -> RegistryResult<()> {
        let window_mode: WindowMode = mode
            .parse()
            .map_err(|_| RegistryError::InvalidWindowMode(mode.to_string()))?;

        let mut config = self.config.get_config();
        config.window_mode = window_mode;
        self.config.update_config(config)?;

        info!("Window mode set to {}", window_mode);
        self.sink.emit(HudEvent::ModeChange(ModeChange {
            window_mode: Some(window_mode),
            edit_mode: None,
        }));
        Ok(())
    }

    /// Edit mode is a UI state only; it is announced but never saved
    pub fn set_edit_mode(&self, enabled: bool) {
        debug!("Edit mode {}", if enabled { "on" } else { "off" });
        self.sink.emit(HudEvent::ModeChange(ModeChange {
            window_mode: None,
            edit_mode: Some(enabled),
        }));
    }

    pub fn update_opacity(&self, opacity: f64) -> RegistryResult<()> {
        if !(MIN_OPACITY..=MAX_OPACITY).contains(&opacity) {
            return Err(RegistryError::OpacityOutOfRange {
                value: opacity,
                min: MIN_OPACITY,
                max: MAX_OPACITY,
            });
        }

        let mut config = self.config.get_config();
        config.opacity = opacity;
        self.config.update_config(config)?;

        self.sink.emit(HudEvent::ConfigUpdate(ConfigUpdate {
            opacity: Some(opacity),
        }));
        Ok(())
    }

    /// Flip sidecars that stopped pushing to offline
    ///
    /// Their last payload is kept and re-published with the offline marker.
    /// Returns how many sidecars went offline.
    pub fn check_sidecar_ttl(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.write_state();
        let state = &mut *guard;

        let mut expired = 0;
        for (id, source) in state.sources.iter_mut() {
            let Source::Sidecar(sidecar) = source else {
                continue;
            };
            if !sidecar.is_expired(now, SIDECAR_TTL) {
                continue;
            }

            let payload = sidecar.go_offline();
            expired += 1;
            info!("Sidecar {} timed out", id);
            if state.disabled.contains(id) {
                continue;
            }

            let render_id = sidecar.template().id.clone();
            state.cache.insert(render_id.clone(), payload.clone());
            self.sink.emit(HudEvent::stats_update(render_id, payload));
        }
        expired
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Widget props with the global overrides on top
fn merged_props(widget: &WidgetConfig, config: &AppConfig) -> Props {
    let mut props = widget.props.clone();
    props.insert(MINIMAL_MODE_PROP.to_string(), config.minimal_mode.into());
    props
}

fn disabled_widgets(config: &AppConfig) -> HashSet<String> {
    config
        .widgets
        .iter()
        .filter(|w| !w.enabled)
        .map(|w| w.id.clone())
        .collect()
}

fn module_info(id: &str, source: &Source) -> ModuleInfo {
    ModuleInfo {
        module_id: id.to_string(),
        config: source.render_template().clone(),
        enabled: true,
        is_sidecar: source.is_sidecar(),
    }
}

async fn join_task(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        if e.is_panic() {
            warn!("Background task panicked: {}", e);
        }
    }
}
