use super::*;
use crate::events::RecordingSink;
use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use vitals_hud_core::{MetricSource, WidgetSource};
use vitals_hud_types::{ComponentType, ConfigType, OFFLINE_PROP};

enum Mode {
    Counting,
    Constant,
    FailAfterFirst,
}

struct Stub {
    id: &'static str,
    mode: Mode,
    ticks: u64,
    minimal: bool,
}

impl WidgetSource for Stub {
    fn id(&self) -> &str {
        self.id
    }

    fn render_template(&self) -> RenderConfig {
        let component = if self.minimal {
            ComponentType::key_value()
        } else {
            ComponentType::gauge()
        };
        RenderConfig::new(format!("hud.test.{}", self.id), component, self.id)
    }

    fn config_schema(&self) -> Vec<ConfigSchema> {
        vec![ConfigSchema::new(
            "alert_threshold",
            "Alert Threshold (%)",
            ConfigType::Number,
            80.0,
        )]
    }

    fn apply_config(&mut self, props: &Props) {
        self.minimal = props
            .get(MINIMAL_MODE_PROP)
            .and_then(Value::as_bool)
            .unwrap_or(false);
    }
}

impl MetricSource for Stub {
    fn update(&mut self) -> Result<DataPayload> {
        self.ticks += 1;
        match self.mode {
            Mode::Counting => Ok(DataPayload::with_value(self.ticks)),
            Mode::Constant => Ok(DataPayload::with_value(42)),
            Mode::FailAfterFirst if self.ticks == 1 => Ok(DataPayload::with_value(1)),
            Mode::FailAfterFirst => Err(anyhow!("sensor gone")),
        }
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(1)
    }
}

fn native(id: &'static str, mode: Mode) -> NativeSource {
    NativeSource::new(Stub {
        id,
        mode,
        ticks: 0,
        minimal: false,
    })
}

fn config_with(ids: &[&str]) -> AppConfig {
    AppConfig {
        widgets: ids.iter().map(|id| WidgetConfig::new(*id, true)).collect(),
        ..Default::default()
    }
}

fn sidecar_entry(id: &str, enabled: bool) -> WidgetConfig {
    WidgetConfig {
        sidecar_type: Some(ComponentType::key_value()),
        sidecar_title: Some("GPU".to_string()),
        ..WidgetConfig::new(id, enabled)
    }
}

fn template(title: &str) -> RenderConfig {
    RenderConfig::new("whatever", ComponentType::key_value(), title)
}

fn setup(
    natives: Vec<NativeSource>,
    config: AppConfig,
) -> (Arc<SystemService>, Arc<RecordingSink>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(ConfigService::with_config(
        dir.path().join("config.json"),
        config,
    ));
    let sink = Arc::new(RecordingSink::new());
    let service = SystemService::new(config, natives, sink.clone());
    (service, sink, dir)
}

/// Let spawned tasks run to their next timer
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn values(events: &[HudEvent]) -> Vec<Value> {
    events
        .iter()
        .filter_map(|event| match event {
            HudEvent::StatsUpdate(update) => update.data.value.clone(),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_first_sample_always_emitted_then_suppressed() {
    let (service, sink, _dir) = setup(vec![native("temp", Mode::Constant)], config_with(&["temp"]));
    service.start_monitoring().await;

    tokio::time::sleep(Duration::from_millis(5500)).await;
    assert_eq!(sink.stats_updates("hud.test.temp").len(), 1);

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_changing_native_emits_every_tick() {
    let (service, sink, _dir) = setup(vec![native("a", Mode::Counting)], config_with(&["a"]));
    service.start_monitoring().await;

    tokio::time::sleep(Duration::from_millis(3500)).await;
    let updates = sink.stats_updates("hud.test.a");
    assert_eq!(values(&updates), vec![json!(1), json!(2), json!(3), json!(4)]);

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_sampling_error_keeps_cached_value() {
    let (service, sink, _dir) = setup(
        vec![native("flaky", Mode::FailAfterFirst)],
        config_with(&["flaky"]),
    );
    service.start_monitoring().await;

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(sink.stats_updates("hud.test.flaky").len(), 1);
    let stats = service.get_stats(Some("flaky"));
    assert_eq!(
        stats.widgets["hud.test.flaky"].data.as_ref().unwrap().value,
        Some(json!(1))
    );

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stats_filter_matches_short_or_render_id() {
    let (service, _sink, _dir) = setup(
        vec![native("a", Mode::Constant), native("b", Mode::Constant)],
        config_with(&["a", "b"]),
    );
    service.start_monitoring().await;
    settle().await;

    assert_eq!(service.get_stats(None).widgets.len(), 2);
    let by_short = service.get_stats(Some("a"));
    let by_render = service.get_stats(Some("hud.test.a"));
    assert_eq!(by_short, by_render);
    assert_eq!(by_short.widgets.len(), 1);
    let entry = &by_short.widgets["hud.test.a"];
    assert_eq!(entry.id, "hud.test.a");
    assert_eq!(entry.title, "a");
    assert!(!entry.is_offline);
    assert!(service.get_stats(Some("nope")).widgets.is_empty());

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_natives_hidden_until_monitoring_starts() {
    let (service, _sink, _dir) = setup(vec![native("a", Mode::Constant)], config_with(&["a"]));
    assert!(service.get_stats(None).widgets.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disabling_widget_stops_updates() {
    let (service, sink, _dir) = setup(
        vec![native("a", Mode::Counting), native("b", Mode::Counting)],
        config_with(&["a", "b"]),
    );
    service.start_monitoring().await;
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let mut config = service.get_config();
    config.widgets[1].enabled = false;
    service.save_config(config).await.unwrap();
    sink.clear();
    tokio::time::sleep(Duration::from_millis(3000)).await;

    assert!(sink.stats_updates("hud.test.b").is_empty());
    assert!(!sink.stats_updates("hud.test.a").is_empty());
    assert!(service.get_stats(Some("b")).widgets.is_empty());
    let modules: Vec<String> = service.get_modules().into_iter().map(|m| m.module_id).collect();
    assert_eq!(modules, vec!["a".to_string()]);
    assert!(!service.get_current_data().contains_key("hud.test.b"));

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reconfiguration_replaces_monitors() {
    let (service, _sink, _dir) = setup(
        vec![native("a", Mode::Counting), native("b", Mode::Counting)],
        config_with(&["a", "b"]),
    );
    service.start_monitoring().await;
    service.start_monitoring().await;
    service.start_monitoring().await;

    assert_eq!(service.monitors.lock().await.len(), 2);
    assert_eq!(service.read_state().active.len(), 2);

    service.shutdown().await;
    assert!(service.monitors.lock().await.is_empty());
    assert!(service.read_state().active.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_task_does_not_write_cache() {
    let (service, sink, _dir) = setup(vec![native("a", Mode::Constant)], config_with(&["a"]));
    let token = CancellationToken::new();
    token.cancel();
    let task = MonitorTask {
        id: "a".to_string(),
        render_id: "hud.test.a".to_string(),
        interval: Duration::from_secs(1),
        source: native("a", Mode::Constant).handle(),
        token,
    };

    assert!(!service.publish_native(&task, DataPayload::with_value(1), true));
    assert!(service.get_current_data().is_empty());
    assert!(sink.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_global_minimal_mode_reaches_sources() {
    let mut config = config_with(&["a"]);
    config.minimal_mode = true;
    let (service, _sink, _dir) = setup(vec![native("a", Mode::Constant)], config);
    service.start_monitoring().await;

    let modules = service.get_modules();
    assert_eq!(modules[0].config.component_type, ComponentType::key_value());
    assert_eq!(modules[0].config.id, "hud.test.a");
    assert!(!modules[0].is_sidecar);

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_sidecar_pushes_are_never_suppressed() {
    let (service, sink, _dir) = setup(Vec::new(), AppConfig::default());
    service.register_sidecar("custom.x", Some(template("X")), None);
    settle().await;

    let payload = DataPayload::with_value(7);
    assert!(service.update_sidecar_data("custom.x", payload.clone()).is_some());
    assert!(service.update_sidecar_data("custom.x", payload).is_some());
    assert_eq!(sink.stats_updates("custom.x").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_push_to_unknown_or_native_is_none() {
    let (service, sink, _dir) = setup(vec![native("a", Mode::Constant)], config_with(&["a"]));
    assert!(service
        .update_sidecar_data("custom.nobody", DataPayload::with_value(1))
        .is_none());
    assert!(service.update_sidecar_data("a", DataPayload::with_value(1)).is_none());
    assert!(sink.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sidecar_cannot_take_native_id() {
    let (service, sink, _dir) = setup(vec![native("a", Mode::Constant)], config_with(&["a"]));
    service.register_sidecar("a", Some(template("Impostor")), None);
    settle().await;

    assert_eq!(sink.count("config-reload"), 0);
    assert_eq!(service.get_module_config_schema("a").len(), 1);
    let config = service.get_config();
    assert_eq!(config.widgets.len(), 1);
    assert!(config.widgets[0].sidecar_type.is_none());
    service.start_monitoring().await;
    assert_eq!(service.get_modules()[0].config.title, "a");

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_template_id_is_forced_to_sidecar_id() {
    let (service, _sink, _dir) = setup(Vec::new(), AppConfig::default());
    service.register_sidecar("custom.x", Some(template("X")), None);
    service.update_sidecar_data("custom.x", DataPayload::with_value(1));

    let modules = service.get_modules();
    assert_eq!(modules[0].config.id, "custom.x");
    assert!(service.get_stats(None).widgets.contains_key("custom.x"));
    assert!(!service.get_current_data().contains_key("whatever"));
}

#[tokio::test(start_paused = true)]
async fn test_reload_only_when_template_first_appears() {
    let (service, sink, _dir) = setup(Vec::new(), AppConfig::default());

    service.register_sidecar("custom.x", None, None);
    assert_eq!(sink.count("config-reload"), 0);
    assert!(service.get_modules().is_empty());

    service.register_sidecar("custom.x", Some(template("X")), None);
    assert_eq!(sink.count("config-reload"), 1);

    service.register_sidecar("custom.x", Some(template("X again")), None);
    service.register_sidecar("custom.x", None, None);
    assert_eq!(sink.count("config-reload"), 1);
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn test_invalid_template_is_ignored() {
    let (service, sink, _dir) = setup(Vec::new(), AppConfig::default());
    let broken = RenderConfig::new("x", ComponentType::new(" "), "Broken");
    service.register_sidecar("custom.x", Some(broken), None);
    settle().await;

    assert!(service.has_source("custom.x"));
    assert_eq!(sink.count("config-reload"), 0);
    assert!(service.get_config().widgets.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_new_sidecar_is_saved_with_schema_defaults() {
    let (service, _sink, dir) = setup(Vec::new(), AppConfig::default());
    let schema = vec![
        ConfigSchema::new("max", "Max", ConfigType::Number, 100.0),
        ConfigSchema::new("unit", "Unit", ConfigType::Text, "C"),
    ];
    let gpu_template = template("GPU").with_prop("unit", "%");
    service.register_sidecar("custom.gpu", Some(gpu_template), Some(schema));
    settle().await;

    let config = service.get_config();
    let widget = config.widget("custom.gpu").unwrap();
    assert!(widget.enabled);
    assert_eq!(widget.sidecar_type, Some(ComponentType::key_value()));
    assert_eq!(widget.sidecar_title.as_deref(), Some("GPU"));
    assert_eq!(widget.props.get("max"), Some(&json!(100.0)));
    assert_eq!(widget.props.get("unit"), Some(&json!("%")));
    assert!(dir.path().join("config.json").exists());
    assert_eq!(service.get_module_config_schema("custom.gpu").len(), 2);

    // Registering again does not duplicate the entry
    service.register_sidecar("custom.gpu", Some(template("GPU")), None);
    settle().await;
    assert_eq!(service.get_config().widgets.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_saved_props_are_echoed_to_sidecar() {
    let mut config = AppConfig::default();
    let mut widget = sidecar_entry("custom.gpu", true);
    widget.props.insert("max".to_string(), json!(5));
    config.widgets.push(widget);
    let (service, _sink, _dir) = setup(Vec::new(), config);
    service.start_monitoring().await;

    let props = service
        .update_sidecar_data("custom.gpu", DataPayload::with_value(1))
        .unwrap();
    assert_eq!(props.get("max"), Some(&json!(5)));
    assert_eq!(props.get(MINIMAL_MODE_PROP), Some(&json!(false)));
}

#[tokio::test(start_paused = true)]
async fn test_silent_sidecar_goes_offline_after_ttl() {
    let (service, sink, _dir) = setup(Vec::new(), AppConfig::default());
    service.register_sidecar("custom.x", Some(template("X")), None);
    settle().await;
    let mut payload = DataPayload::with_value(55);
    payload.set_prop("color", "#fff");
    service.update_sidecar_data("custom.x", payload);
    sink.clear();

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(service.check_sidecar_ttl(), 0);
    assert!(!service.get_stats(None).widgets["custom.x"].is_offline);

    tokio::time::advance(Duration::from_secs(10)).await;
    assert_eq!(service.check_sidecar_ttl(), 1);
    let entry = &service.get_stats(None).widgets["custom.x"];
    assert!(entry.is_offline);
    let data = entry.data.as_ref().unwrap();
    assert_eq!(data.value, Some(json!(55)));
    assert_eq!(data.prop(OFFLINE_PROP), Some(&json!(true)));
    assert_eq!(data.prop("color"), Some(&json!("#fff")));
    assert_eq!(sink.stats_updates("custom.x").len(), 1);

    // Already offline, nothing more to do
    assert_eq!(service.check_sidecar_ttl(), 0);

    // A push brings it back
    service.update_sidecar_data("custom.x", DataPayload::with_value(56));
    assert!(!service.get_stats(None).widgets["custom.x"].is_offline);
}

#[tokio::test(start_paused = true)]
async fn test_ttl_task_runs_after_start() {
    let (service, sink, _dir) = setup(Vec::new(), AppConfig::default());
    service.start().await;
    service.register_sidecar("custom.x", Some(template("X")), None);
    service.update_sidecar_data("custom.x", DataPayload::with_value(1));

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert!(service.get_stats(None).widgets["custom.x"].is_offline);
    assert!(sink
        .stats_updates("custom.x")
        .iter()
        .any(|event| matches!(event, HudEvent::StatsUpdate(u) if u.data.is_offline())));

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_restored_placeholder_is_laid_out_offline() {
    let mut config = config_with(&["a"]);
    config.widgets.push(sidecar_entry("custom.gpu", true));
    config.widgets.push(WidgetConfig::new("custom.nometa", true));
    let (service, _sink, _dir) = setup(vec![native("a", Mode::Constant)], config);

    assert!(service.has_source("custom.gpu"));
    assert!(!service.has_source("custom.nometa"));

    let modules = service.get_modules();
    let gpu = modules.iter().find(|m| m.module_id == "custom.gpu").unwrap();
    assert!(gpu.is_sidecar);
    assert_eq!(gpu.config.title, "GPU");

    let data = service.get_current_data();
    assert!(data["custom.gpu"].is_offline());
    assert!(data["custom.gpu"].value.is_none());
    assert!(service.get_stats(Some("custom.gpu")).widgets["custom.gpu"].is_offline);

    // Restored placeholders are already offline; the TTL leaves them alone
    tokio::time::advance(Duration::from_secs(30)).await;
    assert_eq!(service.check_sidecar_ttl(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_sidecar_push_is_stored_not_published() {
    let mut config = AppConfig::default();
    config.widgets.push(sidecar_entry("custom.gpu", false));
    let (service, sink, _dir) = setup(Vec::new(), config);
    service.start_monitoring().await;

    assert!(service
        .update_sidecar_data("custom.gpu", DataPayload::with_value(3))
        .is_some());
    assert!(sink.events().is_empty());
    assert!(service.get_current_data().is_empty());
    assert!(service.get_stats(None).widgets.is_empty());
    assert!(service.get_modules().is_empty());

    // Timing out while disabled is silent too
    tokio::time::advance(Duration::from_secs(11)).await;
    assert_eq!(service.check_sidecar_ttl(), 1);
    assert!(sink.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unsaved_sidecars_follow_config_order_sorted() {
    let (service, _sink, _dir) = setup(vec![native("a", Mode::Constant)], config_with(&["a"]));
    service.start_monitoring().await;

    // No await in between, so neither has been saved yet
    service.register_sidecar("custom.b", Some(template("B")), None);
    service.register_sidecar("custom.a", Some(template("A")), None);
    let ids: Vec<String> = service.get_modules().into_iter().map(|m| m.module_id).collect();
    assert_eq!(ids, vec!["a", "custom.a", "custom.b"]);

    settle().await;
    let saved: Vec<String> = service
        .get_config()
        .widgets
        .into_iter()
        .map(|w| w.id)
        .collect();
    assert_eq!(saved, vec!["a", "custom.b", "custom.a"]);

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_schema_lookup_by_render_id() {
    let (service, _sink, _dir) = setup(vec![native("a", Mode::Constant)], config_with(&["a"]));
    assert_eq!(service.get_module_config_schema("hud.test.a").len(), 1);
    assert_eq!(service.get_module_config_schema("a")[0].name, "alert_threshold");
    assert!(service.get_module_config_schema("unknown").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_remove_sidecar_clears_everything() {
    let (service, sink, _dir) = setup(Vec::new(), AppConfig::default());
    service.register_sidecar("custom.x", Some(template("X")), None);
    settle().await;
    service.update_sidecar_data("custom.x", DataPayload::with_value(1));
    sink.clear();

    service.remove_sidecar("custom.x").await.unwrap();
    assert!(!service.has_source("custom.x"));
    assert!(!service.get_config().contains_widget("custom.x"));
    assert!(service.get_current_data().is_empty());
    assert!(service.get_modules().is_empty());
    assert_eq!(sink.count("config-reload"), 1);

    assert!(matches!(
        service.remove_sidecar("custom.x").await,
        Err(RegistryError::NotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_first_push_survives_background_save() {
    let (service, _sink, _dir) = setup(Vec::new(), AppConfig::default());
    service.register_sidecar("custom.gpu", Some(template("GPU")), None);
    service.update_sidecar_data("custom.gpu", DataPayload::with_value(55));
    settle().await;

    assert!(service.get_config().contains_widget("custom.gpu"));
    let stats = service.get_stats(Some("custom.gpu"));
    assert_eq!(
        stats.widgets["custom.gpu"].data.as_ref().unwrap().value,
        Some(json!(55))
    );
    assert_eq!(service.get_current_data()["custom.gpu"].value, Some(json!(55)));
}

#[tokio::test(start_paused = true)]
async fn test_offline_sidecar_keeps_marker_across_reconfiguration() {
    let (service, _sink, _dir) = setup(Vec::new(), AppConfig::default());
    service.register_sidecar("custom.x", Some(template("X")), None);
    service.update_sidecar_data("custom.x", DataPayload::with_value(9));
    settle().await;

    tokio::time::advance(Duration::from_secs(11)).await;
    assert_eq!(service.check_sidecar_ttl(), 1);
    service.start_monitoring().await;

    let data = &service.get_current_data()["custom.x"];
    assert_eq!(data.value, Some(json!(9)));
    assert!(data.is_offline());
}

#[tokio::test(start_paused = true)]
async fn test_remove_before_background_save_leaves_no_entry() {
    let (service, sink, dir) = setup(Vec::new(), AppConfig::default());
    service.register_sidecar("custom.gpu", Some(template("GPU")), None);
    service.remove_sidecar("custom.gpu").await.unwrap();
    settle().await;

    assert!(!service.has_source("custom.gpu"));
    assert!(!service.get_config().contains_widget("custom.gpu"));
    let path = dir.path().join("config.json");
    if path.exists() {
        let saved = std::fs::read_to_string(path).unwrap();
        assert!(!saved.contains("custom.gpu"));
    }
    assert_eq!(sink.count("config-reload"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_remove_waits_for_pending_save() {
    let (service, _sink, _dir) = setup(Vec::new(), AppConfig::default());
    let held = service.persist_lock.lock().await;
    service.register_sidecar("custom.gpu", Some(template("GPU")), None);

    // The save is queued behind the held lock; removal queues behind it too
    let remover = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.remove_sidecar("custom.gpu").await })
    };
    settle().await;
    assert!(service.has_source("custom.gpu"));
    drop(held);

    remover.await.unwrap().unwrap();
    settle().await;
    assert!(!service.has_source("custom.gpu"));
    assert!(!service.get_config().contains_widget("custom.gpu"));
}

#[tokio::test(start_paused = true)]
async fn test_remove_native_is_refused() {
    let (service, sink, _dir) = setup(vec![native("a", Mode::Constant)], config_with(&["a"]));
    service.start_monitoring().await;
    settle().await;
    sink.clear();

    assert!(matches!(
        service.remove_sidecar("a").await,
        Err(RegistryError::ProtectedNative(_))
    ));
    assert!(service.has_source("a"));
    assert!(service.get_config().contains_widget("a"));
    assert!(service.get_current_data().contains_key("hud.test.a"));
    assert!(sink.events().is_empty());

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_remove_with_failing_save_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("config.json");
    std::fs::create_dir(&blocked).unwrap();
    let mut config = AppConfig::default();
    config.widgets.push(sidecar_entry("custom.gpu", true));
    let config = Arc::new(ConfigService::with_config(blocked, config));
    let sink = Arc::new(RecordingSink::new());
    let service = SystemService::new(config, Vec::new(), sink.clone());

    assert!(matches!(
        service.remove_sidecar("custom.gpu").await,
        Err(RegistryError::Persist(_))
    ));
    assert!(service.has_source("custom.gpu"));
    assert!(service.get_config().contains_widget("custom.gpu"));
    assert!(sink.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_window_mode_validation() {
    let (service, sink, _dir) = setup(Vec::new(), AppConfig::default());

    assert!(matches!(
        service.set_window_mode("floating"),
        Err(RegistryError::InvalidWindowMode(_))
    ));
    assert!(sink.events().is_empty());

    service.set_window_mode("locked").unwrap();
    assert_eq!(service.get_config().window_mode, WindowMode::Locked);
    assert_eq!(
        sink.events(),
        vec![HudEvent::ModeChange(ModeChange {
            window_mode: Some(WindowMode::Locked),
            edit_mode: None,
        })]
    );
}

#[tokio::test(start_paused = true)]
async fn test_opacity_validation() {
    let (service, sink, _dir) = setup(Vec::new(), AppConfig::default());

    for bad in [0.05, 1.5, f64::NAN] {
        assert!(matches!(
            service.update_opacity(bad),
            Err(RegistryError::OpacityOutOfRange { .. })
        ));
    }
    assert!(sink.events().is_empty());

    service.update_opacity(0.5).unwrap();
    assert_eq!(service.get_config().opacity, 0.5);
    assert_eq!(sink.count("config-update"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_edit_mode_is_only_announced() {
    let (service, sink, dir) = setup(Vec::new(), AppConfig::default());
    service.set_edit_mode(true);

    assert_eq!(
        sink.events(),
        vec![HudEvent::ModeChange(ModeChange {
            window_mode: None,
            edit_mode: Some(true),
        })]
    );
    assert!(!dir.path().join("config.json").exists());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_silences_everything() {
    let (service, sink, _dir) = setup(vec![native("a", Mode::Counting)], config_with(&["a"]));
    service.start().await;
    service.register_sidecar("custom.x", Some(template("X")), None);
    settle().await;
    service.update_sidecar_data("custom.x", DataPayload::with_value(1));

    service.shutdown().await;
    sink.clear();
    tokio::time::sleep(Duration::from_secs(20)).await;

    assert!(sink.events().is_empty());
    assert!(service.ttl_task.lock().unwrap().is_none());
}
