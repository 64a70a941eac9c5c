use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use vitals_hud::config::default_config_dir;
use vitals_hud::{BroadcastSink, ConfigService, HudEvent, SystemService, DEFAULT_API_ADDR};
use vitals_hud_sources::builtin_sources;

#[derive(Parser, Debug, Clone)]
#[command(name = "vitals-hud")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding config.json (defaults to the per-user config dir)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// List built-in sources and exit
    #[arg(short = 'l', long = "list")]
    list_sources: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    warn!("Starting vitals-hud v{}", env!("CARGO_PKG_VERSION"));

    let natives = builtin_sources();
    if cli.list_sources {
        list_builtin_sources(&natives);
        return Ok(());
    }

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => default_config_dir()?,
    };
    let config = Arc::new(ConfigService::new(&config_dir, &natives));

    let sink = BroadcastSink::default();
    let events = sink.subscribe();
    let service = SystemService::new(config, natives, Arc::new(sink));

    let printer = tokio::spawn(log_events(events));
    service.start().await;
    info!(
        "Registry running, sidecar API expected at {}",
        DEFAULT_API_ADDR
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    warn!("Shutting down");
    service.shutdown().await;
    printer.abort();
    Ok(())
}

/// Print built-in source ids to stdout
fn list_builtin_sources(natives: &[vitals_hud_core::NativeSource]) {
    println!("Built-in sources ({}):", natives.len());
    println!();
    for native in natives {
        let template = native.render_template();
        println!(
            "  {:<6} {:<16} {} (every {:?})",
            native.id(),
            template.id,
            template.title,
            native.interval()
        );
    }
}

/// Stand-in for the UI: log every notification as it would be delivered
async fn log_events(mut events: tokio::sync::broadcast::Receiver<HudEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match event.widget_id() {
                Some(id) => log::debug!("{} {}", event.name(), id),
                None => info!("{} {}", event.name(), event.payload()),
            },
            Err(RecvError::Lagged(missed)) => {
                log::debug!("Event log fell behind, skipped {} event(s)", missed);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
