use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use rum_scopes::events::RumEvent;
use rum_scopes::kernel::command::{ActionType, Command, ErrorSource, HttpMethod};
use rum_scopes::kernel::context::{Connectivity, ConnectivityStatus, DeviceContext, RumUuid};
use rum_scopes::kernel::identity::ViewIdentity;
use rum_scopes::kernel::time::Timestamp;
use rum_scopes::pipeline::{drain_to_store, ChannelWriter, EventStore};
use rum_scopes::{Dependencies, Monitor, RumConfig, RumError};

/// Prints every finished event as one JSON line.
struct StdoutStore;

impl EventStore for StdoutStore {
    fn store(&mut self, event: RumEvent) -> Result<(), RumError> {
        let line = serde_json::to_string(&event).map_err(|e| RumError::Store(e.to_string()))?;
        println!("{}", line);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match RumConfig::from_env() {
        Ok(config) => config,
        Err(RumError::MissingApplicationId) => RumConfig::new("demo-application"),
        Err(e) => return Err(e).context("loading RUM configuration"),
    };
    tracing::info!("RUM engine booting for application {}", config.application_id);

    let (writer, events_rx) = ChannelWriter::new();
    let store_task = tokio::spawn(drain_to_store(events_rx, StdoutStore));

    let (device_tx, device_rx) = watch::channel(DeviceContext::default());
    let deps = Dependencies::new(&config, Arc::new(writer))
        .with_device_context(device_rx)
        .with_session_listener(Arc::new(|id: RumUuid, sampled_out: bool| {
            tracing::info!("Session {} started (sampled out: {})", id, sampled_out);
        }));

    let (mut monitor, commands) = Monitor::channel(deps, 100);
    let monitor_task = tokio::spawn(async move {
        monitor.run().await;
        monitor
    });

    // Scripted walk through one screen.
    let t0 = Timestamp::now();
    let at = |ms: u64| t0.plus(Duration::from_millis(ms));
    let home = ViewIdentity::value("HomeScreen");

    device_tx.send_replace(DeviceContext {
        connectivity: Connectivity {
            status: ConnectivityStatus::Connected,
            interfaces: vec!["wifi".to_string()],
        },
        ..DeviceContext::default()
    });

    let script = vec![
        Command::start_view(at(0), home.clone(), Some("Home"), Some("app/home")),
        Command::add_action(at(250), ActionType::Tap, "refresh"),
        Command::start_resource(at(260), "feed", "https://api.example.com/feed", HttpMethod::Get),
        Command::stop_resource(at(640), "feed", Some(200), Some(4_096)),
        Command::add_view_error(at(900), "image decode failed", ErrorSource::Source),
        Command::stop_view(at(1_500), home),
    ];
    for command in script {
        commands.send(command).await.map_err(|_| RumError::ChannelClosed)?;
    }
    drop(commands);

    let monitor = monitor_task.await.context("monitor task panicked")?;
    tracing::info!("Telemetry: {:?}", monitor.telemetry.snapshot());
    drop(monitor);

    let stored = store_task.await.context("store task panicked")?;
    tracing::info!("{} events handed to storage", stored);
    Ok(())
}
