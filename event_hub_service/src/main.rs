mod config;
mod http;
mod telemetry;

use anyhow::Context;
use config::HubConfig;
use event_hub_memory::EventHub;
use event_hub_mock::{MockBroker, MockConfigReader};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let subscriber = telemetry::get_subscriber(
        "event_hub_service".into(),
        "info".into(),
        std::io::stdout,
    );
    telemetry::init_subscriber(subscriber);

    let config = HubConfig::from_env().context("failed to load configuration")?;
    tracing::info!(bind_addr = %config.bind_addr, "starting event hub service");

    // The broker and the channel-configuration store are external
    // collaborators outside this crate's scope (see PURPOSE & SCOPE). The
    // in-memory test doubles stand in for them here so the service is
    // runnable end-to-end without a deployment-specific adapter; a real
    // deployment swaps these two lines for its own `BrokerPort`/
    // `ConfigReaderPort` implementations.
    let broker = Arc::new(MockBroker::new());
    let config_reader = Arc::new(MockConfigReader::new());
    let hub = EventHub::new(broker, config_reader, config.hub_settings());

    let dispatcher_hub = hub.clone();
    let dispatcher_task = tokio::spawn(async move {
        if let Err(err) = dispatcher_hub.run_dispatcher().await {
            tracing::error!(error = %err, "dispatcher loop exited with an error");
        }
    });

    let app = http::router(hub.clone());
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    hub.request_shutdown();
    dispatcher_task
        .await
        .context("dispatcher task panicked during shutdown")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received, draining");
}
