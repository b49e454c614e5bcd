// structured logging setup: an `EnvFilter` gate, a bunyan-formatted JSON
// layer, and an error layer so `anyhow`/`thiserror` error chains are
// captured in spans. `tracing-log` bridges any plain `log`-facade output
// from dependencies into the same pipeline.

use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_error::ErrorLayer;
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Builds (without installing) a subscriber writing bunyan-formatted JSON to
/// `sink`. `RUST_LOG` overrides `default_filter` when set.
pub fn get_subscriber<Sink>(
    name: String,
    default_filter: String,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let formatting_layer = BunyanFormattingLayer::new(name, sink);
    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
        .with(ErrorLayer::default())
}

/// Installs `subscriber` as the process-wide default and bridges the `log`
/// facade. Call exactly once, at the top of `main`.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    LogTracer::init().expect("failed to bridge the log facade into tracing");
    set_global_default(subscriber).expect("failed to install the tracing subscriber");
}
