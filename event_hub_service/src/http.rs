// minimal liveness/metrics surface. This is glue, not a feature addition to
// the hub's delivery contract: HTTP framing, auth, and routing for the
// streaming connections themselves live outside this crate.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use event_hub_memory::EventHub;
use tower_http::trace::TraceLayer;

pub fn router(hub: EventHub) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(hub)
        .layer(TraceLayer::new_for_http())
}

async fn health(State(hub): State<EventHub>) -> String {
    format!("dispatcher_state={:?}\n", hub.dispatcher_state())
}

/// Plain-text counters, not a Prometheus exporter — that integration is left
/// to the deployment layer.
async fn metrics(State(hub): State<EventHub>) -> String {
    format!(
        "event_hub_drops_total {}\nevent_hub_live_users {}\n",
        hub.total_drops(),
        hub.live_user_count(),
    )
}
