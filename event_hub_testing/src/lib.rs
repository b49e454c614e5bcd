//! Shared helpers for the integration tests under `tests/`, adapted from the
//! reference workspace's client-registry test-support module: unique test
//! identities, a fast-backoff `HubSettings` for tests, a way to run a hub's
//! dispatcher for the span of a test body, and a parallel-publisher helper
//! for stress scenarios.

use bytes::Bytes;
use event_hub_core::{Topic, UserId};
use event_hub_memory::{EventHub, HubSettings};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static USER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A fresh, unique `UserId` for a test, so parallel tests never collide.
pub fn unique_user(prefix: &str) -> UserId {
    let n = USER_COUNTER.fetch_add(1, Ordering::Relaxed);
    UserId::new(format!("{prefix}-{n}")).expect("prefix-n is always non-empty")
}

/// `HubSettings` tuned for fast, deterministic tests: short backoff and
/// drain windows so shutdown-driven tests complete quickly.
pub fn test_settings() -> HubSettings {
    HubSettings {
        outbox_cap: 100,
        shard_count: 16,
        backoff_min_ms: 5,
        backoff_max_ms: 20,
        drain_timeout_ms: 100,
    }
}

/// Runs `hub`'s dispatcher for the duration of `body`, then requests
/// shutdown and waits for the dispatch loop to stop. Panics if it does not
/// stop within a generous timeout — a hang here means a real bug, not a
/// slow CI box.
pub async fn run_hub_briefly<F, Fut>(hub: EventHub, body: F)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    let handle = {
        let hub = hub.clone();
        tokio::spawn(async move { hub.run_dispatcher().await })
    };
    body().await;
    hub.request_shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("dispatcher did not stop within the timeout")
        .expect("dispatcher task panicked")
        .expect("dispatcher returned an error");
}

/// Polls `condition` until it returns `true` or `timeout` elapses. Used for
/// the asynchronous, best-effort steps in the hub's contract (topic
/// materialization after `register_client`) where there is no direct signal
/// to await.
pub async fn wait_until(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Publishes `count` payloads to `topic` concurrently through `hub`,
/// exercising the same-topic fan-in path many producers share.
pub async fn spawn_parallel_publishers(
    hub: &EventHub,
    topic: &Topic,
    count: usize,
    payload_for: impl Fn(usize) -> Bytes,
) {
    let mut tasks = Vec::with_capacity(count);
    for i in 0..count {
        let hub = hub.clone();
        let topic = topic.clone();
        let payload = payload_for(i);
        tasks.push(tokio::spawn(
            async move { hub.publish(&topic, payload).await },
        ));
    }
    for task in tasks {
        task.await
            .expect("publisher task panicked")
            .expect("publish failed");
    }
}
