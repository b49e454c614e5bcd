// broker-pattern dispatch loop: subscribe once for every topic family,
// demultiplex incoming messages, hand off to the client table. One loop is
// typical; the client table already scales fan-out across shards.

use crate::client_table::ClientTable;
use crate::topic_registry::TopicRegistry;
use event_hub_core::{BrokerMessage, BrokerPort, BrokerStream, HubResult, ALL_PREFIXES};
use futures_util::StreamExt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum DispatcherState {
    Starting = 0,
    Running = 1,
    Draining = 2,
    Stopped = 3,
}

impl DispatcherState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Starting,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub backoff_min: Duration,
    pub backoff_max: Duration,
    pub drain_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            backoff_min: Duration::from_millis(1000),
            backoff_max: Duration::from_millis(30_000),
            drain_timeout: Duration::from_millis(5000),
        }
    }
}

/// Owns the broker subscription and the running/draining/stopped state
/// machine. `registry` and `client_table` are shared with the rest of the
/// hub via `Arc`.
pub struct Dispatcher {
    broker: Arc<dyn BrokerPort>,
    registry: Arc<TopicRegistry>,
    client_table: Arc<ClientTable>,
    config: DispatcherConfig,
    state: AtomicU8,
    shutdown: Notify,
}

impl Dispatcher {
    pub fn new(
        broker: Arc<dyn BrokerPort>,
        registry: Arc<TopicRegistry>,
        client_table: Arc<ClientTable>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            broker,
            registry,
            client_table,
            config,
            state: AtomicU8::new(DispatcherState::Starting as u8),
            shutdown: Notify::new(),
        }
    }

    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: DispatcherState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Terminal transition: flips to `Stopped` and closes every outstanding
    /// client outbox. Idempotent (`ClientTable::shutdown` itself is).
    fn stop(&self) {
        self.set_state(DispatcherState::Stopped);
        self.client_table.shutdown();
    }

    /// Moves the dispatcher into `Draining`. Idempotent. `run` observes this
    /// on its next loop iteration and, once it does, unsubscribes and drains
    /// for at most `drain_timeout` before stopping.
    pub fn request_shutdown(&self) {
        self.set_state(DispatcherState::Draining);
        self.shutdown.notify_waiters();
    }

    /// Runs the subscribe/receive/dispatch loop until shutdown completes.
    /// A transient broker error or unexpectedly-closed stream while
    /// `Running` is logged and retried with exponential backoff; the same
    /// condition while `Draining` is treated as the normal end of drain.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> HubResult<()> {
        let patterns: Vec<String> = ALL_PREFIXES.iter().map(|p| format!("{p}*")).collect();
        let mut backoff = self.config.backoff_min;

        loop {
            if self.state() == DispatcherState::Stopped {
                return Ok(());
            }

            let stream = match self.broker.psubscribe(&patterns).await {
                Ok(stream) => {
                    backoff = self.config.backoff_min;
                    stream
                }
                Err(err) => {
                    if self.state() == DispatcherState::Draining {
                        self.stop();
                        return Ok(());
                    }
                    tracing::warn!(
                        error = %err,
                        backoff_ms = backoff.as_millis() as u64,
                        "broker subscribe failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.config.backoff_max);
                    continue;
                }
            };
            if self.state() != DispatcherState::Draining {
                self.set_state(DispatcherState::Running);
            }

            match self.drain_stream(stream).await {
                Ok(()) => {
                    self.stop();
                    return Ok(());
                }
                Err(()) => {
                    tracing::warn!(
                        backoff_ms = backoff.as_millis() as u64,
                        "broker stream ended unexpectedly, reconnecting"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.config.backoff_max);
                }
            }
        }
    }

    /// Consumes `stream` until shutdown is requested (returns `Ok(())`, an
    /// orderly drain) or the stream ends on its own while still `Running`
    /// (returns `Err(())`, a reconnect-worthy condition).
    async fn drain_stream(&self, mut stream: BrokerStream) -> Result<(), ()> {
        loop {
            let notified = self.shutdown.notified();
            tokio::pin!(notified);
            // Registers this waiter before we check state, so a
            // `request_shutdown` racing with this check is never missed.
            notified.as_mut().enable();

            if self.state() == DispatcherState::Draining {
                let _ = tokio::time::timeout(self.config.drain_timeout, async {
                    while stream.next().await.is_some() {}
                })
                .await;
                return Ok(());
            }

            tokio::select! {
                biased;
                _ = notified => continue,
                message = stream.next() => match message {
                    Some(message) => {
                        self.dispatch_one(message);
                    }
                    None => {
                        return if self.state() == DispatcherState::Draining {
                            Ok(())
                        } else {
                            Err(())
                        };
                    }
                },
            }
        }
    }

    #[tracing::instrument(skip(self, message), fields(topic = %message.topic))]
    fn dispatch_one(&self, message: BrokerMessage) {
        let BrokerMessage { topic, payload } = message;

        if topic.is_direct() {
            if let Some(user) = topic.direct_owner() {
                self.client_table.dispatch(&user, payload);
            }
            return;
        }

        let users = self.registry.users_for_topic(&topic);
        if users.is_empty() {
            return;
        }
        for user in users.iter() {
            self.client_table.dispatch(user, payload.clone());
        }
    }
}
