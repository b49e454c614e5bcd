// the single entry point collaborators use: register/unregister a
// connection, publish, react to a user's configuration changing, and derive
// a feed's topic name. Wires the Topic Registry, Client Table, and
// Dispatcher together behind one cheaply-cloneable handle.

use crate::client::Client;
use crate::client_table::{ClientTable, DEFAULT_OUTBOX_CAP, DEFAULT_SHARD_COUNT};
use crate::dispatcher::{Dispatcher, DispatcherConfig, DispatcherState};
use crate::topic_registry::TopicRegistry;
use bytes::Bytes;
use event_hub_core::{
    topics_for_configs, BrokerPort, ChannelKind, ConfigReaderPort, HubResult, Topic, UserId,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Process-boot configuration for an `EventHub`. Populated from environment
/// variables by the service binary (see the crate's configuration layer);
/// every field has the default named in the external interface section.
#[derive(Debug, Clone)]
pub struct HubSettings {
    pub outbox_cap: usize,
    pub shard_count: usize,
    pub backoff_min_ms: u64,
    pub backoff_max_ms: u64,
    pub drain_timeout_ms: u64,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            outbox_cap: DEFAULT_OUTBOX_CAP,
            shard_count: DEFAULT_SHARD_COUNT,
            backoff_min_ms: 1000,
            backoff_max_ms: 30_000,
            drain_timeout_ms: 5000,
        }
    }
}

/// A live connection handed back by `register_client`.
pub struct RegisteredConnection {
    pub client: Arc<Client>,
    pub receiver: mpsc::Receiver<Bytes>,
}

struct Inner {
    registry: Arc<TopicRegistry>,
    client_table: Arc<ClientTable>,
    broker: Arc<dyn BrokerPort>,
    config_reader: Arc<dyn ConfigReaderPort>,
    dispatcher: Dispatcher,
}

/// Cheaply cloneable handle to the hub; every clone shares the same
/// registry, client table, and dispatcher.
#[derive(Clone)]
pub struct EventHub(Arc<Inner>);

impl EventHub {
    pub fn new(
        broker: Arc<dyn BrokerPort>,
        config_reader: Arc<dyn ConfigReaderPort>,
        settings: HubSettings,
    ) -> Self {
        let registry = Arc::new(TopicRegistry::new());
        let client_table = Arc::new(ClientTable::new(settings.shard_count, settings.outbox_cap));
        let dispatcher = Dispatcher::new(
            Arc::clone(&broker),
            Arc::clone(&registry),
            Arc::clone(&client_table),
            DispatcherConfig {
                backoff_min: Duration::from_millis(settings.backoff_min_ms),
                backoff_max: Duration::from_millis(settings.backoff_max_ms),
                drain_timeout: Duration::from_millis(settings.drain_timeout_ms),
            },
        );
        Self(Arc::new(Inner {
            registry,
            client_table,
            broker,
            config_reader,
            dispatcher,
        }))
    }

    /// Runs the broker dispatch loop. Does not return until
    /// `request_shutdown` has been called and the drain completes.
    pub async fn run_dispatcher(&self) -> HubResult<()> {
        self.0.dispatcher.run().await
    }

    pub fn dispatcher_state(&self) -> DispatcherState {
        self.0.dispatcher.state()
    }

    pub fn request_shutdown(&self) {
        self.0.dispatcher.request_shutdown();
    }

    pub fn total_drops(&self) -> u64 {
        self.0.client_table.total_drops()
    }

    pub fn live_user_count(&self) -> usize {
        self.0.client_table.live_user_count()
    }

    /// Allocates a connection and, if this is the user's first live
    /// connection, schedules topic materialization as a spawned task.
    /// Returns immediately: materialization is asynchronous and idempotent,
    /// so an event for a not-yet-subscribed topic arriving in that window is
    /// simply dropped. `None` once the hub has begun shutting down.
    #[tracing::instrument(skip(self))]
    pub fn register_client(&self, user_id: UserId) -> Option<RegisteredConnection> {
        let outcome = self.0.client_table.register(user_id.clone())?;
        if outcome.is_first_connection_for_user {
            let hub = self.clone();
            tokio::spawn(async move {
                hub.materialize_for_user(&user_id).await;
            });
        }
        Some(RegisteredConnection {
            client: outcome.client,
            receiver: outcome.receiver,
        })
    }

    /// Removes the connection, closes its outbox, and, if it was the user's
    /// last live connection, drops all of that user's topic subscriptions.
    #[tracing::instrument(skip(self, client), fields(user_id = %client.user_id()))]
    pub fn unregister_client(&self, client: &Arc<Client>) {
        let outcome = self.0.client_table.unregister(client);
        if outcome.was_last_for_user {
            self.0.registry.unsubscribe_all(client.user_id());
        }
    }

    /// Thin wrapper over the broker publish, used to emit on direct-owner
    /// topics from outside the dispatch loop (e.g. a webhook/ingest path).
    pub async fn publish(&self, topic: &Topic, payload: Bytes) -> HubResult<()> {
        self.0.broker.publish(topic, payload).await?;
        Ok(())
    }

    /// Re-derives a user's topic subscriptions from the Config Reader. A
    /// no-op if the user currently has no live connections.
    #[tracing::instrument(skip(self))]
    pub async fn update_user_subscriptions(&self, user_id: &UserId) -> HubResult<()> {
        if !self.0.client_table.has_live_connections(user_id) {
            return Ok(());
        }
        self.0.registry.unsubscribe_all(user_id);
        self.materialize_for_user(user_id).await;
        Ok(())
    }

    /// Deterministic mapping from an arbitrary feed URL to a topic name safe
    /// for a broker channel name.
    pub fn topic_for_feed(&self, feed_url: &str) -> Topic {
        Topic::for_feed(feed_url)
    }

    /// Exposed for tests and the `/metrics` surface; not part of the
    /// collaborator-facing contract.
    pub fn topics_for_user(&self, user_id: &UserId) -> Arc<std::collections::HashSet<Topic>> {
        self.0.registry.topics_for_user(user_id)
    }

    #[tracing::instrument(skip(self))]
    async fn materialize_for_user(&self, user_id: &UserId) {
        let channels = match self.0.config_reader.channel_configs(user_id).await {
            Ok(channels) => channels,
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %err,
                    "failed to load channel configuration, proceeding with no subscriptions"
                );
                return;
            }
        };

        let needs_fantasy_keys = channels
            .iter()
            .any(|c| c.enabled && c.kind == ChannelKind::Fantasy);
        let fantasy_keys = if needs_fantasy_keys {
            match self.0.config_reader.fantasy_league_keys(user_id).await {
                Ok(keys) => keys,
                Err(err) => {
                    tracing::warn!(
                        user_id = %user_id,
                        error = %err,
                        "failed to load fantasy league keys, omitting fantasy subscriptions"
                    );
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        for topic in topics_for_configs(&channels, &fantasy_keys) {
            self.0.registry.subscribe(user_id, &topic);
        }
    }
}
