// sharded user -> connection-list table. Each shard is independent: there is
// no single lock the dispatcher would need to take per message.

use crate::client::{Client, RegisteredClient};
use arc_swap::ArcSwap;
use bytes::Bytes;
use dashmap::DashMap;
use event_hub_core::{fnv1a32, UserId};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub const DEFAULT_SHARD_COUNT: usize = 16;
pub const DEFAULT_OUTBOX_CAP: usize = 100;

type ClientList = Arc<ArcSwap<Vec<Arc<Client>>>>;

struct Shard {
    clients: DashMap<UserId, ClientList>,
    drops: AtomicU64,
}

impl Shard {
    fn new() -> Self {
        Self {
            clients: DashMap::new(),
            drops: AtomicU64::new(0),
        }
    }
}

/// Result of `ClientTable::register`.
pub struct RegisterOutcome {
    pub client: Arc<Client>,
    pub receiver: tokio::sync::mpsc::Receiver<Bytes>,
    /// Best-effort: true if this registration found no other live connection
    /// for the user at the moment the connection list was read. Used only to
    /// decide whether to schedule topic materialization; a missed or
    /// spurious signal here is harmless because materialization is
    /// idempotent (see 4.5 topic materialization).
    pub is_first_connection_for_user: bool,
}

/// Result of `ClientTable::unregister`.
pub struct UnregisterOutcome {
    pub found: bool,
    pub was_last_for_user: bool,
}

/// Sharded map from `UserId` to its live `Client`s. The shard for a user is
/// `fnv1a32(user_id) & (shard_count - 1)`, so `shard_count` must be a power
/// of two — callers are expected to validate this at configuration load
/// time; this type simply asserts it.
pub struct ClientTable {
    shards: Vec<Shard>,
    shard_count: usize,
    outbox_cap: usize,
    shut_down: AtomicBool,
}

impl ClientTable {
    pub fn new(shard_count: usize, outbox_cap: usize) -> Self {
        assert!(
            shard_count.is_power_of_two(),
            "shard_count must be a power of two, got {shard_count}"
        );
        let shards = (0..shard_count).map(|_| Shard::new()).collect();
        Self {
            shards,
            shard_count,
            outbox_cap,
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_SHARD_COUNT, DEFAULT_OUTBOX_CAP)
    }

    pub fn shard_index(user_id: &UserId, shard_count: usize) -> usize {
        fnv1a32(user_id.as_str().as_bytes()) as usize & (shard_count - 1)
    }

    fn shard_for(&self, user_id: &UserId) -> usize {
        Self::shard_index(user_id, self.shard_count)
    }

    /// Rejected (returns `None`) once `shutdown` has run.
    #[tracing::instrument(skip(self), fields(shard))]
    pub fn register(&self, user_id: UserId) -> Option<RegisterOutcome> {
        if self.shut_down.load(Ordering::Acquire) {
            return None;
        }
        let shard_idx = self.shard_for(&user_id);
        tracing::Span::current().record("shard", shard_idx);
        let shard = &self.shards[shard_idx];

        let RegisteredClient { client, receiver } =
            Client::new(user_id.clone(), shard_idx, self.outbox_cap);

        let slot = shard
            .clients
            .entry(user_id)
            .or_insert_with(|| Arc::new(ArcSwap::from_pointee(Vec::new())))
            .clone();
        let is_first_connection_for_user = slot.load().is_empty();

        let to_add = Arc::clone(&client);
        slot.rcu(|old| {
            let mut next = old.clone();
            next.push(Arc::clone(&to_add));
            next
        });

        Some(RegisterOutcome {
            client,
            receiver,
            is_first_connection_for_user,
        })
    }

    /// Idempotent: unregistering a client not present in the table (already
    /// removed, or never registered here) reports `found: false`.
    #[tracing::instrument(skip(self, client), fields(shard = client.shard()))]
    pub fn unregister(&self, client: &Arc<Client>) -> UnregisterOutcome {
        let shard = &self.shards[client.shard()];
        let Some(slot) = shard
            .clients
            .get(client.user_id())
            .map(|e| e.value().clone())
        else {
            return UnregisterOutcome {
                found: false,
                was_last_for_user: false,
            };
        };

        let found = slot.load().iter().any(|c| Arc::ptr_eq(c, client));
        if !found {
            return UnregisterOutcome {
                found: false,
                was_last_for_user: false,
            };
        }

        slot.rcu(|old| {
            old.iter()
                .filter(|c| !Arc::ptr_eq(c, client))
                .cloned()
                .collect::<Vec<_>>()
        });
        client.close();

        let was_last = slot.load().is_empty();
        if was_last {
            shard
                .clients
                .remove_if(client.user_id(), |_, v| v.load().is_empty());
        }

        UnregisterOutcome {
            found: true,
            was_last_for_user: was_last,
        }
    }

    /// Non-blocking fan-out to every live connection for `user_id`. Absent
    /// users and full outboxes are both silent — the former is a no-op, the
    /// latter is a counted drop (see `total_drops`).
    #[tracing::instrument(skip(self, payload), fields(shard))]
    pub fn dispatch(&self, user_id: &UserId, payload: Bytes) {
        let shard_idx = self.shard_for(user_id);
        tracing::Span::current().record("shard", shard_idx);
        let shard = &self.shards[shard_idx];
        let Some(slot) = shard.clients.get(user_id).map(|e| e.value().clone()) else {
            return;
        };
        for client in slot.load().iter() {
            if !client.try_send(payload.clone()) {
                shard.drops.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(user_id = %user_id, shard = shard_idx, "outbox full, dropping payload");
            }
        }
    }

    /// Closes every live outbox and rejects further registration. Called
    /// once during hub shutdown.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        for shard in &self.shards {
            for entry in shard.clients.iter() {
                for client in entry.value().load().iter() {
                    client.close();
                }
            }
            shard.clients.clear();
        }
    }

    pub fn total_drops(&self) -> u64 {
        self.shards.iter().map(|s| s.drops.load(Ordering::Relaxed)).sum()
    }

    /// Number of distinct users with at least one live connection. For
    /// metrics/tests; O(shard_count) plus per-shard map size.
    pub fn live_user_count(&self) -> usize {
        self.shards.iter().map(|s| s.clients.len()).sum()
    }

    pub fn has_live_connections(&self, user_id: &UserId) -> bool {
        let shard = &self.shards[self.shard_for(user_id)];
        shard
            .clients
            .get(user_id)
            .map(|e| !e.value().load().is_empty())
            .unwrap_or(false)
    }
}
