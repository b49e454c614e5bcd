//! In-memory implementation of the Event Hub: the Topic Registry, the
//! sharded Client Table, the broker dispatch loop, and the `EventHub` facade
//! that wires them together for collaborators.

mod client;
mod client_table;
mod dispatcher;
mod hub;
mod topic_registry;

pub use client::{Client, RegisteredClient};
pub use client_table::{
    ClientTable, RegisterOutcome, UnregisterOutcome, DEFAULT_OUTBOX_CAP, DEFAULT_SHARD_COUNT,
};
pub use dispatcher::{Dispatcher, DispatcherConfig, DispatcherState};
pub use hub::{EventHub, HubSettings, RegisteredConnection};
pub use topic_registry::TopicRegistry;
