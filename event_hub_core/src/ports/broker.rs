// broker port: the external pub/sub collaborator.

use crate::errors::BrokerError;
use crate::topic::Topic;
use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use std::pin::Pin;

/// One message delivered by a pattern subscription.
#[derive(Clone, Debug)]
pub struct BrokerMessage {
    pub topic: Topic,
    pub payload: Bytes,
}

/// A long-lived stream of messages matching one or more subscribed patterns.
pub type BrokerStream = Pin<Box<dyn Stream<Item = BrokerMessage> + Send + 'static>>;

/// Broker collaborator contract. The broker is assumed to fan out at the
/// transport level; the hub does not attempt to deduplicate.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Subscribe to all channels matching any of `patterns`. A trailing `*`
    /// on a pattern matches the rest of the channel name.
    async fn psubscribe(&self, patterns: &[String]) -> Result<BrokerStream, BrokerError>;

    /// Fire-and-forget emit to a single channel.
    async fn publish(&self, topic: &Topic, payload: Bytes) -> Result<(), BrokerError>;

    /// Emit the same payload to many channels; returns the count of
    /// per-channel failures (not the first error — every channel is
    /// attempted).
    async fn publish_batch(&self, topics: &[Topic], payload: Bytes) -> Result<usize, BrokerError>;
}
