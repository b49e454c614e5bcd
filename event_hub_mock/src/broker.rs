// in-memory `BrokerPort` test double. A single `tokio::sync::broadcast`
// channel stands in for the external broker: `publish` sends on it,
// `psubscribe` hands back a filtered view of it, matching the real broker's
// trailing-`*` glob contract.

use async_trait::async_trait;
use bytes::Bytes;
use event_hub_core::{BrokerError, BrokerMessage, BrokerPort, BrokerStream, Topic};
use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

fn matches(pattern: &str, topic: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => topic.starts_with(prefix),
        None => topic == pattern,
    }
}

/// Backed by a broadcast channel so multiple `psubscribe` calls can be live
/// at once, each seeing every message published after it subscribed —
/// mirroring the real broker's "subscribe, then receive" ordering.
pub struct MockBroker {
    sender: broadcast::Sender<BrokerMessage>,
}

impl MockBroker {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self { sender }
    }
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerPort for MockBroker {
    async fn psubscribe(&self, patterns: &[String]) -> Result<BrokerStream, BrokerError> {
        let patterns = patterns.to_vec();
        let receiver = self.sender.subscribe();
        let stream = BroadcastStream::new(receiver)
            .filter_map(|item| std::future::ready(item.ok()))
            .filter(move |message: &BrokerMessage| {
                let matched = patterns.iter().any(|p| matches(p, message.topic.as_str()));
                std::future::ready(matched)
            });
        Ok(Box::pin(stream))
    }

    async fn publish(&self, topic: &Topic, payload: Bytes) -> Result<(), BrokerError> {
        // No active subscriber is not a publish failure — it just means
        // nobody is listening yet, same as the real broker fanning out at
        // the transport level.
        let _ = self.sender.send(BrokerMessage {
            topic: topic.clone(),
            payload,
        });
        Ok(())
    }

    async fn publish_batch(&self, topics: &[Topic], payload: Bytes) -> Result<usize, BrokerError> {
        for topic in topics {
            let _ = self.sender.send(BrokerMessage {
                topic: topic.clone(),
                payload: payload.clone(),
            });
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_only_sees_matching_topics() {
        let broker = MockBroker::new();
        let mut stream = broker
            .psubscribe(&["topic:finance:*".to_owned()])
            .await
            .unwrap();

        broker
            .publish(&Topic::finance("AAPL").unwrap(), Bytes::from_static(b"a"))
            .await
            .unwrap();
        broker
            .publish(&Topic::sports(event_hub_core::League::Nfl), Bytes::from_static(b"b"))
            .await
            .unwrap();
        broker
            .publish(&Topic::finance("GOOG").unwrap(), Bytes::from_static(b"c"))
            .await
            .unwrap();

        assert_eq!(stream.next().await.unwrap().payload, Bytes::from_static(b"a"));
        assert_eq!(stream.next().await.unwrap().payload, Bytes::from_static(b"c"));
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_error() {
        let broker = MockBroker::new();
        broker
            .publish(&Topic::finance("AAPL").unwrap(), Bytes::from_static(b"a"))
            .await
            .unwrap();
    }
}
