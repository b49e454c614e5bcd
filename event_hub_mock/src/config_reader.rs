// static `ConfigReaderPort` test double, seeded once at construction.

use async_trait::async_trait;
use event_hub_core::{ChannelConfig, ConfigError, ConfigReaderPort, UserId};
use std::collections::HashMap;

#[derive(Default)]
pub struct MockConfigReader {
    channels: HashMap<UserId, Vec<ChannelConfig>>,
    fantasy_keys: HashMap<UserId, Vec<String>>,
}

impl MockConfigReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channels(mut self, user: UserId, channels: Vec<ChannelConfig>) -> Self {
        self.channels.insert(user, channels);
        self
    }

    pub fn with_fantasy_keys(mut self, user: UserId, keys: Vec<String>) -> Self {
        self.fantasy_keys.insert(user, keys);
        self
    }
}

#[async_trait]
impl ConfigReaderPort for MockConfigReader {
    async fn channel_configs(&self, user: &UserId) -> Result<Vec<ChannelConfig>, ConfigError> {
        Ok(self.channels.get(user).cloned().unwrap_or_default())
    }

    async fn fantasy_league_keys(&self, user: &UserId) -> Result<Vec<String>, ConfigError> {
        Ok(self.fantasy_keys.get(user).cloned().unwrap_or_default())
    }
}
