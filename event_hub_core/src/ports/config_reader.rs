// config reader port: the read-only collaborator over persisted channel
// configuration. Opaque to the hub beyond the shape in `ChannelConfig`.

use crate::channel_config::ChannelConfig;
use crate::errors::ConfigError;
use crate::ids::UserId;
use async_trait::async_trait;

#[async_trait]
pub trait ConfigReaderPort: Send + Sync {
    /// All configured channels (enabled or not) for `user`.
    async fn channel_configs(&self, user: &UserId) -> Result<Vec<ChannelConfig>, ConfigError>;

    /// External fantasy-league keys for `user`, used only when the user has
    /// an enabled `fantasy` channel.
    async fn fantasy_league_keys(&self, user: &UserId) -> Result<Vec<String>, ConfigError>;
}
