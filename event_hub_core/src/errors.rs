//! Definitions for error types used throughout the hub.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broker collaborator failures.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// the broker connection was closed
    #[error("broker connection closed")]
    ConnectionClosed,

    /// a publish was rejected by the broker
    #[error("publish to {topic} failed: {reason}")]
    PublishFailed { topic: String, reason: String },

    /// the initial pattern subscription could not be established
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),

    // transport, auth, or other broker-specific errors the hub does not distinguish
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Config Reader collaborator failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// the user's channel configuration could not be loaded
    #[error("failed to load channel configuration: {0}")]
    LoadFailed(String),

    /// the user's fantasy league keys could not be loaded
    #[error("failed to load fantasy league keys: {0}")]
    FantasyKeysFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Top-level error type for fallible hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// broker error: {0}
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    /// config reader error: {0}
    #[error("config reader error: {0}")]
    Config(#[from] ConfigError),

    /// a `UserId` or `Topic` was constructed from an empty string
    #[error("{0} must not be empty")]
    EmptyKey(&'static str),

    /// a topic did not carry any of the recognized prefixes
    #[error("unrecognized topic prefix: {0}")]
    UnknownPrefix(String),
}

pub type HubResult<T> = Result<T, HubError>;

impl HubError {
    pub fn is_transient_broker_error(&self) -> bool {
        matches!(
            self,
            HubError::Broker(BrokerError::ConnectionClosed | BrokerError::SubscribeFailed(_))
        )
    }
}

/// Machine-readable summary of a `HubError`, e.g. for a `/metrics` surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HubErrorKind {
    Broker,
    Config,
    EmptyKey,
    UnknownPrefix,
}

impl From<&HubError> for HubErrorKind {
    fn from(value: &HubError) -> Self {
        match value {
            HubError::Broker(_) => HubErrorKind::Broker,
            HubError::Config(_) => HubErrorKind::Config,
            HubError::EmptyKey(_) => HubErrorKind::EmptyKey,
            HubError::UnknownPrefix(_) => HubErrorKind::UnknownPrefix,
        }
    }
}
