// the shape of channel configuration records as returned by the Config
// Reader collaborator. The config map itself is kept opaque (`serde_json::Value`)
// since the hub only ever reads a couple of well-known keys out of it.

use displaydoc::Display;
use serde::{Deserialize, Serialize};

/// One configured channel for a user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub kind: ChannelKind,
    pub enabled: bool,
    pub config: serde_json::Value,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelKind {
    /// finance
    Finance,
    /// sports
    Sports,
    /// rss
    Rss,
    /// fantasy
    Fantasy,
}

impl ChannelConfig {
    /// Symbols under `config["symbols"]`, for `ChannelKind::Finance`.
    /// Silently returns an empty list if the shape does not match — a
    /// malformed config narrows the subscription set, it never fails
    /// registration (see Error Handling §7.3).
    pub fn symbols(&self) -> Vec<String> {
        self.config
            .get("symbols")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Feed URLs under `config["feeds"][].url`, for `ChannelKind::Rss`.
    pub fn feed_urls(&self) -> Vec<String> {
        self.config
            .get("feeds")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|entry| entry.get("url"))
                    .filter_map(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}
