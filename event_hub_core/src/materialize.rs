// derives the topic set a user should be subscribed to from their channel
// configuration. Pure and synchronous: fetching the configuration itself
// (an I/O call through `ConfigReaderPort`) happens in the caller.

use crate::channel_config::{ChannelConfig, ChannelKind};
use crate::topic::{League, Topic};

/// Topics implied by a single enabled channel. Disabled channels and
/// unrecognized symbols/leagues/feeds contribute nothing. `fantasy_keys` is
/// only consulted for `ChannelKind::Fantasy` and is fetched by the caller
/// ahead of time (it requires its own collaborator call).
pub fn topics_for_channel(channel: &ChannelConfig, fantasy_keys: &[String]) -> Vec<Topic> {
    if !channel.enabled {
        return Vec::new();
    }
    match channel.kind {
        ChannelKind::Finance => channel
            .symbols()
            .iter()
            .filter_map(|s| Topic::finance(s).ok())
            .collect(),
        ChannelKind::Sports => League::ALL.iter().map(|l| Topic::sports(*l)).collect(),
        ChannelKind::Rss => channel
            .feed_urls()
            .iter()
            .map(|url| Topic::for_feed(url))
            .collect(),
        ChannelKind::Fantasy => fantasy_keys
            .iter()
            .filter_map(|key| Topic::fantasy(key).ok())
            .collect(),
    }
}

/// Full topic set for a user's channel configuration. `fantasy_keys` is
/// looked up ahead of time by the caller and is ignored unless the user has
/// an enabled `fantasy` channel.
pub fn topics_for_configs(channels: &[ChannelConfig], fantasy_keys: &[String]) -> Vec<Topic> {
    channels
        .iter()
        .flat_map(|c| topics_for_channel(c, fantasy_keys))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn finance(symbols: &[&str], enabled: bool) -> ChannelConfig {
        ChannelConfig {
            kind: ChannelKind::Finance,
            enabled,
            config: json!({ "symbols": symbols }),
        }
    }

    #[test]
    fn disabled_channel_contributes_no_topics() {
        let c = finance(&["AAPL"], false);
        assert!(topics_for_channel(&c, &[]).is_empty());
    }

    #[test]
    fn finance_channel_yields_one_topic_per_symbol() {
        let c = finance(&["AAPL", "GOOG"], true);
        let topics: Vec<_> = topics_for_channel(&c, &[])
            .into_iter()
            .map(|t| t.as_str().to_owned())
            .collect();
        assert_eq!(topics, vec!["topic:finance:AAPL", "topic:finance:GOOG"]);
    }

    #[test]
    fn sports_channel_yields_the_full_closed_league_set() {
        let c = ChannelConfig {
            kind: ChannelKind::Sports,
            enabled: true,
            config: json!({}),
        };
        assert_eq!(topics_for_channel(&c, &[]).len(), League::ALL.len());
    }

    #[test]
    fn fantasy_channel_uses_externally_supplied_keys() {
        let c = ChannelConfig {
            kind: ChannelKind::Fantasy,
            enabled: true,
            config: json!({}),
        };
        let topics: Vec<_> = topics_for_channel(&c, &["league-1".to_owned()])
            .into_iter()
            .map(|t| t.as_str().to_owned())
            .collect();
        assert_eq!(topics, vec!["topic:fantasy:league-1"]);
    }

    #[test]
    fn empty_channel_set_yields_no_topics() {
        assert!(topics_for_configs(&[], &[]).is_empty());
    }
}
