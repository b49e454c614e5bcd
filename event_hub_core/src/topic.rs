// topic identity, prefix families, and the feed-URL -> topic mapping.

use crate::errors::HubError;
use crate::hash::fnv1a32_hex;
use crate::ids::UserId;
use displaydoc::Display;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const FINANCE_PREFIX: &str = "topic:finance:";
pub const SPORTS_PREFIX: &str = "topic:sports:";
pub const RSS_PREFIX: &str = "topic:rss:";
pub const FANTASY_PREFIX: &str = "topic:fantasy:";
pub const CORE_PREFIX: &str = "topic:core:";

/// All prefixes the dispatcher subscribes to at start-up, each with a `*`
/// glob suffix appended by the caller.
pub const ALL_PREFIXES: [&str; 5] = [
    FINANCE_PREFIX,
    SPORTS_PREFIX,
    RSS_PREFIX,
    FANTASY_PREFIX,
    CORE_PREFIX,
];

/// Opaque, non-empty topic name. Cheap to clone (backed by `Arc<str>`) for
/// the same reason as `UserId`.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Topic(Arc<str>);

impl Topic {
    pub fn new(topic: impl Into<Arc<str>>) -> Result<Self, HubError> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(HubError::EmptyKey("Topic"));
        }
        Ok(Self(topic))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for topics in the direct-owner (`CORE_PREFIX`) family, which
    /// bypass the registry entirely.
    pub fn is_direct(&self) -> bool {
        self.0.starts_with(CORE_PREFIX)
    }

    /// Recovers the owning `UserId` from a direct-owner topic. Returns
    /// `None` for any other topic family.
    pub fn direct_owner(&self) -> Option<UserId> {
        self.0
            .strip_prefix(CORE_PREFIX)
            .filter(|suffix| !suffix.is_empty())
            .map(|suffix| UserId::new(suffix).expect("non-empty suffix checked above"))
    }

    pub fn finance(symbol: &str) -> Result<Self, HubError> {
        Self::new(format!("{FINANCE_PREFIX}{symbol}"))
    }

    pub fn sports(league: League) -> Self {
        Self::new(format!("{SPORTS_PREFIX}{league}")).expect("league renders to a non-empty str")
    }

    pub fn fantasy(league_key: &str) -> Result<Self, HubError> {
        Self::new(format!("{FANTASY_PREFIX}{league_key}"))
    }

    pub fn core(user: &UserId) -> Self {
        Self::new(format!("{CORE_PREFIX}{user}")).expect("user id is non-empty")
    }

    /// Deterministic mapping from an arbitrary feed URL to a topic name safe
    /// for a broker channel: `RSS_PREFIX` + lowercase zero-padded 8-hex-digit
    /// FNV-1a-32 of the URL bytes. Collisions only cause harmless
    /// over-delivery to users of the colliding feed.
    pub fn for_feed(url: &str) -> Self {
        Self::new(format!("{RSS_PREFIX}{}", fnv1a32_hex(url.as_bytes())))
            .expect("hex digest is non-empty")
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({:?})", self.0)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The closed set of sports leagues. Whether per-league user preferences
/// should narrow this set further is left open by the originating
/// specification; this crate treats it as closed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
pub enum League {
    /// NFL
    Nfl,
    /// NBA
    Nba,
    /// NHL
    Nhl,
    /// MLB
    Mlb,
    /// COLLEGE-FOOTBALL
    CollegeFootball,
    /// MENS-COLLEGE-BASKETBALL
    MensCollegeBasketball,
    /// WOMENS-COLLEGE-BASKETBALL
    WomensCollegeBasketball,
    /// COLLEGE-BASEBALL
    CollegeBaseball,
}

impl League {
    pub const ALL: [League; 8] = [
        League::Nfl,
        League::Nba,
        League::Nhl,
        League::Mlb,
        League::CollegeFootball,
        League::MensCollegeBasketball,
        League::WomensCollegeBasketball,
        League::CollegeBaseball,
    ];
}
