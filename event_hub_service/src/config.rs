// environment-driven boot configuration. Parsed once in `main`; nothing
// reads the environment afterward.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub bind_addr: SocketAddr,
    pub outbox_cap: usize,
    pub shard_count: usize,
    pub backoff_min_ms: u64,
    pub backoff_max_ms: u64,
    pub drain_timeout_ms: u64,
}

impl HubConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr_raw = env_or("EVENT_HUB_BIND_ADDR", "127.0.0.1:3000");
        let bind_addr = bind_addr_raw
            .parse()
            .with_context(|| format!("EVENT_HUB_BIND_ADDR {bind_addr_raw:?} is not a valid socket address"))?;

        let outbox_cap = parse_env("EVENT_HUB_OUTBOX_CAP", 100)?;
        let shard_count = parse_env("EVENT_HUB_SHARD_COUNT", 16)?;
        anyhow::ensure!(
            shard_count.is_power_of_two(),
            "EVENT_HUB_SHARD_COUNT must be a power of two, got {shard_count}"
        );
        let backoff_min_ms = parse_env("EVENT_HUB_BACKOFF_MIN_MS", 1000)?;
        let backoff_max_ms = parse_env("EVENT_HUB_BACKOFF_MAX_MS", 30_000)?;
        let drain_timeout_ms = parse_env("EVENT_HUB_DRAIN_TIMEOUT_MS", 5000)?;

        Ok(Self {
            bind_addr,
            outbox_cap,
            shard_count,
            backoff_min_ms,
            backoff_max_ms,
            drain_timeout_ms,
        })
    }

    pub fn hub_settings(&self) -> event_hub_memory::HubSettings {
        event_hub_memory::HubSettings {
            outbox_cap: self.outbox_cap,
            shard_count: self.shard_count,
            backoff_min_ms: self.backoff_min_ms,
            backoff_max_ms: self.backoff_max_ms,
            drain_timeout_ms: self.drain_timeout_ms,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| anyhow::anyhow!("{key} is invalid: {err}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        // Exercises `parse_env`/`env_or` fallbacks directly rather than
        // mutating the process environment, which is shared across the
        // test binary's threads.
        assert_eq!(env_or("EVENT_HUB_DOES_NOT_EXIST", "127.0.0.1:3000"), "127.0.0.1:3000");
        assert_eq!(parse_env::<usize>("EVENT_HUB_DOES_NOT_EXIST", 100).unwrap(), 100);
    }
}
