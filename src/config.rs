use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::services::cache::DEFAULT_TTL_MINS;
use crate::services::session::DEFAULT_POLL_INTERVAL;

/// Client-wide settings. Defaults match the web frontend: a 5 second chat
/// poll and a 30 minute cache TTL.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub poll_interval: Duration,
    pub cache_ttl: chrono::Duration,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cache_ttl: chrono::Duration::minutes(DEFAULT_TTL_MINS),
        }
    }

    /// Read settings from the environment. `CONFAB_API_URL` is required;
    /// `CONFAB_POLL_INTERVAL_SECS` and `CONFAB_CACHE_TTL_MINS` override the
    /// defaults.
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var("CONFAB_API_URL").context("CONFAB_API_URL is not set")?;
        let base_url =
            Url::parse(&raw).with_context(|| format!("Invalid CONFAB_API_URL: {}", raw))?;

        let mut config = Self::new(base_url);

        if let Ok(secs) = std::env::var("CONFAB_POLL_INTERVAL_SECS") {
            let secs: u64 = secs.parse().context("Invalid CONFAB_POLL_INTERVAL_SECS")?;
            config.poll_interval = Duration::from_secs(secs);
        }

        if let Ok(mins) = std::env::var("CONFAB_CACHE_TTL_MINS") {
            let mins: i64 = mins.parse().context("Invalid CONFAB_CACHE_TTL_MINS")?;
            config.cache_ttl = chrono::Duration::minutes(mins);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(Url::parse("https://api.example.com/api/").unwrap());
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.cache_ttl, chrono::Duration::minutes(30));
    }
}
