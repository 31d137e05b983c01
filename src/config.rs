//! Runtime configuration
//!
//! Defaults come from `constants`. The environment can override them, and
//! the binary applies command-line flags on top.

use crate::constants::{
    COINGECKO_API_URL, MAX_REFRESH_INTERVAL_SECS, MIN_REFRESH_INTERVAL_SECS,
    REFRESH_INTERVAL_SECS, REQUEST_TIMEOUT_SECS, TICK_INTERVAL, WATCHLIST_FILE,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable overriding the refresh interval (seconds)
pub const ENV_REFRESH_SECS: &str = "PRICE_TICKER_REFRESH_SECS";
/// Environment variable overriding the request timeout (seconds)
pub const ENV_TIMEOUT_SECS: &str = "PRICE_TICKER_TIMEOUT_SECS";
/// Environment variable overriding the watchlist file path
pub const ENV_WATCHLIST: &str = "PRICE_TICKER_WATCHLIST";
/// Environment variable overriding the API base URL
pub const ENV_API_URL: &str = "PRICE_TICKER_API_URL";

#[derive(Debug, Clone, PartialEq)]
pub struct TickerConfig {
    /// Time between poll cycles
    pub refresh_interval: Duration,
    /// Upper bound on a single price query
    pub request_timeout: Duration,
    /// Animator tick
    pub tick_interval: Duration,
    pub watchlist_path: PathBuf,
    pub api_url: String,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(REFRESH_INTERVAL_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            tick_interval: TICK_INTERVAL,
            watchlist_path: PathBuf::from(WATCHLIST_FILE),
            api_url: COINGECKO_API_URL.to_string(),
        }
    }
}

impl TickerConfig {
    /// Defaults overridden by any `PRICE_TICKER_*` variables that are set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<u64>(&lookup, ENV_REFRESH_SECS) {
            config = config.with_refresh_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_TIMEOUT_SECS) {
            config.request_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(path) = lookup(ENV_WATCHLIST) {
            config.watchlist_path = PathBuf::from(path);
        }
        if let Some(url) = lookup(ENV_API_URL) {
            config.api_url = url;
        }

        config
    }

    /// Sets the refresh interval, clamped to the supported range
    pub fn with_refresh_secs(mut self, secs: u64) -> Self {
        let clamped = secs.clamp(MIN_REFRESH_INTERVAL_SECS, MAX_REFRESH_INTERVAL_SECS);
        if clamped != secs {
            tracing::warn!(
                requested = secs,
                used = clamped,
                "Refresh interval out of range, clamping"
            );
        }
        self.refresh_interval = Duration::from_secs(clamped);
        self
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = key, value = %raw, "Ignoring unparsable setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TickerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, TickerConfig::default());
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.watchlist_path, PathBuf::from("pinned_tokens.json"));
    }

    #[test]
    fn test_env_overrides() {
        let config = TickerConfig::from_lookup(lookup(&[
            (ENV_REFRESH_SECS, "40"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_WATCHLIST, "/tmp/pins.json"),
            (ENV_API_URL, "http://localhost:8080"),
        ]));
        assert_eq!(config.refresh_interval, Duration::from_secs(40));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.watchlist_path, PathBuf::from("/tmp/pins.json"));
        assert_eq!(config.api_url, "http://localhost:8080");
    }

    #[test]
    fn test_invalid_values_are_ignored_or_clamped() {
        let config = TickerConfig::from_lookup(lookup(&[(ENV_REFRESH_SECS, "soon")]));
        assert_eq!(config.refresh_interval, Duration::from_secs(60));

        let config = TickerConfig::from_lookup(lookup(&[(ENV_REFRESH_SECS, "5")]));
        assert_eq!(config.refresh_interval, Duration::from_secs(30));

        let config = TickerConfig::default().with_refresh_secs(600);
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
    }
}
