//! Configuration Module
//!
//! Handles loading search and cache settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default upstream geocoding endpoint.
pub const DEFAULT_GEOCODING_ENDPOINT: &str = "https://nominatim.openstreetmap.org";

/// Default client identifier sent with every geocoding request.
pub const DEFAULT_USER_AGENT: &str = "travel-search/0.1 (travel guide client)";

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the geocoding service
    pub geocoding_endpoint: String,
    /// Descriptive client identifier header
    pub user_agent: String,
    /// Debounce window in milliseconds
    pub debounce_ms: u64,
    /// Maximum number of search results requested
    pub result_limit: usize,
    /// Minimum spacing between upstream requests in milliseconds
    pub rate_limit_interval_ms: u64,
    /// Upstream request timeout in seconds
    pub request_timeout_secs: u64,
    /// Directory backing the persistent store
    pub cache_dir: PathBuf,
    /// Background sweep interval in seconds
    pub sweep_interval_secs: u64,
}

/// Settings of a single search surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub debounce: Duration,
    pub request_timeout: Duration,
    pub result_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            request_timeout: Duration::from_secs(10),
            result_limit: 5,
        }
    }
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `GEOCODING_ENDPOINT` - geocoding base URL
    /// - `GEOCODING_USER_AGENT` - client identifier header
    /// - `SEARCH_DEBOUNCE_MS` - debounce window (default: 300)
    /// - `SEARCH_RESULT_LIMIT` - results per query (default: 5)
    /// - `RATE_LIMIT_INTERVAL_MS` - upstream spacing (default: 1000)
    /// - `REQUEST_TIMEOUT_SECS` - upstream timeout (default: 10)
    /// - `CACHE_DIR` - persistent store directory (default: ./.travel_cache)
    /// - `CACHE_SWEEP_INTERVAL_SECS` - sweep frequency (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            geocoding_endpoint: env::var("GEOCODING_ENDPOINT")
                .unwrap_or(defaults.geocoding_endpoint),
            user_agent: env::var("GEOCODING_USER_AGENT").unwrap_or(defaults.user_agent),
            debounce_ms: parse_var("SEARCH_DEBOUNCE_MS").unwrap_or(defaults.debounce_ms),
            result_limit: parse_var("SEARCH_RESULT_LIMIT").unwrap_or(defaults.result_limit),
            rate_limit_interval_ms: parse_var("RATE_LIMIT_INTERVAL_MS")
                .unwrap_or(defaults.rate_limit_interval_ms),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            sweep_interval_secs: parse_var("CACHE_SWEEP_INTERVAL_SECS")
                .unwrap_or(defaults.sweep_interval_secs),
        }
    }

    /// Projects the search-surface settings.
    pub fn search(&self) -> SearchConfig {
        SearchConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            result_limit: self.result_limit,
        }
    }

    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geocoding_endpoint: DEFAULT_GEOCODING_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            debounce_ms: 300,
            result_limit: 5,
            rate_limit_interval_ms: 1000,
            request_timeout_secs: 10,
            cache_dir: PathBuf::from("./.travel_cache"),
            sweep_interval_secs: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.rate_limit_interval_ms, 1000);
        assert_eq!(config.result_limit, 5);
        assert_eq!(config.geocoding_endpoint, DEFAULT_GEOCODING_ENDPOINT);
    }

    #[test]
    fn test_search_projection_matches_default() {
        assert_eq!(Config::default().search(), SearchConfig::default());
        assert_eq!(Config::default().rate_limit_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SEARCH_DEBOUNCE_MS");
        env::remove_var("RATE_LIMIT_INTERVAL_MS");
        env::remove_var("SEARCH_RESULT_LIMIT");

        let config = Config::from_env();
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.rate_limit_interval_ms, 1000);
        assert_eq!(config.result_limit, 5);
    }
}
