//! Gate configuration with environment variable overrides.
//!
//! Recognized options: rate-limit window length and ceiling, search-cache
//! TTL and capacity. Malformed values fall back to the defaults.

use std::env;
use std::time::Duration;

// Default limits (can be overridden by environment variables)
pub const DEFAULT_MAX_REQUESTS_PER_WINDOW: u32 = 30;
pub const DEFAULT_WINDOW_MS: u64 = 60_000; // 1 minute
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300; // 5 minutes
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub max_requests_per_window: u32,
    pub window_length: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: DEFAULT_MAX_REQUESTS_PER_WINDOW,
            window_length: Duration::from_millis(DEFAULT_WINDOW_MS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl GateConfig {
    /// Build a configuration from the environment, defaulting each option
    /// that is unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            max_requests_per_window: env_u64(
                "RATE_LIMIT_MAX_REQUESTS",
                DEFAULT_MAX_REQUESTS_PER_WINDOW as u64,
            ) as u32,
            window_length: Duration::from_millis(env_u64(
                "RATE_LIMIT_WINDOW_MS",
                DEFAULT_WINDOW_MS,
            )),
            cache_ttl: Duration::from_secs(env_u64(
                "SEARCH_CACHE_TTL_SECONDS",
                DEFAULT_CACHE_TTL_SECONDS,
            )),
            cache_capacity: env_u64("SEARCH_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY as u64)
                as usize,
        }
    }
}

/// Read a numeric option with environment variable override.
fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .map(|val| val.parse::<u64>().unwrap_or(default))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GateConfig::default();
        assert_eq!(config.max_requests_per_window, 30);
        assert_eq!(config.window_length, Duration::from_millis(60_000));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.cache_capacity, 1000);
    }

    #[test]
    fn test_env_override_and_parse_fallback() {
        env::set_var("GATE_TEST_OPT_A", "45");
        assert_eq!(env_u64("GATE_TEST_OPT_A", 30), 45);

        env::set_var("GATE_TEST_OPT_B", "not-a-number");
        assert_eq!(env_u64("GATE_TEST_OPT_B", 30), 30);

        assert_eq!(env_u64("GATE_TEST_OPT_UNSET", 7), 7);
    }
}
