//! Cache configuration.
//!
//! Loaded from environment variables, with defaults for local development.

use crate::EntryOptions;
use std::env;
use std::time::Duration;

/// Cache configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_TTL_SECONDS`: Default TTL for read-through entries in seconds (default: `300`)
/// - `CACHE_SCAN_FREQUENCY_SECONDS`: In-memory expiration sweep interval (default: `1800`)
/// - `CACHE_LOCAL_TAG_LOCKS`: Serialise index updates per tag in-process (default: `false`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Redis connection URL.
    pub redis_url: String,

    /// Default time-to-live for read-through entries in seconds.
    pub default_ttl_seconds: u64,

    /// How often the in-memory store sweeps expired entries, in seconds.
    pub scan_frequency_seconds: u64,

    /// Whether tag index updates take a per-tag lock inside this process.
    pub local_tag_locks: bool,
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            default_ttl_seconds: parse_var("CACHE_TTL_SECONDS")
                .unwrap_or(defaults.default_ttl_seconds),
            scan_frequency_seconds: parse_var("CACHE_SCAN_FREQUENCY_SECONDS")
                .unwrap_or(defaults.scan_frequency_seconds),
            local_tag_locks: env::var("CACHE_LOCAL_TAG_LOCKS")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.local_tag_locks),
        }
    }

    /// Entry options applied when a caller does not pass its own.
    pub fn default_entry_options(&self) -> EntryOptions {
        if self.default_ttl_seconds == 0 {
            EntryOptions::none()
        } else {
            EntryOptions::expires_in(Duration::from_secs(self.default_ttl_seconds))
        }
    }

    pub fn scan_frequency(&self) -> Duration {
        Duration::from_secs(self.scan_frequency_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".into(),
            default_ttl_seconds: 300,
            scan_frequency_seconds: 1800,
            local_tag_locks: false,
        }
    }
}

fn parse_var(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entry_options_use_ttl() {
        let config = CacheConfig::default();
        assert_eq!(
            config.default_entry_options(),
            EntryOptions::expires_in(Duration::from_secs(300))
        );
    }

    #[test]
    fn test_zero_ttl_means_no_expiration() {
        let config = CacheConfig {
            default_ttl_seconds: 0,
            ..CacheConfig::default()
        };
        assert!(!config.default_entry_options().has_expiration());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
