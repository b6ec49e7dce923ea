//! Configuration Module
//!
//! Handles loading client configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::search::DEFAULT_SEARCH_CONCURRENCY;

/// Client configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server address, without the `/v1` API prefix
    pub address: String,
    /// Bearer credential sent with every request
    pub token: String,
    /// Namespace to start in, if any
    pub namespace: Option<String>,
    /// KV v2 mount the client operates on
    pub mount: String,
    /// TTL in seconds for cached directory listings
    pub list_cache_ttl: u64,
    /// TTL in seconds for cached secret values
    pub secret_cache_ttl: u64,
    /// Background purge interval in seconds
    pub cleanup_interval: u64,
    /// Maximum in-flight wire calls per search
    pub search_concurrency: usize,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    /// Send LIST as POST with a method-override header
    pub method_override: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `VAULT_ADDR` - Server address (default: http://127.0.0.1:8200)
    /// - `VAULT_TOKEN` - Bearer credential (default: empty)
    /// - `VAULT_NAMESPACE` - Initial namespace (default: none)
    /// - `VAULT_MOUNT` - KV v2 mount (default: secret)
    /// - `LIST_CACHE_TTL` - Listing cache TTL in seconds (default: 60)
    /// - `SECRET_CACHE_TTL` - Secret cache TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Purge frequency in seconds (default: 60)
    /// - `SEARCH_CONCURRENCY` - In-flight calls per search (default: 8)
    /// - `REQUEST_TIMEOUT` - Request timeout in seconds (default: 30)
    /// - `VAULT_METHOD_OVERRIDE` - `true`/`1` to tunnel LIST through POST (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            address: env::var("VAULT_ADDR").unwrap_or(defaults.address),
            token: env::var("VAULT_TOKEN").unwrap_or(defaults.token),
            namespace: env::var("VAULT_NAMESPACE").ok().filter(|ns| !ns.is_empty()),
            mount: env::var("VAULT_MOUNT").unwrap_or(defaults.mount),
            list_cache_ttl: parse_var("LIST_CACHE_TTL").unwrap_or(defaults.list_cache_ttl),
            secret_cache_ttl: parse_var("SECRET_CACHE_TTL").unwrap_or(defaults.secret_cache_ttl),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            search_concurrency: parse_var("SEARCH_CONCURRENCY")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.search_concurrency),
            request_timeout: parse_var("REQUEST_TIMEOUT").unwrap_or(defaults.request_timeout),
            method_override: env::var("VAULT_METHOD_OVERRIDE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.method_override),
        }
    }

    pub fn list_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.list_cache_ttl)
    }

    pub fn secret_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.secret_cache_ttl)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: String::new(),
            namespace: None,
            mount: "secret".to_string(),
            list_cache_ttl: 60,
            secret_cache_ttl: 300,
            cleanup_interval: 60,
            search_concurrency: DEFAULT_SEARCH_CONCURRENCY,
            request_timeout: 30,
            method_override: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.address, "http://127.0.0.1:8200");
        assert_eq!(config.mount, "secret");
        assert!(config.namespace.is_none());
        assert_eq!(config.list_cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.secret_cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.search_concurrency, DEFAULT_SEARCH_CONCURRENCY);
        assert!(!config.method_override);
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("VAULT_MOUNT", "kv");
        env::set_var("VAULT_NAMESPACE", "team-a");
        env::set_var("SEARCH_CONCURRENCY", "0");
        env::set_var("VAULT_METHOD_OVERRIDE", "TRUE");
        env::remove_var("LIST_CACHE_TTL");

        let config = Config::from_env();
        assert_eq!(config.mount, "kv");
        assert_eq!(config.namespace.as_deref(), Some("team-a"));
        // Zero falls back to the default
        assert_eq!(config.search_concurrency, 8);
        assert!(config.method_override);
        assert_eq!(config.list_cache_ttl, 60);

        env::remove_var("VAULT_MOUNT");
        env::remove_var("VAULT_NAMESPACE");
        env::remove_var("SEARCH_CONCURRENCY");
        env::remove_var("VAULT_METHOD_OVERRIDE");
    }
}
