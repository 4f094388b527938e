//! Storefront configuration.
//!
//! Settings come from a flat string map so the same loader serves
//! environment variables, config files and tests:
//!
//! | key                       | env var                          |
//! |---------------------------|----------------------------------|
//! | `primary_base_url`        | `STOREFRONT_PRIMARY_BASE_URL`    |
//! | `primary_api_key`         | `STOREFRONT_PRIMARY_API_KEY` / `RAWG_API_KEY` |
//! | `comparison_base_url`     | `STOREFRONT_COMPARISON_BASE_URL` |
//! | `request_timeout_secs`    | `STOREFRONT_REQUEST_TIMEOUT_SECS`|
//! | `page_size`               | `STOREFRONT_PAGE_SIZE`           |
//! | `comparison_limit`        | `STOREFRONT_COMPARISON_LIMIT`    |
//! | `network_enabled`         | `STOREFRONT_NETWORK_ENABLED`     |
//! | `fallback_on_error`       | `STOREFRONT_FALLBACK_ON_ERROR`   |
//! | `storage_path`            | `STOREFRONT_STORAGE_PATH`        |
//! | `initial_source`          | `STOREFRONT_INITIAL_SOURCE`      |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::core::SourceKind;

const ENV_PREFIX: &str = "STOREFRONT_";

const KEYS: [&str; 10] = [
    "primary_base_url",
    "primary_api_key",
    "comparison_base_url",
    "request_timeout_secs",
    "page_size",
    "comparison_limit",
    "network_enabled",
    "fallback_on_error",
    "storage_path",
    "initial_source",
];

/// Runtime configuration for the storefront stores and catalog sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    /// Base URL of the primary paginated catalog API
    pub primary_base_url: String,

    /// API key for the primary catalog (sent as `key`)
    pub primary_api_key: Option<String>,

    /// Base URL of the price-comparison API
    pub comparison_base_url: String,

    /// Per-request timeout for both network sources
    pub request_timeout_secs: u64,

    /// Page size used for paginated fetches
    pub page_size: u32,

    /// Result limit for title-keyed comparison lookups
    pub comparison_limit: u32,

    /// When false, network sources are never called and the static set is served
    pub network_enabled: bool,

    /// Substitute the static set when a network source fails
    pub fallback_on_error: bool,

    /// SQLite file backing the persisted stores (`:memory:` for ephemeral)
    pub storage_path: String,

    /// Source selected when the catalog store is created
    pub initial_source: SourceKind,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            primary_base_url: "https://api.rawg.io/api".to_string(),
            primary_api_key: None,
            comparison_base_url: "https://www.cheapshark.com/api/1.0".to_string(),
            request_timeout_secs: 10,
            page_size: 20,
            comparison_limit: 20,
            network_enabled: true,
            fallback_on_error: true,
            storage_path: "storefront.db".to_string(),
            initial_source: SourceKind::Primary,
        }
    }
}

impl StorefrontConfig {
    /// Build a config from string settings, falling back to defaults per key.
    ///
    /// Unparseable values are ignored with a warning rather than rejected.
    pub fn from_map(settings: &HashMap<String, String>) -> Self {
        let defaults = Self::default();

        Self {
            primary_base_url: settings
                .get("primary_base_url")
                .cloned()
                .unwrap_or(defaults.primary_base_url),
            primary_api_key: settings
                .get("primary_api_key")
                .filter(|key| !key.trim().is_empty())
                .cloned()
                .or(defaults.primary_api_key),
            comparison_base_url: settings
                .get("comparison_base_url")
                .cloned()
                .unwrap_or(defaults.comparison_base_url),
            request_timeout_secs: parse_or(settings, "request_timeout_secs", defaults.request_timeout_secs),
            page_size: parse_or(settings, "page_size", defaults.page_size).max(1),
            comparison_limit: parse_or(settings, "comparison_limit", defaults.comparison_limit).max(1),
            network_enabled: parse_or(settings, "network_enabled", defaults.network_enabled),
            fallback_on_error: parse_or(settings, "fallback_on_error", defaults.fallback_on_error),
            storage_path: settings
                .get("storage_path")
                .cloned()
                .unwrap_or(defaults.storage_path),
            initial_source: parse_or(settings, "initial_source", defaults.initial_source),
        }
    }

    /// Build a config from `STOREFRONT_*` environment variables.
    pub fn from_env() -> Self {
        let mut settings: HashMap<String, String> = KEYS
            .iter()
            .filter_map(|key| {
                let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
                std::env::var(var).ok().map(|value| (key.to_string(), value))
            })
            .collect();

        if !settings.contains_key("primary_api_key") {
            if let Ok(key) = std::env::var("RAWG_API_KEY") {
                settings.insert("primary_api_key".to_string(), key);
            }
        }

        Self::from_map(&settings)
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_or<T: FromStr>(settings: &HashMap<String, String>, key: &str, default: T) -> T {
    match settings.get(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::default();
        assert_eq!(config.page_size, 20);
        assert!(config.network_enabled);
        assert!(config.fallback_on_error);
        assert_eq!(config.initial_source, SourceKind::Primary);
    }

    #[test]
    fn test_from_map_overrides() {
        let mut settings = HashMap::new();
        settings.insert("page_size".to_string(), "12".to_string());
        settings.insert("network_enabled".to_string(), "false".to_string());
        settings.insert("initial_source".to_string(), "comparison".to_string());
        settings.insert("primary_api_key".to_string(), "abc123".to_string());

        let config = StorefrontConfig::from_map(&settings);
        assert_eq!(config.page_size, 12);
        assert!(!config.network_enabled);
        assert_eq!(config.initial_source, SourceKind::Comparison);
        assert_eq!(config.primary_api_key.as_deref(), Some("abc123"));
        assert_eq!(config.comparison_limit, 20); // default
    }

    #[test]
    fn test_from_map_invalid_values_fall_back() {
        let mut settings = HashMap::new();
        settings.insert("page_size".to_string(), "lots".to_string());
        settings.insert("request_timeout_secs".to_string(), "-3".to_string());
        settings.insert("primary_api_key".to_string(), "   ".to_string());

        let config = StorefrontConfig::from_map(&settings);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.request_timeout_secs, 10);
        assert!(config.primary_api_key.is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: StorefrontConfig =
            serde_json::from_str(r#"{"page_size": 40, "initial_source": "static"}"#).unwrap();
        assert_eq!(config.page_size, 40);
        assert_eq!(config.initial_source, SourceKind::Static);
        assert_eq!(config.comparison_limit, 20);
    }
}
