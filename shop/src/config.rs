//! Configuration management for the lesson shop.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unparsable values fall back to the default with a warning.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Remote catalog service root
pub const API_ROOT_VAR: &str = "LESSON_SHOP_API_ROOT";
/// Per-request HTTP timeout, seconds
pub const REQUEST_TIMEOUT_VAR: &str = "LESSON_SHOP_REQUEST_TIMEOUT_SECS";
/// Search debounce window, milliseconds
pub const SEARCH_DEBOUNCE_VAR: &str = "LESSON_SHOP_SEARCH_DEBOUNCE_MS";
/// Whole-checkout timeout, seconds
pub const CHECKOUT_TIMEOUT_VAR: &str = "LESSON_SHOP_CHECKOUT_TIMEOUT_SECS";
/// Whether to show the built-in catalog when loading fails
pub const FALLBACK_CATALOG_VAR: &str = "LESSON_SHOP_FALLBACK_CATALOG";

/// Shop configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopConfig {
    /// Base URL of the catalog service
    pub api_root: String,
    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,
    /// Quiet period before search text is sent
    pub search_debounce: Duration,
    /// How long a checkout call waits for its outcome before reporting it interrupted
    pub checkout_timeout: Duration,
    /// Show the built-in catalog when the remote one cannot be loaded
    pub fallback_catalog: bool,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            api_root: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(30),
            search_debounce: Duration::from_millis(300),
            checkout_timeout: Duration::from_secs(60),
            fallback_catalog: true,
        }
    }
}

impl ShopConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            api_root: lookup(API_ROOT_VAR)
                .map(|root| root.trim().to_string())
                .filter(|root| !root.is_empty())
                .unwrap_or(defaults.api_root),
            request_timeout: parsed(&lookup, REQUEST_TIMEOUT_VAR)
                .map_or(defaults.request_timeout, Duration::from_secs),
            search_debounce: parsed(&lookup, SEARCH_DEBOUNCE_VAR)
                .map_or(defaults.search_debounce, Duration::from_millis),
            checkout_timeout: parsed(&lookup, CHECKOUT_TIMEOUT_VAR)
                .map_or(defaults.checkout_timeout, Duration::from_secs),
            fallback_catalog: lookup(FALLBACK_CATALOG_VAR)
                .and_then(|value| {
                    let flag = parse_flag(&value);
                    if flag.is_none() {
                        tracing::warn!(var = FALLBACK_CATALOG_VAR, %value, "Ignoring unparsable value");
                    }
                    flag
                })
                .unwrap_or(defaults.fallback_catalog),
        }
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let value = lookup(key)?;
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(var = key, %value, "Ignoring unparsable value");
    }
    parsed
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ShopConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ShopConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(config_from(&[]), ShopConfig::default());
    }

    #[test]
    fn test_reads_every_variable() {
        let config = config_from(&[
            (API_ROOT_VAR, "https://lessons.example/api"),
            (REQUEST_TIMEOUT_VAR, "5"),
            (SEARCH_DEBOUNCE_VAR, "150"),
            (CHECKOUT_TIMEOUT_VAR, "20"),
            (FALLBACK_CATALOG_VAR, "off"),
        ]);

        assert_eq!(config.api_root, "https://lessons.example/api");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.search_debounce, Duration::from_millis(150));
        assert_eq!(config.checkout_timeout, Duration::from_secs(20));
        assert!(!config.fallback_catalog);
    }

    #[test]
    fn test_bad_values_fall_back_to_defaults() {
        let config = config_from(&[
            (API_ROOT_VAR, "   "),
            (REQUEST_TIMEOUT_VAR, "soon"),
            (SEARCH_DEBOUNCE_VAR, "-1"),
            (FALLBACK_CATALOG_VAR, "maybe"),
        ]);

        assert_eq!(config, ShopConfig::default());
    }

    #[test]
    fn test_flag_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" yes "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(""), None);
    }
}
