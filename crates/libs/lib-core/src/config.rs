//! # Application Configuration
//!
//! This module manages application configuration loaded from environment variables.
//! All configuration is validated on startup to fail fast if misconfigured.
//!
//! ## Global Config Access
//!
//! Use [`core_config()`] to access the global configuration instance:
//!
//! ```rust,no_run
//! use lib_core::config::core_config;
//!
//! let config = core_config();
//! let base = &config.swap_api_base_url;
//! ```
//!
//! The config must be initialized once at application startup using [`init_config()`].

use lib_utils::envs::{get_env, get_env_opt, get_env_or, get_env_parse_or};
use lib_utils::validation::validate_http_url;
use std::sync::OnceLock;
use std::time::Duration;

/// Default tracker poll interval (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Default tracker retry budget. At the default interval this bounds
/// tracking to roughly 25 minutes.
pub const DEFAULT_MAX_RETRIES: u32 = 900;

/// Default upstream timeout for the price proxy (milliseconds).
pub const DEFAULT_PRICE_PROXY_TIMEOUT_MS: u64 = 3_000;

/// Default per-request timeout for swap status fetches (milliseconds).
pub const DEFAULT_SWAP_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// Swap vendor base URL; statuses are read from `{base}/swap/trx/{swapId}`
    pub swap_api_base_url: String,

    /// Delay between two status polls
    pub poll_interval: Duration,

    /// Retry budget before tracking gives up with a timeout
    pub max_retries: u32,

    /// Per-request timeout for swap status fetches
    pub swap_request_timeout: Duration,

    /// Upstream timeout for `GET /api/etherfi-price`
    pub price_proxy_timeout: Duration,

    /// Backend analytics API. `None` disables metrics recording.
    pub metrics_api_url: Option<String>,

    /// HTTP bind address for the backend server
    pub bind_address: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let swap_api_base_url = get_env("SWAP_API_BASE_URL")
            .map_err(|_| "SWAP_API_BASE_URL must be set in environment")?;

        let poll_interval_ms: u64 = get_env_parse_or("SWAP_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)
            .map_err(|_| "SWAP_POLL_INTERVAL_MS must be a valid number of milliseconds")?;

        let max_retries: u32 = get_env_parse_or("SWAP_MAX_RETRIES", DEFAULT_MAX_RETRIES)
            .map_err(|_| "SWAP_MAX_RETRIES must be a valid number")?;

        let swap_request_timeout_ms: u64 =
            get_env_parse_or("SWAP_REQUEST_TIMEOUT_MS", DEFAULT_SWAP_REQUEST_TIMEOUT_MS)
                .map_err(|_| "SWAP_REQUEST_TIMEOUT_MS must be a valid number of milliseconds")?;

        let price_proxy_timeout_ms: u64 =
            get_env_parse_or("PRICE_PROXY_TIMEOUT_MS", DEFAULT_PRICE_PROXY_TIMEOUT_MS)
                .map_err(|_| "PRICE_PROXY_TIMEOUT_MS must be a valid number of milliseconds")?;

        Ok(Self {
            swap_api_base_url: swap_api_base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_retries,
            swap_request_timeout: Duration::from_millis(swap_request_timeout_ms),
            price_proxy_timeout: Duration::from_millis(price_proxy_timeout_ms),
            metrics_api_url: get_env_opt("METRICS_API_URL"),
            bind_address: get_env_or("BIND_ADDRESS", "127.0.0.1:3001"),
        })
    }

    /// Configuration with defaults for everything but the vendor URL.
    pub fn with_swap_api(swap_api_base_url: impl Into<String>) -> Self {
        Self {
            swap_api_base_url: swap_api_base_url.into().trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            swap_request_timeout: Duration::from_millis(DEFAULT_SWAP_REQUEST_TIMEOUT_MS),
            price_proxy_timeout: Duration::from_millis(DEFAULT_PRICE_PROXY_TIMEOUT_MS),
            metrics_api_url: None,
            bind_address: "127.0.0.1:3001".to_string(),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        validate_http_url(&self.swap_api_base_url, "SWAP_API_BASE_URL")?;

        if let Some(metrics_url) = &self.metrics_api_url {
            validate_http_url(metrics_url, "METRICS_API_URL")?;
        }

        if self.poll_interval.is_zero() {
            return Err("SWAP_POLL_INTERVAL_MS must be greater than 0".to_string());
        }

        if self.max_retries == 0 {
            return Err("SWAP_MAX_RETRIES must be greater than 0".to_string());
        }

        if self.swap_request_timeout.is_zero() || self.price_proxy_timeout.is_zero() {
            return Err("Request timeouts must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Global configuration instance (initialized once at startup).
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Initialize the global configuration.
///
/// This should be called once at application startup, before any handlers
/// or services that need configuration are used.
///
/// # Errors
///
/// Returns an error if:
/// - Environment variables are missing or invalid
/// - Configuration validation fails
/// - Config has already been initialized
pub fn init_config() -> Result<&'static Config, String> {
    let config = Config::from_env()?;
    config.validate()?;

    CONFIG
        .set(config)
        .map_err(|_| "Config has already been initialized".to_string())?;

    Ok(core_config())
}

/// Get a reference to the global configuration.
///
/// # Panics
///
/// Panics if [`init_config()`] has not been called yet. This ensures
/// configuration is always available when accessed.
pub fn core_config() -> &'static Config {
    CONFIG.get().expect("Config must be initialized with init_config() before use")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::with_swap_api("https://api.swap.example/");

        assert_eq!(config.swap_api_base_url, "https://api.swap.example");
        assert_eq!(config.poll_interval, Duration::from_millis(2_000));
        assert_eq!(config.max_retries, 900);
        assert_eq!(config.price_proxy_timeout, Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::with_swap_api("api.swap.example");
        assert!(config.validate().is_err());

        config.swap_api_base_url = "https://api.swap.example".to_string();
        config.max_retries = 0;
        assert_eq!(
            config.validate().unwrap_err(),
            "SWAP_MAX_RETRIES must be greater than 0"
        );

        config.max_retries = 3;
        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        config.poll_interval = Duration::from_millis(10);
        config.metrics_api_url = Some("metrics.local".to_string());
        assert!(config.validate().is_err());

        config.metrics_api_url = None;
        config.swap_api_base_url = "https://bad host/v1".to_string();
        assert!(config
            .validate()
            .unwrap_err()
            .starts_with("SWAP_API_BASE_URL is not a valid URL"));
    }
}
