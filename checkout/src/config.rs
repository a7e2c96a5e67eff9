//! Configuration management for the checkout.
//!
//! Loads configuration from environment variables with sensible defaults.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration problems found by [`CheckoutConfig::validate`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The room service URL is empty or not http(s)
    #[error("invalid room service URL: {0:?}")]
    InvalidApiUrl(String),

    /// Requests would time out immediately
    #[error("request timeout must be at least one second")]
    ZeroTimeout,
}

/// Checkout configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Base URL of the room service
    pub api_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// How long form notices stay visible, in seconds
    pub notice_ttl_secs: u64,
    /// Signed-in guest identifier used to pre-fill the email
    pub guest_id: String,
    /// Log filter directive
    pub log_level: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_url: lookup("ROOMKEEP_API_URL")
                .unwrap_or_else(|| "http://localhost:9192".to_string()),
            request_timeout_secs: lookup("ROOMKEEP_REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(10),
            notice_ttl_secs: lookup("ROOMKEEP_NOTICE_TTL_SECS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(5),
            guest_id: lookup("ROOMKEEP_GUEST_ID").unwrap_or_default(),
            log_level: lookup("RUST_LOG")
                .unwrap_or_else(|| "roomkeep_checkout=debug,roomkeep_runtime=info".to_string()),
        }
    }

    /// Check the configuration before building clients from it
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] for an empty or non-http URL and
    /// [`ConfigError::ZeroTimeout`] for a zero request timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let usable = Url::parse(self.api_url.trim()).is_ok_and(|url| {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        });

        if !usable {
            return Err(ConfigError::InvalidApiUrl(self.api_url.clone()));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }

    /// Request timeout as a [`Duration`]
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Notice lifetime as a [`Duration`]
    #[must_use]
    pub const fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }
}
