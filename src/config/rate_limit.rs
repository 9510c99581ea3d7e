//! Rate limit configuration

use std::net::IpAddr;

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::rate_limit::{RateLimitRule, StoreFailurePolicy};

/// Rule applied to rate-limited routes
///
/// Environment variables:
/// - `CTF_GATEKEEPER__RATE_LIMIT__METHOD=POST`
/// - `CTF_GATEKEEPER__RATE_LIMIT__LIMIT=50`
/// - `CTF_GATEKEEPER__RATE_LIMIT__INTERVAL_SECS=300`
/// - `CTF_GATEKEEPER__RATE_LIMIT__KEY_PREFIX=rl`
/// - `CTF_GATEKEEPER__RATE_LIMIT__ON_STORE_FAILURE=fail_open`
/// - `CTF_GATEKEEPER__RATE_LIMIT__TRUSTED_PROXIES=10.0.0.2,10.0.0.3`
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// HTTP method that is counted
    #[serde(default = "default_method")]
    pub method: String,

    /// Calls admitted per window
    #[serde(default = "default_limit")]
    pub limit: u64,

    /// Window length in seconds
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Counter key namespace
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// What to do when the counter store is unreachable
    #[serde(default)]
    pub on_store_failure: StoreFailurePolicy,

    /// Comma-separated peer addresses whose `X-Forwarded-For` is believed.
    /// Empty means forwarded headers are ignored.
    #[serde(default)]
    pub trusted_proxies: String,
}

impl RateLimitConfig {
    /// Build the domain rule
    pub fn to_rule(&self) -> Result<RateLimitRule, ValidationError> {
        self.validate()?;
        RateLimitRule::parse(&self.method, self.limit, self.interval_secs, self.key_prefix.as_str())
            .map_err(|e| ValidationError::InvalidRateLimitMethod(e.to_string()))
    }

    /// Parse `trusted_proxies` into addresses
    pub fn trusted_proxy_addrs(&self) -> Result<Vec<IpAddr>, ValidationError> {
        self.trusted_proxies
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                entry
                    .parse::<IpAddr>()
                    .map_err(|_| ValidationError::InvalidTrustedProxy(entry.to_string()))
            })
            .collect()
    }

    /// Validate rate limit configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 {
            return Err(ValidationError::InvalidRateLimitInterval);
        }
        if self.interval_secs > RateLimitRule::MAX_INTERVAL_SECS {
            return Err(ValidationError::RateLimitIntervalTooLarge(
                RateLimitRule::MAX_INTERVAL_SECS,
            ));
        }
        if self.key_prefix.trim().is_empty() {
            return Err(ValidationError::EmptyKeyPrefix);
        }
        let method = self.method.trim();
        if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidRateLimitMethod(self.method.clone()));
        }
        self.trusted_proxy_addrs()?;
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            limit: default_limit(),
            interval_secs: default_interval(),
            key_prefix: default_key_prefix(),
            on_store_failure: StoreFailurePolicy::default(),
            trusted_proxies: String::new(),
        }
    }
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_limit() -> u64 {
    RateLimitRule::DEFAULT_LIMIT
}

fn default_interval() -> u64 {
    RateLimitRule::DEFAULT_INTERVAL_SECS
}

fn default_key_prefix() -> String {
    RateLimitRule::DEFAULT_KEY_PREFIX.to_string()
}
