//! Rate limit rule value object.

use http::Method;

use super::CallContext;
use crate::domain::foundation::ValidationError;

/// Configuration for one rate-limited operation.
///
/// Created once when the guard is registered and never mutated. Calls whose
/// method differs from `method` are not counted at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    method: Method,
    limit: u64,
    interval_secs: u64,
    key_prefix: String,
}

impl RateLimitRule {
    pub const DEFAULT_LIMIT: u64 = 50;
    pub const DEFAULT_INTERVAL_SECS: u64 = 300;
    pub const DEFAULT_KEY_PREFIX: &'static str = "rl";
    /// Longest window a rule may use: one leap year.
    pub const MAX_INTERVAL_SECS: u64 = 366 * 24 * 60 * 60;

    /// Creates a rule, rejecting an interval outside
    /// `1..=MAX_INTERVAL_SECS` or an empty key prefix.
    pub fn new(
        method: Method,
        limit: u64,
        interval_secs: u64,
        key_prefix: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let key_prefix = key_prefix.into();
        if interval_secs == 0 {
            return Err(ValidationError::too_small("interval", 1, 0));
        }
        if interval_secs > Self::MAX_INTERVAL_SECS {
            return Err(ValidationError::too_large(
                "interval",
                Self::MAX_INTERVAL_SECS,
                interval_secs,
            ));
        }
        if key_prefix.is_empty() {
            return Err(ValidationError::empty_field("key_prefix"));
        }
        Ok(Self {
            method,
            limit,
            interval_secs,
            key_prefix,
        })
    }

    /// Parses the method from its textual form (e.g. `"POST"`).
    pub fn parse(
        method: &str,
        limit: u64,
        interval_secs: u64,
        key_prefix: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|e| ValidationError::invalid_format("method", e.to_string()))?;
        Self::new(method, limit, interval_secs, key_prefix)
    }

    /// Shorthand for a `POST` rule with the default prefix.
    pub fn post(limit: u64, interval_secs: u64) -> Result<Self, ValidationError> {
        Self::new(Method::POST, limit, interval_secs, Self::DEFAULT_KEY_PREFIX)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Returns true if calls with `method` are counted by this rule.
    pub fn applies_to(&self, method: &Method) -> bool {
        &self.method == method
    }

    /// Counter key for a call: `prefix:identity:operation`.
    pub fn counter_key(&self, call: &CallContext) -> String {
        format!(
            "{}:{}:{}",
            self.key_prefix, call.identity, call.operation_id
        )
    }

    /// Returns true if an existing count leaves no room for another call.
    pub fn is_exhausted_by(&self, current: u64) -> bool {
        current >= self.limit
    }

    /// User-facing text for a rejected call.
    pub fn rejection_message(&self) -> String {
        format!(
            "Too many requests. Limit is {} requests in {} seconds",
            self.limit, self.interval_secs
        )
    }
}

impl Default for RateLimitRule {
    fn default() -> Self {
        Self {
            method: Method::POST,
            limit: Self::DEFAULT_LIMIT,
            interval_secs: Self::DEFAULT_INTERVAL_SECS,
            key_prefix: Self::DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}
