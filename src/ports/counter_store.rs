//! Shared counter store port.
//!
//! The rate limiter keeps its per-window counts in an external key-value
//! store with per-key expiry. Every enforcement point (thread, task or
//! process) that applies the same rule must talk to the same store, so the
//! store is the source of truth for counts.
//!
//! Implementations exist for an in-process map (tests, single-server) and
//! Redis (multi-server).

use async_trait::async_trait;

/// Expiring integer key-value store.
///
/// # Contract
///
/// - `get` returns `None` for missing or expired keys.
/// - `set` overwrites any existing value and restarts the key's expiry at
///   `expiry_secs` seconds from now.
/// - Expiry has second-level granularity.
/// - Errors describe store-side failures only; they are never retried here.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read the current count for `key`.
    async fn get(&self, key: &str) -> Result<Option<u64>, CounterStoreError>;

    /// Store `value` under `key`, expiring after `expiry_secs` seconds.
    async fn set(&self, key: &str, value: u64, expiry_secs: u64) -> Result<(), CounterStoreError>;
}

/// Errors raised by a counter store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CounterStoreError {
    /// The backend could not be reached or refused the command.
    #[error("counter store unavailable: {0}")]
    Unavailable(String),

    /// The backend did not answer in time.
    #[error("counter store timed out")]
    Timeout,

    /// A key held something that is not a non-negative integer.
    #[error("counter store key '{key}' holds a non-integer value: {value}")]
    InvalidValue { key: String, value: String },

    /// The expiry cannot be represented by the backend.
    #[error("counter store cannot expire key '{key}' after {expiry_secs} seconds")]
    InvalidExpiry { key: String, expiry_secs: u64 },
}

impl CounterStoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
