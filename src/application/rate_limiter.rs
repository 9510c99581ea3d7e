//! RateLimiter - fixed-window call counting over a shared counter store.
//!
//! For each call whose method matches the rule, the limiter reads the
//! window's count, rejects if the limit is reached, and otherwise writes
//! back the incremented count with the rule's interval as expiry.
//!
//! # Known behavior
//!
//! - Read and write are separate store calls. Two concurrent calls for the
//!   same key can both read the same count, so one increment is lost and up
//!   to `limit + 1` calls may be admitted in a window.
//! - Every admitted call restarts the key's expiry. Steady traffic below the
//!   limit keeps the window alive; it only resets after `interval` seconds
//!   with no admitted call.

use std::future::Future;
use std::sync::Arc;

use crate::domain::rate_limit::{CallContext, RateLimitDecision, RateLimitRejection, RateLimitRule};
use crate::ports::{CounterStore, CounterStoreError};

/// Enforces rate limit rules against an injected counter store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Decide whether `call` may proceed under `rule`, recording it if so.
    ///
    /// Performs no store access when the method does not match, one read
    /// when rejecting, and one read plus one write when admitting.
    pub async fn check_and_record(
        &self,
        rule: &RateLimitRule,
        call: &CallContext,
    ) -> Result<RateLimitDecision, CounterStoreError> {
        if !rule.applies_to(&call.method) {
            return Ok(RateLimitDecision::Skipped);
        }

        let key = rule.counter_key(call);
        let current = self.store.get(&key).await?;

        if let Some(count) = current {
            if rule.is_exhausted_by(count) {
                tracing::info!(
                    key = %key,
                    count,
                    limit = rule.limit(),
                    "rate limit exceeded"
                );
                return Ok(RateLimitDecision::Rejected(RateLimitRejection::for_rule(rule)));
            }
        }

        let next = current.map_or(1, |count| count + 1);
        self.store.set(&key, next, rule.interval_secs()).await?;

        tracing::debug!(key = %key, count = next, limit = rule.limit(), "call admitted");
        Ok(RateLimitDecision::Admitted { count: next })
    }

    /// Run `handler` only if `call` is admitted under `rule`.
    ///
    /// Returns the handler's output unchanged on admission, the rejection
    /// when the window is exhausted, or the store error if counting failed.
    /// The handler is never invoked on rejection or store error.
    pub async fn guard<F, Fut, T>(
        &self,
        rule: &RateLimitRule,
        call: &CallContext,
        handler: F,
    ) -> Result<Result<T, RateLimitRejection>, CounterStoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self.check_and_record(rule, call).await? {
            RateLimitDecision::Rejected(rejection) => Ok(Err(rejection)),
            RateLimitDecision::Skipped | RateLimitDecision::Admitted { .. } => {
                Ok(Ok(handler().await))
            }
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}
