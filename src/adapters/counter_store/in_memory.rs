//! In-memory counter store for testing and single-server deployments.
//!
//! Entries carry a deadline measured with `tokio::time::Instant`, so tests
//! can pause and advance time instead of sleeping. Expired entries are
//! treated as absent on read and replaced on write. `purge_expired` drops
//! them eagerly, and `spawn_purger` runs it on a timer so a long-lived
//! process does not keep one dead entry per client ever seen.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::ports::{CounterStore, CounterStoreError};

/// Process-wide expiring counter map.
///
/// Clones share the same map, so every handler holding a clone sees the
/// same counts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCounterStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: u64,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

impl InMemoryCounterStore {
    /// Purge period used by the server binary.
    pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(60);

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub async fn stored_len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Seconds until `key` expires, if it is live.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.expires_at - now)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        before - entries.len()
    }

    /// Run `purge_expired` every `period` on a background task.
    ///
    /// The task holds a clone of the store and runs until aborted.
    pub fn spawn_purger(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = store.purge_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "purged expired rate limit counters");
                }
            }
        })
    }

    /// Remove all entries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<u64>, CounterStoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value))
    }

    async fn set(&self, key: &str, value: u64, expiry_secs: u64) -> Result<(), CounterStoreError> {
        let expires_at = Instant::now()
            .checked_add(Duration::from_secs(expiry_secs))
            .ok_or_else(|| CounterStoreError::InvalidExpiry {
                key: key.to_string(),
                expiry_secs,
            })?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::RateLimiter;
    use crate::domain::rate_limit::{CallContext, RateLimitDecision, RateLimitRule};
    use http::Method;

    #[tokio::test]
    async fn missing_key_reads_none() {
        let store = InMemoryCounterStore::new();
        assert_eq!(store.get("rl:nobody:login").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let store = InMemoryCounterStore::new();
        store.set("k", 7, 60).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn set_overwrites_value() {
        let store = InMemoryCounterStore::new();
        store.set("k", 1, 60).await.unwrap();
        store.set("k", 2, 60).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(2));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_interval() {
        let store = InMemoryCounterStore::new();
        store.set("k", 3, 10).await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(store.get("k").await.unwrap(), Some(3));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn set_restarts_expiry() {
        let store = InMemoryCounterStore::new();
        store.set("k", 1, 10).await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        store.set("k", 2, 10).await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(store.get("k").await.unwrap(), Some(2));
        assert_eq!(store.ttl("k").await, Some(Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn purge_removes_only_expired_entries() {
        let store = InMemoryCounterStore::new();
        store.set("short", 1, 5).await.unwrap();
        store.set("long", 1, 50).await.unwrap();

        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.get("long").await.unwrap(), Some(1));
        assert!(!store.is_empty().await);
    }

    #[tokio::test]
    async fn unrepresentable_expiry_is_an_error() {
        let store = InMemoryCounterStore::new();

        let result = store.set("k", 1, u64::MAX).await;

        assert_eq!(
            result,
            Err(CounterStoreError::InvalidExpiry {
                key: "k".to_string(),
                expiry_secs: u64::MAX,
            })
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_stay_stored_until_purged() {
        let store = InMemoryCounterStore::new();
        store.set("k", 1, 5).await.unwrap();

        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(store.len().await, 0);
        assert_eq!(store.stored_len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn purger_drops_expired_entries_in_background() {
        let store = InMemoryCounterStore::new();
        for client in 0..100 {
            store.set(&format!("rl:10.0.0.{}:login", client), 1, 5).await.unwrap();
        }
        store.set("rl:10.0.1.1:login", 1, 3600).await.unwrap();

        let purger = store.spawn_purger(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(store.stored_len().await, 1);
        assert_eq!(store.get("rl:10.0.1.1:login").await.unwrap(), Some(1));
        purger.abort();
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = InMemoryCounterStore::new();
        let other = store.clone();

        store.set("k", 4, 60).await.unwrap();

        assert_eq!(other.get("k").await.unwrap(), Some(4));
        other.clear().await;
        assert!(store.is_empty().await);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // With the rate limiter
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test(start_paused = true)]
    async fn window_resets_after_interval_of_inactivity() {
        let store = Arc::new(InMemoryCounterStore::new());
        let limiter = RateLimiter::new(store.clone());
        let rule = RateLimitRule::new(Method::POST, 2, 300, "rl").unwrap();
        let call = CallContext::new(Method::POST, "10.0.0.1", "submit");

        assert!(limiter.check_and_record(&rule, &call).await.unwrap().is_admitted());
        assert!(limiter.check_and_record(&rule, &call).await.unwrap().is_admitted());
        assert!(limiter.check_and_record(&rule, &call).await.unwrap().is_rejected());

        tokio::time::advance(Duration::from_secs(300)).await;

        assert_eq!(
            limiter.check_and_record(&rule, &call).await.unwrap(),
            RateLimitDecision::Admitted { count: 1 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn admitted_calls_extend_the_window() {
        let store = Arc::new(InMemoryCounterStore::new());
        let limiter = RateLimiter::new(store.clone());
        let rule = RateLimitRule::new(Method::POST, 3, 100, "rl").unwrap();
        let call = CallContext::new(Method::POST, "10.0.0.1", "submit");

        limiter.check_and_record(&rule, &call).await.unwrap();
        tokio::time::advance(Duration::from_secs(90)).await;
        limiter.check_and_record(&rule, &call).await.unwrap();
        tokio::time::advance(Duration::from_secs(90)).await;

        // 180s after the first call, the count survives because the second
        // admission restarted the expiry.
        assert_eq!(
            limiter.check_and_record(&rule, &call).await.unwrap(),
            RateLimitDecision::Admitted { count: 3 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_calls_do_not_extend_the_window() {
        let store = Arc::new(InMemoryCounterStore::new());
        let limiter = RateLimiter::new(store.clone());
        let rule = RateLimitRule::new(Method::POST, 1, 100, "rl").unwrap();
        let call = CallContext::new(Method::POST, "10.0.0.1", "submit");

        limiter.check_and_record(&rule, &call).await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(limiter.check_and_record(&rule, &call).await.unwrap().is_rejected());
        tokio::time::advance(Duration::from_secs(40)).await;

        assert!(limiter.check_and_record(&rule, &call).await.unwrap().is_admitted());
    }

    #[tokio::test]
    async fn concurrent_tasks_share_counts() {
        let store = Arc::new(InMemoryCounterStore::new());
        let limiter = RateLimiter::new(store.clone());
        let rule = RateLimitRule::new(Method::POST, 5, 60, "rl").unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            let rule = rule.clone();
            handles.push(tokio::spawn(async move {
                let call = CallContext::new(Method::POST, "10.0.0.9", "login");
                limiter.check_and_record(&rule, &call).await.unwrap()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_admitted() {
                admitted += 1;
            }
        }

        // Read and write are separate steps, so a racing pair may both be
        // admitted on the same count.
        assert!(admitted >= 5);
        assert!(store.get("rl:10.0.0.9:login").await.unwrap().unwrap() <= 5);
    }
}
