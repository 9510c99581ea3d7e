//! Redis-backed counter store for multi-server deployments.
//!
//! Counts are plain integer strings written with `SET key value EX secs`,
//! so every server sharing the Redis instance shares the same windows.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;

use crate::ports::{CounterStore, CounterStoreError};

/// Counter store over a multiplexed Redis connection.
///
/// The connection is cloned per call; clones share one socket.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: MultiplexedConnection,
    timeout: Option<Duration>,
}

impl RedisCounterStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            timeout: None,
        }
    }

    /// Connect to `url` and build a store.
    pub async fn connect(url: &str) -> Result<Self, CounterStoreError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self::new(conn))
    }

    /// Fail commands that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn bounded<T, F>(&self, command: F) -> Result<T, CounterStoreError>
    where
        F: Future<Output = Result<T, redis::RedisError>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command)
                .await
                .map_err(|_| CounterStoreError::Timeout)?
                .map_err(unavailable),
            None => command.await.map_err(unavailable),
        }
    }
}

fn unavailable(e: redis::RedisError) -> CounterStoreError {
    if e.is_timeout() {
        CounterStoreError::Timeout
    } else {
        CounterStoreError::Unavailable(e.to_string())
    }
}

/// Redis keeps expiry deadlines as signed milliseconds.
const MAX_EXPIRY_SECS: u64 = (i64::MAX / 1000) as u64;

/// Seconds argument for `SET ... EX`, rejecting values Redis cannot store.
fn expiry_arg(key: &str, expiry_secs: u64) -> Result<u64, CounterStoreError> {
    if expiry_secs > MAX_EXPIRY_SECS {
        return Err(CounterStoreError::InvalidExpiry {
            key: key.to_string(),
            expiry_secs,
        });
    }
    Ok(expiry_secs)
}

/// Parse a stored count. Anything but a non-negative integer is rejected.
fn parse_count(key: &str, raw: &str) -> Result<u64, CounterStoreError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| CounterStoreError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get(&self, key: &str) -> Result<Option<u64>, CounterStoreError> {
        let mut conn = self.conn.clone();

        let raw: Option<String> = self.bounded(conn.get(key)).await?;

        raw.map(|value| parse_count(key, &value)).transpose()
    }

    async fn set(&self, key: &str, value: u64, expiry_secs: u64) -> Result<(), CounterStoreError> {
        let expiry_secs = expiry_arg(key, expiry_secs)?;
        let mut conn = self.conn.clone();

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(expiry_secs);

        self.bounded(cmd.query_async::<_, ()>(&mut conn)).await
    }
}

impl std::fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
