//! Counter store adapters.
//!
//! Implementations of the CounterStore port for different backends.
//!
//! ## Available Adapters
//!
//! - `InMemoryCounterStore` - In-process map for testing and single-server
//! - `RedisCounterStore` - Redis-backed for multi-server deployments
//!
//! ## Usage
//!
//! ```ignore
//! use ctf_gatekeeper::adapters::counter_store::{InMemoryCounterStore, RedisCounterStore};
//! use ctf_gatekeeper::application::RateLimiter;
//!
//! // For testing
//! let limiter = RateLimiter::new(Arc::new(InMemoryCounterStore::new()));
//!
//! // For production
//! let store = RedisCounterStore::connect("redis://127.0.0.1/").await?;
//! let limiter = RateLimiter::new(Arc::new(store));
//! ```

mod in_memory;
mod redis;

pub use in_memory::InMemoryCounterStore;
pub use redis::RedisCounterStore;
