//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `counter_store` - Counter stores (in-memory, Redis)
//! - `settings` - Site settings (in-memory)
//! - `clock` - System and fixed clocks
//! - `http` - axum middleware and extractors

pub mod clock;
pub mod counter_store;
pub mod http;
pub mod settings;

pub use clock::{FixedClock, SystemClock};
pub use counter_store::{InMemoryCounterStore, RedisCounterStore};
pub use settings::InMemorySiteSettings;
