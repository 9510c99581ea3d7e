//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the guards and the host environment. Adapters implement these ports.
//!
//! ## Rate Limiting
//!
//! - `CounterStore` - Shared expiring key-value store holding per-window counts
//!
//! ## Access Guards
//!
//! - `SiteSettings` - Configuration flags and competition schedule
//! - `Clock` - Current time

mod counter_store;
mod site_settings;

pub use counter_store::{CounterStore, CounterStoreError};
pub use site_settings::{Clock, SettingsError, SiteSettings};
