//! Site settings and clock ports.
//!
//! Configuration storage belongs to the host application. Guards only need
//! a consistent snapshot per request and the current time.

use async_trait::async_trait;

use crate::domain::competition::SettingsSnapshot;
use crate::domain::foundation::Timestamp;

/// Source of the configuration flags guards consult.
#[async_trait]
pub trait SiteSettings: Send + Sync {
    /// Read the current settings.
    async fn snapshot(&self) -> Result<SettingsSnapshot, SettingsError>;
}

/// Source of the current time.
///
/// Injected so guard decisions around the competition window are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Errors that can occur while reading settings.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    /// The settings backend is unreachable.
    #[error("settings unavailable: {0}")]
    Unavailable(String),
}
