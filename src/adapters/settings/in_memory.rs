//! In-memory site settings for tests and development.
//!
//! Holds one `SettingsSnapshot` that can be replaced at runtime, standing in
//! for the host application's configuration table.
//!
//! # Example
//!
//! ```ignore
//! use ctf_gatekeeper::adapters::settings::InMemorySiteSettings;
//! use ctf_gatekeeper::domain::competition::{SettingsSnapshot, UserMode};
//!
//! let settings = InMemorySiteSettings::new(SettingsSnapshot {
//!     user_mode: UserMode::Teams,
//!     ..SettingsSnapshot::default()
//! });
//!
//! // Later, an admin pauses the competition
//! settings.update(|s| s.window.paused = true).await;
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::competition::SettingsSnapshot;
use crate::ports::{SettingsError, SiteSettings};

/// Mutable settings held in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySiteSettings {
    snapshot: Arc<RwLock<SettingsSnapshot>>,
    force_error: Arc<RwLock<Option<SettingsError>>>,
}

impl InMemorySiteSettings {
    pub fn new(snapshot: SettingsSnapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            force_error: Arc::default(),
        }
    }

    /// Forces every read to fail with `error`.
    ///
    /// Useful for testing error handling paths.
    pub fn with_error(mut self, error: SettingsError) -> Self {
        self.force_error = Arc::new(RwLock::new(Some(error)));
        self
    }

    /// Replace the whole snapshot.
    pub async fn replace(&self, snapshot: SettingsSnapshot) {
        *self.snapshot.write().await = snapshot;
    }

    /// Modify the snapshot in place.
    pub async fn update<F>(&self, change: F)
    where
        F: FnOnce(&mut SettingsSnapshot),
    {
        change(&mut *self.snapshot.write().await);
    }

    /// Clears any forced error.
    pub async fn clear_error(&self) {
        *self.force_error.write().await = None;
    }
}

#[async_trait]
impl SiteSettings for InMemorySiteSettings {
    async fn snapshot(&self) -> Result<SettingsSnapshot, SettingsError> {
        if let Some(error) = self.force_error.read().await.clone() {
            return Err(error);
        }
        Ok(self.snapshot.read().await.clone())
    }
}
