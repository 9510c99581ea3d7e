//! Competition settings for the bundled in-memory settings store
//!
//! Hosts that keep settings in their own database implement `SiteSettings`
//! and ignore this section.

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::competition::{CompetitionWindow, SettingsSnapshot, UserMode};
use crate::domain::foundation::Timestamp;

/// Initial site settings
#[derive(Debug, Clone, Deserialize)]
pub struct CompetitionConfig {
    #[serde(default = "default_ctf_name")]
    pub name: String,

    /// Start as unix seconds
    pub start: Option<u64>,

    /// End as unix seconds
    pub end: Option<u64>,

    #[serde(default)]
    pub paused: bool,

    #[serde(default)]
    pub view_after_ctf: bool,

    #[serde(default)]
    pub verify_emails: bool,

    #[serde(default)]
    pub user_mode: UserMode,

    #[serde(default)]
    pub challenges_public: bool,
}

impl CompetitionConfig {
    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            ctf_name: self.name.clone(),
            window: CompetitionWindow {
                start: self.start.map(Timestamp::from_unix_secs),
                end: self.end.map(Timestamp::from_unix_secs),
                paused: self.paused,
            },
            view_after_ctf: self.view_after_ctf,
            verify_emails: self.verify_emails,
            user_mode: self.user_mode,
            challenges_public: self.challenges_public,
            ..SettingsSnapshot::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start >= end {
                return Err(ValidationError::InvalidCompetitionWindow);
            }
        }
        Ok(())
    }
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            name: default_ctf_name(),
            start: None,
            end: None,
            paused: false,
            view_after_ctf: false,
            verify_emails: false,
            user_mode: UserMode::default(),
            challenges_public: false,
        }
    }
}

fn default_ctf_name() -> String {
    "CTF".to_string()
}
