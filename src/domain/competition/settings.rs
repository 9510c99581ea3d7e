//! Site settings consulted by access guards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::CompetitionWindow;

/// Whether competitors play alone or in teams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserMode {
    #[default]
    Users,
    Teams,
}

impl UserMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserMode::Users => "users",
            UserMode::Teams => "teams",
        }
    }
}

impl fmt::Display for UserMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A point-in-time read of the host's configuration.
///
/// Guards take a snapshot per request so a single decision never mixes
/// values from two different configuration states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    /// Display name of the competition, used in denial messages.
    #[serde(default = "default_ctf_name")]
    pub ctf_name: String,

    /// When the competition runs.
    #[serde(default)]
    pub window: CompetitionWindow,

    /// Keep guarded pages readable after the competition ends.
    #[serde(default)]
    pub view_after_ctf: bool,

    /// Require confirmed email addresses for non-admin users.
    #[serde(default)]
    pub verify_emails: bool,

    /// Individual or team play.
    #[serde(default)]
    pub user_mode: UserMode,

    /// Let anonymous visitors browse challenges.
    #[serde(default)]
    pub challenges_public: bool,

    /// Free-form boolean flags looked up by name.
    #[serde(default)]
    pub flags: HashMap<String, bool>,
}

impl SettingsSnapshot {
    /// Looks up a named boolean flag. Unknown flags are off.
    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn with_flag(mut self, key: impl Into<String>, value: bool) -> Self {
        self.flags.insert(key.into(), value);
        self
    }

    pub fn is_teams_mode(&self) -> bool {
        self.user_mode == UserMode::Teams
    }
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            ctf_name: default_ctf_name(),
            window: CompetitionWindow::default(),
            view_after_ctf: false,
            verify_emails: false,
            user_mode: UserMode::default(),
            challenges_public: false,
            flags: HashMap::new(),
        }
    }
}

fn default_ctf_name() -> String {
    "CTF".to_string()
}
