//! Guard outcomes and redirect targets.

use serde::{Deserialize, Serialize};

/// What a guard decided for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Let the request reach its handler.
    Proceed,
    /// Send the visitor elsewhere (e.g. the login page).
    Redirect { location: String },
    /// Refuse the request with a status and message.
    Deny { status: u16, message: String },
}

impl GuardOutcome {
    pub fn forbidden(message: impl Into<String>) -> Self {
        GuardOutcome::Deny {
            status: 403,
            message: message.into(),
        }
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, GuardOutcome::Proceed)
    }
}

/// Paths guards redirect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardRoutes {
    /// Sign-in page.
    #[serde(default = "default_login")]
    pub login: String,

    /// Email confirmation page.
    #[serde(default = "default_confirm")]
    pub confirm: String,

    /// Team join/create page.
    #[serde(default = "default_team")]
    pub team: String,
}

impl GuardRoutes {
    /// Redirect to `route`, remembering where the visitor was headed.
    pub fn with_next(route: &str, path: &str) -> GuardOutcome {
        GuardOutcome::Redirect {
            location: format!("{}?next={}", route, urlencoding::encode(path)),
        }
    }

    pub fn login_then(&self, path: &str) -> GuardOutcome {
        Self::with_next(&self.login, path)
    }

    pub fn team_then(&self, path: &str) -> GuardOutcome {
        Self::with_next(&self.team, path)
    }

    pub fn confirm_email(&self) -> GuardOutcome {
        GuardOutcome::Redirect {
            location: self.confirm.clone(),
        }
    }
}

impl Default for GuardRoutes {
    fn default() -> Self {
        Self {
            login: default_login(),
            confirm: default_confirm(),
            team: default_team(),
        }
    }
}

fn default_login() -> String {
    "/login".to_string()
}

fn default_confirm() -> String {
    "/confirm".to_string()
}

fn default_team() -> String {
    "/team".to_string()
}
