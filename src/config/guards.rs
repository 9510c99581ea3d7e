//! Guard routing configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::access::GuardRoutes;

/// Pages the access guards redirect to
#[derive(Debug, Clone, Deserialize)]
pub struct GuardsConfig {
    #[serde(default = "default_login_route")]
    pub login_route: String,

    #[serde(default = "default_confirm_route")]
    pub confirm_route: String,

    #[serde(default = "default_team_route")]
    pub team_route: String,
}

impl GuardsConfig {
    pub fn routes(&self) -> GuardRoutes {
        GuardRoutes {
            login: self.login_route.clone(),
            confirm: self.confirm_route.clone(),
            team: self.team_route.clone(),
        }
    }

    /// Validate guard routes
    pub fn validate(&self) -> Result<(), ValidationError> {
        for route in [&self.login_route, &self.confirm_route, &self.team_route] {
            if !route.starts_with('/') {
                return Err(ValidationError::InvalidGuardRoute(route.clone()));
            }
        }
        Ok(())
    }
}

impl Default for GuardsConfig {
    fn default() -> Self {
        Self {
            login_route: default_login_route(),
            confirm_route: default_confirm_route(),
            team_route: default_team_route(),
        }
    }
}

fn default_login_route() -> String {
    GuardRoutes::default().login
}

fn default_confirm_route() -> String {
    GuardRoutes::default().confirm
}

fn default_team_route() -> String {
    GuardRoutes::default().team
}
