//! Guard definitions and evaluation.

use crate::domain::competition::SettingsSnapshot;
use crate::domain::foundation::{Timestamp, Viewer};

use super::{GuardOutcome, GuardRoutes};

const DEFAULT_AUTHORIZATION_ERROR: &str = "An authorization error has occured";

/// Everything a guard needs to decide.
#[derive(Debug, Clone, Copy)]
pub struct GuardInput<'a> {
    pub viewer: &'a Viewer,
    pub settings: &'a SettingsSnapshot,
    pub now: Timestamp,
    /// Path of the guarded request, used for `next=` redirects.
    pub path: &'a str,
}

/// A named access rule applied in front of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessGuard {
    /// Only reachable while the competition is running (admins always pass).
    DuringCtfTimeOnly,
    /// Sign-in required when the named settings flag is on.
    RequireAuthenticationIfConfig { flag: String },
    /// Non-admin users must have confirmed their email when verification is on.
    RequireVerifiedEmails,
    /// Reachable anonymously when challenges are public.
    ///
    /// Otherwise denies with `status` if given, or redirects to login.
    ViewableWithoutAuthentication {
        status: Option<u16>,
        message: Option<String>,
    },
    /// Any signed-in user.
    AuthedOnly,
    /// Signed-in admins only.
    AdminsOnly,
    /// In team mode, the user must belong to a team.
    RequireTeam,
}

impl AccessGuard {
    pub fn require_authentication_if(flag: impl Into<String>) -> Self {
        AccessGuard::RequireAuthenticationIfConfig { flag: flag.into() }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            AccessGuard::DuringCtfTimeOnly => "during_ctf_time_only",
            AccessGuard::RequireAuthenticationIfConfig { .. } => {
                "require_authentication_if_config"
            }
            AccessGuard::RequireVerifiedEmails => "require_verified_emails",
            AccessGuard::ViewableWithoutAuthentication { .. } => {
                "viewable_without_authentication"
            }
            AccessGuard::AuthedOnly => "authed_only",
            AccessGuard::AdminsOnly => "admins_only",
            AccessGuard::RequireTeam => "require_team",
        }
    }

    pub fn evaluate(&self, input: &GuardInput<'_>, routes: &GuardRoutes) -> GuardOutcome {
        let GuardInput {
            viewer,
            settings,
            now,
            path,
        } = *input;

        match self {
            AccessGuard::DuringCtfTimeOnly => during_ctf_time(viewer, settings, now),

            AccessGuard::RequireAuthenticationIfConfig { flag } => {
                if settings.flag(flag) && !viewer.is_authenticated() {
                    routes.login_then(path)
                } else {
                    GuardOutcome::Proceed
                }
            }

            AccessGuard::RequireVerifiedEmails => {
                if settings.verify_emails
                    && viewer.is_authenticated()
                    && !viewer.is_admin()
                    && !viewer.email_verified
                {
                    routes.confirm_email()
                } else {
                    GuardOutcome::Proceed
                }
            }

            AccessGuard::ViewableWithoutAuthentication { status, message } => {
                if settings.challenges_public || viewer.is_authenticated() {
                    return GuardOutcome::Proceed;
                }
                match status {
                    Some(status) => GuardOutcome::Deny {
                        status: *status,
                        message: message
                            .clone()
                            .unwrap_or_else(|| DEFAULT_AUTHORIZATION_ERROR.to_string()),
                    },
                    None => routes.login_then(path),
                }
            }

            AccessGuard::AuthedOnly => {
                if viewer.is_authenticated() {
                    GuardOutcome::Proceed
                } else {
                    routes.login_then(path)
                }
            }

            AccessGuard::AdminsOnly => {
                if viewer.is_admin() {
                    GuardOutcome::Proceed
                } else {
                    routes.login_then(path)
                }
            }

            AccessGuard::RequireTeam => {
                if settings.is_teams_mode() && !viewer.has_team() {
                    routes.team_then(path)
                } else {
                    GuardOutcome::Proceed
                }
            }
        }
    }
}

fn during_ctf_time(viewer: &Viewer, settings: &SettingsSnapshot, now: Timestamp) -> GuardOutcome {
    let window = &settings.window;
    if window.is_active(now) || viewer.is_admin() {
        return GuardOutcome::Proceed;
    }
    if window.has_ended(now) {
        if settings.view_after_ctf {
            return GuardOutcome::Proceed;
        }
        return GuardOutcome::forbidden(format!("{} has ended", settings.ctf_name));
    }
    if !window.has_started(now) {
        return GuardOutcome::forbidden(format!("{} has not started yet", settings.ctf_name));
    }
    GuardOutcome::forbidden(format!("{} is paused", settings.ctf_name))
}
