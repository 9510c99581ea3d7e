//! The current viewer as seen by access guards.
//!
//! A `Viewer` is populated by the host application's session layer and
//! injected into request extensions. Guards only read it; they never create
//! sessions or talk to an identity provider.
//!
//! # Example
//!
//! ```ignore
//! // In host middleware, after resolving the session cookie:
//! let viewer = Viewer::authenticated(UserId::new("user-123")?)
//!     .with_email_verified(true)
//!     .with_team(TeamId::new("red-team")?);
//!
//! request.extensions_mut().insert(viewer);
//! ```

use super::{TeamId, UserId};

/// The user behind the current request, or an anonymous visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    /// The signed-in user, if any.
    pub user_id: Option<UserId>,

    /// Whether the user holds the admin role.
    pub is_admin: bool,

    /// Whether the user's email address has been confirmed.
    pub email_verified: bool,

    /// The team the user belongs to, if any.
    pub team_id: Option<TeamId>,
}

impl Viewer {
    /// An anonymous visitor with no session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A signed-in, non-admin user with an unverified email and no team.
    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// A signed-in admin.
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin: true,
            email_verified: true,
            team_id: None,
        }
    }

    pub fn with_email_verified(mut self, verified: bool) -> Self {
        self.email_verified = verified;
        self
    }

    pub fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Returns true if the viewer has a session.
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Returns true if the viewer is a signed-in admin.
    ///
    /// The admin flag is ignored for anonymous viewers.
    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.is_admin
    }

    /// Returns true if the viewer belongs to a team.
    pub fn has_team(&self) -> bool {
        self.team_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("user-123").unwrap()
    }

    #[test]
    fn anonymous_viewer_is_not_authenticated() {
        let viewer = Viewer::anonymous();
        assert!(!viewer.is_authenticated());
        assert!(!viewer.is_admin());
        assert!(!viewer.has_team());
    }

    #[test]
    fn authenticated_viewer_defaults_to_unverified_without_team() {
        let viewer = Viewer::authenticated(user());
        assert!(viewer.is_authenticated());
        assert!(!viewer.email_verified);
        assert!(!viewer.has_team());
    }

    #[test]
    fn admin_flag_requires_a_session() {
        let viewer = Viewer {
            is_admin: true,
            ..Viewer::anonymous()
        };
        assert!(!viewer.is_admin());
        assert!(Viewer::admin(user()).is_admin());
    }

    #[test]
    fn builder_methods_set_fields() {
        let viewer = Viewer::authenticated(user())
            .with_email_verified(true)
            .with_team(TeamId::new("blue").unwrap());

        assert!(viewer.email_verified);
        assert_eq!(viewer.team_id.unwrap().as_str(), "blue");
    }
}
