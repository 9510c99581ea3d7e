//! Access guard middleware and viewer extractor.
//!
//! The host's session middleware is expected to insert a `Viewer` into the
//! request extensions. Requests without one are treated as anonymous.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get, middleware};
//!
//! let evaluator = Arc::new(GuardEvaluator::new(settings, clock, GuardRoutes::default()));
//! let challenges = AccessGuardState::new(evaluator.clone())
//!     .with_guard(AccessGuard::DuringCtfTimeOnly)
//!     .with_guard(AccessGuard::RequireTeam);
//!
//! let app = Router::new()
//!     .route("/challenges", get(list_challenges))
//!     .route_layer(middleware::from_fn_with_state(challenges, guard_middleware));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, request::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::GuardEvaluator;
use crate::domain::access::{AccessGuard, GuardOutcome};
use crate::domain::foundation::Viewer;
use crate::domain::rate_limit::RejectionBody;

/// Middleware state: the guards to apply, in order, and their evaluator.
#[derive(Debug, Clone)]
pub struct AccessGuardState {
    evaluator: Arc<GuardEvaluator>,
    guards: Arc<[AccessGuard]>,
}

impl AccessGuardState {
    pub fn new(evaluator: Arc<GuardEvaluator>) -> Self {
        Self {
            evaluator,
            guards: Arc::from(Vec::new()),
        }
    }

    /// Append a guard. Guards run in the order they were added.
    pub fn with_guard(self, guard: AccessGuard) -> Self {
        let mut guards = self.guards.to_vec();
        guards.push(guard);
        Self {
            evaluator: self.evaluator,
            guards: Arc::from(guards),
        }
    }

    pub fn guards(&self) -> &[AccessGuard] {
        &self.guards
    }
}

/// Runs the configured access guards before the handler.
///
/// - `Proceed` runs the handler.
/// - `Redirect` answers 302 with a `Location` header.
/// - `Deny` answers with the guard's status and a JSON body.
/// - A settings failure answers 503.
pub async fn guard_middleware(
    State(state): State<AccessGuardState>,
    request: Request,
    next: Next,
) -> Response {
    let viewer = request
        .extensions()
        .get::<Viewer>()
        .cloned()
        .unwrap_or_default();
    // Path only: query strings may carry tokens that must not be echoed
    // into a redirect.
    let path = request.uri().path().to_string();

    match state
        .evaluator
        .evaluate_all(&state.guards, &viewer, &path)
        .await
    {
        Ok(GuardOutcome::Proceed) => next.run(request).await,
        Ok(GuardOutcome::Redirect { location }) => redirect_response(&location),
        Ok(GuardOutcome::Deny { status, message }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::FORBIDDEN);
            json_response(status, &message)
        }
        Err(e) => {
            tracing::error!(path = %path, "Site settings unavailable: {}", e);
            json_response(StatusCode::SERVICE_UNAVAILABLE, "Site settings unavailable")
        }
    }
}

fn redirect_response(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = StatusCode::FOUND.into_response();
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(_) => {
            tracing::error!(location = %location, "Guard produced an invalid redirect");
            json_response(StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect")
        }
    }
}

fn json_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(RejectionBody {
            code: status.as_u16(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Extractor for the current viewer.
///
/// Never rejects: requests without a `Viewer` extension yield an anonymous
/// viewer.
///
/// # Example
///
/// ```ignore
/// async fn scoreboard(CurrentViewer(viewer): CurrentViewer) -> impl IntoResponse {
///     if viewer.is_admin() { "full scoreboard" } else { "public scoreboard" }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentViewer(pub Viewer);

#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentViewer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let viewer = parts.extensions.get::<Viewer>().cloned().unwrap_or_default();
        Ok(CurrentViewer(viewer))
    }
}
