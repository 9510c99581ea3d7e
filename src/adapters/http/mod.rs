//! HTTP adapters - axum middleware that puts the guards in front of routes.

pub mod middleware;

pub use middleware::{
    guard_middleware, rate_limit_middleware, AccessGuardState, CurrentViewer, RateLimitGuard,
};
