//! HTTP middleware for axum.
//!
//! This module contains middleware layers for cross-cutting concerns:
//!
//! - `rate_limit` - Per-route fixed-window rate limiting
//! - `guards` - Access guards and the current viewer extractor

pub mod guards;
pub mod rate_limit;

pub use guards::{guard_middleware, AccessGuardState, CurrentViewer};
pub use rate_limit::{extract_client_ip, rate_limit_middleware, RateLimitGuard, UNKNOWN_CLIENT};
