//! Domain layer containing guard logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, viewer, errors)
//! - `rate_limit` - Rules, call context and limiter decisions
//! - `competition` - Competition window and site settings
//! - `access` - Pure access guards (CTF time, auth, email, team, admin)

pub mod access;
pub mod competition;
pub mod foundation;
pub mod rate_limit;
