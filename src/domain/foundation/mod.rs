//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types that form the
//! vocabulary of the gatekeeper domain.

mod errors;
mod ids;
mod timestamp;
mod viewer;

pub use errors::ValidationError;
pub use ids::{TeamId, UserId};
pub use timestamp::Timestamp;
pub use viewer::Viewer;
