//! Access guards for competition pages.
//!
//! Each guard is a pure decision over the current viewer, a settings
//! snapshot, the current time and the request path. Guards never perform
//! I/O; the HTTP adapter gathers the inputs and renders the outcome.
//!
//! ```text
//! Viewer + SettingsSnapshot + now + path ──► AccessGuard::evaluate ──► GuardOutcome
//! ```

mod guard;
mod outcome;

pub use guard::{AccessGuard, GuardInput};
pub use outcome::{GuardOutcome, GuardRoutes};
