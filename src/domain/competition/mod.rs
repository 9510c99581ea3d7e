//! Competition schedule and site settings.
//!
//! - `CompetitionWindow` - start/end/pause state and the "is it CTF time" rules
//! - `SettingsSnapshot` - the configuration flags guards consult
//! - `UserMode` - individual or team play

mod settings;
mod window;

pub use settings::{SettingsSnapshot, UserMode};
pub use window::CompetitionWindow;
