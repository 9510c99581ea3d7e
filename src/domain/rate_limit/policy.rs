//! What to do when the counter store cannot be reached.

use serde::{Deserialize, Serialize};

/// Behavior of an enforcement point when counting fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailurePolicy {
    /// Let the call through uncounted.
    #[default]
    FailOpen,
    /// Refuse the call with 503.
    FailClosed,
}

impl StoreFailurePolicy {
    pub fn admits_on_failure(&self) -> bool {
        matches!(self, StoreFailurePolicy::FailOpen)
    }
}

impl std::str::FromStr for StoreFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(StoreFailurePolicy::FailOpen),
            "fail_closed" | "closed" => Ok(StoreFailurePolicy::FailClosed),
            other => Err(format!("unknown store failure policy '{}'", other)),
        }
    }
}
