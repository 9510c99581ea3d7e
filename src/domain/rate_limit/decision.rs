//! Call context and limiter decisions.

use http::Method;
use serde::{Deserialize, Serialize};

use super::RateLimitRule;

/// The parts of an incoming call the limiter looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// HTTP method of the call.
    pub method: Method,
    /// Caller identity, usually the source address.
    pub identity: String,
    /// Stable identifier of the guarded operation (e.g. route path).
    pub operation_id: String,
}

impl CallContext {
    pub fn new(
        method: Method,
        identity: impl Into<String>,
        operation_id: impl Into<String>,
    ) -> Self {
        Self {
            method,
            identity: identity.into(),
            operation_id: operation_id.into(),
        }
    }
}

/// Result of checking one call against a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The call's method is not governed by the rule; nothing was counted.
    Skipped,
    /// The call was counted; `count` is the value now stored for the window.
    Admitted { count: u64 },
    /// The window is exhausted; the handler must not run.
    Rejected(RateLimitRejection),
}

impl RateLimitDecision {
    /// Returns true if the wrapped handler should run.
    pub fn is_admitted(&self) -> bool {
        !matches!(self, RateLimitDecision::Rejected(_))
    }

    /// Returns true if the call was rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, RateLimitDecision::Rejected(_))
    }
}

/// Details of a rejected call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRejection {
    /// The configured limit that was hit.
    pub limit: u64,
    /// The configured window in seconds.
    pub interval_secs: u64,
    /// Human-readable message for the caller.
    pub message: String,
}

impl RateLimitRejection {
    /// HTTP status for a rejected call.
    pub const STATUS: u16 = 429;

    pub fn for_rule(rule: &RateLimitRule) -> Self {
        Self {
            limit: rule.limit(),
            interval_secs: rule.interval_secs(),
            message: rule.rejection_message(),
        }
    }

    /// The structured payload returned to the caller.
    pub fn body(&self) -> RejectionBody {
        RejectionBody {
            code: Self::STATUS,
            message: self.message.clone(),
        }
    }
}

/// JSON payload for a rejected or denied call: `{ "code": .., "message": .. }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionBody {
    pub code: u16,
    pub message: String,
}
