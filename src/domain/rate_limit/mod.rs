//! Rate limiting vocabulary.
//!
//! - `RateLimitRule` - one guarded operation's method, limit, window and namespace
//! - `CallContext` - the method, caller identity and operation of one call
//! - `RateLimitDecision` - what the limiter decided for a call
//! - `StoreFailurePolicy` - whether to admit calls when counting fails

mod decision;
mod policy;
mod rule;

pub use decision::{CallContext, RateLimitDecision, RateLimitRejection, RejectionBody};
pub use policy::StoreFailurePolicy;
pub use rule::RateLimitRule;
