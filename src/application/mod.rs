//! Application layer - coordinates domain rules with ports.
//!
//! The rate limiter counts calls through the counter store; the guard
//! evaluator feeds settings and time into the access guards.

mod guard_evaluator;
mod rate_limiter;

pub use guard_evaluator::GuardEvaluator;
pub use rate_limiter::RateLimiter;
