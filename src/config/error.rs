//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Invalid HTTP method for rate limit rule: {0}")]
    InvalidRateLimitMethod(String),

    #[error("Rate limit interval must be at least one second")]
    InvalidRateLimitInterval,

    #[error("Rate limit interval must be at most {0} seconds")]
    RateLimitIntervalTooLarge(u64),

    #[error("Invalid trusted proxy address: {0}")]
    InvalidTrustedProxy(String),

    #[error("Rate limit key prefix must not be empty")]
    EmptyKeyPrefix,

    #[error("Guard route must be an absolute path: {0}")]
    InvalidGuardRoute(String),

    #[error("Competition start must be before its end")]
    InvalidCompetitionWindow,
}
