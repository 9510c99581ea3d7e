//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CTF_GATEKEEPER` prefix and nested values use double underscores as separators.
//!
//! Every section has defaults, so an empty environment yields a working
//! single-server setup with in-memory counters.
//!
//! # Example
//!
//! ```no_run
//! use ctf_gatekeeper::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod competition;
mod error;
mod guards;
mod rate_limit;
mod redis;
mod server;

pub use competition::CompetitionConfig;
pub use error::{ConfigError, ValidationError};
pub use guards::GuardsConfig;
pub use rate_limit::RateLimitConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CTF_GATEKEEPER";

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis configuration (shared counter store)
    #[serde(default)]
    pub redis: RedisConfig,

    /// Rate limit rule for guarded routes
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Redirect targets used by access guards
    #[serde(default)]
    pub guards: GuardsConfig,

    /// Initial competition settings
    #[serde(default)]
    pub competition: CompetitionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CTF_GATEKEEPER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CTF_GATEKEEPER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CTF_GATEKEEPER__REDIS__URL=...` -> `redis.url = ...`
    /// - `CTF_GATEKEEPER__RATE_LIMIT__LIMIT=10` -> `rate_limit.limit = 10`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.redis.validate()?;
        self.rate_limit.validate()?;
        self.guards.validate()?;
        self.competition.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
