//! Demo server: a small CTF API behind the gatekeeper's guards.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ctf_gatekeeper::adapters::http::{
    guard_middleware, rate_limit_middleware, AccessGuardState, CurrentViewer, RateLimitGuard,
};
use ctf_gatekeeper::adapters::{
    InMemoryCounterStore, InMemorySiteSettings, RedisCounterStore, SystemClock,
};
use ctf_gatekeeper::application::{GuardEvaluator, RateLimiter};
use ctf_gatekeeper::config::{AppConfig, ConfigError, ServerConfig};
use ctf_gatekeeper::domain::access::AccessGuard;
use ctf_gatekeeper::ports::{CounterStore, CounterStoreError};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Counter store unavailable: {0}")]
    Store(#[from] CounterStoreError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate().map_err(ConfigError::from)?;

    info!("Starting CTF Gatekeeper");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn CounterStore> = if config.redis.is_configured() {
        info!("Using Redis counter store");
        Arc::new(
            RedisCounterStore::connect(&config.redis.url)
                .await?
                .with_timeout(config.redis.timeout()),
        )
    } else {
        info!("Using in-memory counter store; counts are not shared between servers");
        let store = InMemoryCounterStore::new();
        store.spawn_purger(InMemoryCounterStore::DEFAULT_PURGE_INTERVAL);
        Arc::new(store)
    };

    let limiter = RateLimiter::new(store);
    let rule = config.rate_limit.to_rule().map_err(ConfigError::from)?;
    let trusted_proxies = config
        .rate_limit
        .trusted_proxy_addrs()
        .map_err(ConfigError::from)?;
    if trusted_proxies.is_empty() {
        info!("No trusted proxies; clients are identified by socket address");
    } else {
        info!(count = trusted_proxies.len(), "Honoring X-Forwarded-For from trusted proxies");
    }
    let rate_limit = RateLimitGuard::new(limiter, rule)
        .with_policy(config.rate_limit.on_store_failure)
        .with_trusted_proxies(trusted_proxies);

    let settings = InMemorySiteSettings::new(config.competition.snapshot());
    let evaluator = Arc::new(GuardEvaluator::new(
        Arc::new(settings),
        Arc::new(SystemClock),
        config.guards.routes(),
    ));

    let app = router(rate_limit, evaluator);

    let addr = config.server.socket_addr().map_err(ConfigError::from)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("CTF Gatekeeper stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.wants_json_logs() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }
}

fn router(rate_limit: RateLimitGuard, evaluator: Arc<GuardEvaluator>) -> Router {
    let challenges = AccessGuardState::new(evaluator.clone())
        .with_guard(AccessGuard::DuringCtfTimeOnly)
        .with_guard(AccessGuard::RequireVerifiedEmails)
        .with_guard(AccessGuard::ViewableWithoutAuthentication {
            status: Some(403),
            message: None,
        });

    let attempts = AccessGuardState::new(evaluator.clone())
        .with_guard(AccessGuard::DuringCtfTimeOnly)
        .with_guard(AccessGuard::AuthedOnly)
        .with_guard(AccessGuard::RequireTeam);

    let admin = AccessGuardState::new(evaluator).with_guard(AccessGuard::AdminsOnly);

    let challenge_routes = Router::new()
        .route("/api/v1/challenges", get(list_challenges))
        .route_layer(middleware::from_fn_with_state(challenges, guard_middleware));

    // Rate limit runs first so refused attempts still count
    let attempt_routes = Router::new()
        .route("/api/v1/challenges/attempt", post(attempt))
        .route_layer(middleware::from_fn_with_state(attempts, guard_middleware))
        .route_layer(middleware::from_fn_with_state(rate_limit, rate_limit_middleware));

    let admin_routes = Router::new()
        .route("/admin/statistics", get(statistics))
        .route_layer(middleware::from_fn_with_state(admin, guard_middleware));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(challenge_routes)
        .merge(attempt_routes)
        .merge(admin_routes)
}

async fn list_challenges() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": [] }))
}

async fn attempt(CurrentViewer(viewer): CurrentViewer) -> Json<serde_json::Value> {
    let user = viewer.user_id.map(|id| id.to_string());
    Json(serde_json::json!({
        "success": true,
        "data": { "status": "incorrect", "user": user }
    }))
}

async fn statistics() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": {} }))
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
