//! Shipments Backend - Main Application Entry Point
//!
//! REST API for shipments tied to external orders: each shipment carries
//! a status and an ordered history of tracking events. Clients
//! authenticate with an API key carrying a per-key rate limit; every
//! mutation is reported to an external audit-log sink on a best-effort
//! basis.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: API key with SHA-256 hashing, X-API-Key header
//! - **Rate Limiting**: in-memory fixed 60s window per key
//! - **Format**: JSON requests/responses (camelCase fields)
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Start the rate-limiter sweeper
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{db::DbPool, middleware::rate_limit::RateLimiter, services::audit_service::AuditEmitter};

/// Shared application state handed to every handler and middleware.
///
/// The rate limiter is owned here and injected into the auth gateway;
/// its lifecycle is tied to the process, not to a module-level global.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub rate_limiter: Arc<RateLimiter>,
    pub audit: AuditEmitter,
    /// Static shared secret kept for backward compatibility; `None`
    /// disables the legacy bypass entirely
    pub legacy_api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG
    // environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    // Rate limiter + periodic sweep of expired windows
    let rate_limiter = Arc::new(RateLimiter::new());
    let _sweeper = rate_limiter.start_sweeper();

    let audit = AuditEmitter::new(&config.audit_api_url, config.audit_api_key.clone())?;
    if config.legacy_api_key.is_some() {
        tracing::warn!("legacy static API key is enabled");
    }

    let state = AppState {
        pool,
        rate_limiter,
        audit,
        legacy_api_key: config.legacy_api_key.clone(),
    };

    // Shipment routes sit behind the auth gateway (API key + rate limit)
    let authenticated_routes = Router::new()
        .route("/v1/shipments", post(handlers::shipments::create_shipment))
        .route("/v1/shipments", get(handlers::shipments::list_shipments))
        .route("/v1/shipments/{id}", get(handlers::shipments::get_shipment))
        .route(
            "/v1/shipments/{id}/status",
            put(handlers::shipments::update_shipment_status),
        )
        .route(
            "/v1/shipments/{id}/events",
            post(handlers::shipments::add_shipment_event),
        )
        // Apply the auth gateway to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Public routes: health, plus key management (the bootstrap path for
    // issuing the credentials the gateway checks)
    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/v1/api-keys", get(handlers::api_keys::list_api_keys))
        .route("/v1/api-keys", post(handlers::api_keys::create_api_key))
        .route("/v1/api-keys/{id}", put(handlers::api_keys::update_api_key))
        .route(
            "/v1/api-keys/{id}",
            delete(handlers::api_keys::revoke_api_key),
        )
        // Merge authenticated routes
        .merge(authenticated_routes)
        // Request tracing and CORS for browser callers
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        // Share state with all handlers via State extraction
        .with_state(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    axum::serve(listener, app).await?;

    Ok(())
}
