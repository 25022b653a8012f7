// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, CORS, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tollgate_core::{IdentityProvider, TollgateError};
use tollgate_dispatch::Dispatcher;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::auth::CookieSettings;
use crate::handlers;

/// Health state for unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            prometheus_render: None,
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Arc<Dispatcher>,
    /// External sign-in; `None` disables `POST /auth/google`.
    pub identity: Option<Arc<dyn IdentityProvider>>,
    pub cookie: CookieSettings,
    /// Role claim for newly signed-in users.
    pub default_role: String,
    pub health: HealthState,
}

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Exact origins allowed to make credentialed cross-origin requests.
    pub allowed_origins: Vec<String>,
}

/// CORS policy: exact-origin allow-list with credentials.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, TollgateError> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| TollgateError::Config(format!("invalid origin `{origin}`: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Build the application router.
///
/// - POST /chat
/// - POST /auth/google
/// - POST /auth/logout
/// - GET /health (unauthenticated)
/// - GET /metrics (unauthenticated)
pub fn build_router(state: GatewayState, allowed_origins: &[String]) -> Result<Router, TollgateError> {
    Ok(Router::new()
        .route("/chat", post(handlers::post_chat))
        .route("/auth/google", post(handlers::post_auth_google))
        .route("/auth/logout", post(handlers::post_auth_logout))
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
        .layer(cors_layer(allowed_origins)?)
        .layer(TraceLayer::new_for_http()))
}

/// Bind to the configured host:port and serve until `cancel` fires.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), TollgateError> {
    let app = build_router(state, &config.allowed_origins)?;

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TollgateError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| TollgateError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
