//! HTTP Server implementation
//!
//! This module provides the HTTP server using Axum framework with:
//! - Configurable host/port binding
//! - Graceful shutdown handling
//! - Request timeouts and body limits
//! - Health check endpoint

use crate::api::handlers::AppState;
use crate::api::middleware::{
    security_headers_middleware, timeout_middleware, trace_id_middleware, RequestTimeout,
    SecurityHeadersConfig,
};
use crate::api::routes::build_routes;
use crate::auth::password::PasswordHasher;
use crate::core::config::{Config, ServerConfig};
use crate::core::services::{ArticleService, AuthService, SessionSettings};
use crate::db::manager::DatabaseManager;
use crate::db::repository::{ArticleRepository, SessionRepository, UserRepository};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Largest accepted form body
const MAX_BODY_SIZE: usize = 64 * 1024;

/// HTTP Server
pub struct ApiServer {
    router: Router,
    state: AppState,
    config: ServerConfig,
}

impl ApiServer {
    /// Create a new server over an open database
    pub fn new(config: &Config, db: Arc<DatabaseManager>) -> Self {
        let state = Self::build_state(config, db);
        let router = Self::build_router(config, state.clone());

        Self {
            router,
            state,
            config: config.server.clone(),
        }
    }

    /// Wire repositories into services
    fn build_state(config: &Config, db: Arc<DatabaseManager>) -> AppState {
        let user_repo = Arc::new(UserRepository::new(db.clone()));
        let session_repo = Arc::new(SessionRepository::new(db.clone()));
        let article_repo = Arc::new(ArticleRepository::new(db));

        let auth_service = Arc::new(AuthService::new(
            user_repo.clone(),
            session_repo,
            PasswordHasher::new(config.security.bcrypt_cost),
            SessionSettings {
                secret: config.security.session_secret.clone(),
                ttl: config.security.session_ttl,
            },
        ));
        let article_service = Arc::new(ArticleService::new(article_repo, user_repo));

        AppState {
            auth_service,
            article_service,
            secure_cookies: config.security.secure_cookies,
        }
    }

    /// Build the Axum router with all routes and middleware
    fn build_router(config: &Config, state: AppState) -> Router {
        let security_headers = SecurityHeadersConfig::from(&config.security);
        let request_timeout = RequestTimeout(Duration::from_secs(config.server.request_timeout));

        Router::new()
            .route("/health", get(health_check))
            .merge(build_routes(state))
            .layer(
                ServiceBuilder::new()
                    // Trace ID first so every later log line carries it
                    .layer(middleware::from_fn(trace_id_middleware))
                    .layer(TraceLayer::new_for_http())
                    .layer(middleware::from_fn_with_state(
                        security_headers,
                        security_headers_middleware,
                    ))
                    .layer(middleware::from_fn_with_state(request_timeout, timeout_middleware))
                    .layer(DefaultBodyLimit::max(MAX_BODY_SIZE)),
            )
    }

    /// Start the HTTP server and listen for requests
    ///
    /// This method will block until the server is shut down gracefully.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let socket_addr: SocketAddr = addr.parse()?;

        info!(
            host = %self.config.host,
            port = self.config.port,
            request_timeout = self.config.request_timeout,
            "Starting HTTP server"
        );

        match self.state.auth_service.purge_expired_sessions().await {
            Ok(purged) => info!(purged, "Expired sessions removed"),
            Err(e) => tracing::warn!(error = %e, "Could not purge expired sessions"),
        }

        let listener = tokio::net::TcpListener::bind(socket_addr).await?;

        info!(addr = %socket_addr, "HTTP server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server shut down gracefully");

        Ok(())
    }

    /// Get a reference to the router
    pub fn router(&self) -> &Router {
        &self.router
    }
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Initiating graceful shutdown...");
}
