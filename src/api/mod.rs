//! StorePulse REST API
//!
//! HTTP API layer for StorePulse, built with Axum.
//!
//! # Endpoints
//!
//! ## Analytics
//! - `GET /api/v1/analytics/snapshot` - Latest published metrics
//! - `GET /api/v1/analytics/summary` - Quick summary figures
//! - `POST /api/v1/analytics/refresh` - One-shot point-query refresh
//!
//! ## Ingest (embedded store)
//! - `POST /api/v1/bills` - Record a finalized bill
//! - `POST /api/v1/products` - Insert or update a catalog entry
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws` - Live snapshot stream
//!
//! # Example
//!
//! ```rust,ignore
//! use storepulse::analytics::{AggregationEngine, EngineConfig};
//! use storepulse::api::{serve, ApiConfig, AppState};
//! use storepulse::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let engine = Arc::new(AggregationEngine::new(
//!         store.clone(),
//!         store.clone(),
//!         EngineConfig::default(),
//!     ));
//!     let subscription = engine.subscribe().await?;
//!
//!     let config = ApiConfig::default();
//!     let state = AppState::new(engine, store, config.clone());
//!     serve(state, &config).await?;
//!
//!     subscription.unsubscribe().await;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Analytics routes
        .route("/analytics/snapshot", get(routes::analytics::get_snapshot))
        .route("/analytics/summary", get(routes::analytics::get_summary))
        .route("/analytics/refresh", post(routes::analytics::refresh))
        // Ingest routes
        .route("/bills", post(routes::ingest::add_bill))
        .route("/products", post(routes::ingest::upsert_product))
        // WebSocket route
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()) // Configure properly in production
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("StorePulse API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("StorePulse API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
