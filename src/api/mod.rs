//! API module
//!
//! HTTP boundary: routes and full application assembly.

pub mod routes;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use routes::{create_router, WalletState};

/// Build the complete application: versioned API, health check, tracing.
pub fn app(wallet: WalletState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_router())
        .layer(TraceLayer::new_for_http())
        .with_state(wallet)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
