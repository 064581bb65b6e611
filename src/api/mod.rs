//! # API Module
//!
//! HTTP bridge for clients that cannot speak MCP over stdio.
//!
//! ## Available Endpoints
//!
//! - `GET /api/health` - Liveness and connection state
//! - `POST /api/rpc` - One JSON-RPC request, answered by the MCP handler

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub mod health;
pub mod rpc;

/// The bridge router with tracing and permissive CORS.
pub fn router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/rpc", post(rpc::rpc_handler));

    Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
