use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "network": state.config.network.name,
        "chainId": state.config.network.chain_id,
        "initialized": state.adapter.is_initialized().await,
    }))
}
