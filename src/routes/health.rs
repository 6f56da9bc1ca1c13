use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub connected: bool,
}

#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let connected = match sqlx::query("SELECT 1").execute(&state.db_pool).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = ?e, "Database health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth { connected },
    })
}

#[instrument(skip(state))]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let (content_type, encoded) = state.metrics.encode();
    ([(axum::http::header::CONTENT_TYPE, content_type)], encoded)
}
