//! Liveness endpoints (/, /health)

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

/// GET / - Banner with the running version
async fn root() -> Json<Value> {
    Json(json!({
        "message": "Image Moderation API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: String,
    timestamp: DateTime<Utc>,
}

/// GET /health - Reports degraded rather than failing when the store is down
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, database) = match state.store.ping().await {
        Ok(()) => ("healthy", "healthy".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, backend = state.store.backend(), "Health check failed");
            ("degraded", format!("unhealthy: {}", e))
        }
    };

    Json(HealthResponse {
        status,
        database,
        timestamp: Utc::now(),
    })
}
