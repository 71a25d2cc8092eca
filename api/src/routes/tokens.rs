//! Token management endpoints (/auth/tokens), admin only

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use super::auth::AdminToken;
use crate::AppState;
use crate::models::TokenSummary;
use crate::services::error::ApiError;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/tokens", get(list_tokens).post(create_token))
        .route("/auth/tokens/{token}", delete(delete_token))
}

#[derive(Debug, Default, Deserialize)]
struct CreateTokenRequest {
    #[serde(default)]
    is_admin: bool,
}

#[derive(Debug, Serialize)]
struct CreateTokenResponse {
    token: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

/// POST /auth/tokens - Issue a new bearer token
async fn create_token(
    State(state): State<Arc<AppState>>,
    AdminToken(_admin): AdminToken,
    body: Option<Json<CreateTokenRequest>>,
) -> Result<(StatusCode, Json<CreateTokenResponse>), ApiError> {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let record = state.store.create_token(request.is_admin).await?;
    tracing::info!(is_admin = record.is_admin, "Issued API token");

    Ok((
        StatusCode::CREATED,
        Json(CreateTokenResponse {
            token: record.token,
            is_admin: record.is_admin,
            created_at: record.created_at,
        }),
    ))
}

/// GET /auth/tokens - Every token with its usage count
async fn list_tokens(
    State(state): State<Arc<AppState>>,
    AdminToken(_admin): AdminToken,
) -> Result<Json<Vec<TokenSummary>>, ApiError> {
    Ok(Json(state.store.list_tokens().await?))
}

/// DELETE /auth/tokens/{token} - Revoke a token and drop its usage history
async fn delete_token(
    State(state): State<Arc<AppState>>,
    AdminToken(_admin): AdminToken,
    Path(token): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.store.delete_token(&token).await? {
        return Err(ApiError::NotFound("Token not found".into()));
    }
    state.rate_limiter.forget(&token);
    tracing::info!("Revoked API token");

    Ok(Json(json!({ "message": "Token deleted successfully" })))
}
