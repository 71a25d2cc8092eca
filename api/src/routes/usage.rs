//! Usage statistics endpoints (/usage/{token})

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AuthToken;
use crate::AppState;
use crate::constants::{DEFAULT_USAGE_LIMIT, MAX_USAGE_LIMIT};
use crate::models::{TokenRecord, UsageRecord, UsageSummary};
use crate::services::error::ApiError;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/usage/{token}", get(get_usage))
        .route("/usage/{token}/summary", get(get_usage_summary))
}

#[derive(Debug, Deserialize)]
struct UsageQuery {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct UsageResponse {
    token: String,
    usage_count: usize,
    records: Vec<UsageRecord>,
}

/// Tokens may read their own usage; admins may read anyone's
fn ensure_can_view(caller: &TokenRecord, target: &str) -> Result<(), ApiError> {
    if caller.token == target || caller.is_admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Can only view your own usage statistics".into(),
        ))
    }
}

/// GET /usage/{token}?limit= - Most recent usage records, newest first
async fn get_usage(
    State(state): State<Arc<AppState>>,
    AuthToken(caller): AuthToken,
    Path(token): Path<String>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<UsageResponse>, ApiError> {
    ensure_can_view(&caller, &token)?;

    let limit = query.limit.unwrap_or(DEFAULT_USAGE_LIMIT);
    if !(1..=MAX_USAGE_LIMIT).contains(&limit) {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {}",
            MAX_USAGE_LIMIT
        )));
    }

    let records = state.store.usage_records(&token, limit).await?;
    Ok(Json(UsageResponse {
        token,
        usage_count: records.len(),
        records,
    }))
}

/// GET /usage/{token}/summary - Totals per endpoint
async fn get_usage_summary(
    State(state): State<Arc<AppState>>,
    AuthToken(caller): AuthToken,
    Path(token): Path<String>,
) -> Result<Json<UsageSummary>, ApiError> {
    ensure_can_view(&caller, &token)?;
    Ok(Json(state.store.usage_summary(&token).await?))
}
