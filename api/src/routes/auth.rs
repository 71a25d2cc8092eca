//! Bearer token extractors

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use serde_json::json;
use std::sync::Arc;

use crate::AppState;
use crate::constants::endpoints;
use crate::models::TokenRecord;
use crate::services::error::ApiError;

/// Pull the credential out of `Authorization: Bearer <token>`
pub fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| ApiError::Unauthorized("Invalid authorization header".into()))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(ApiError::Unauthorized(
            "Invalid authentication credentials".into(),
        ));
    }
    Ok(token)
}

/// Any valid token. Records an `api_call` usage on success.
pub struct AuthToken(pub TokenRecord);

impl FromRequestParts<Arc<AppState>> for AuthToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let record = state
            .store
            .get_token(token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".into()))?;

        state
            .store
            .record_usage(&record.token, endpoints::API_CALL, json!({}))
            .await?;
        Ok(AuthToken(record))
    }
}

/// A valid admin token. Records an `admin_call` usage on success.
pub struct AdminToken(pub TokenRecord);

impl FromRequestParts<Arc<AppState>> for AdminToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let record = state
            .store
            .get_token(token)
            .await?
            .filter(|t| t.is_admin)
            .ok_or_else(|| ApiError::Forbidden("Admin access required".into()))?;

        state
            .store
            .record_usage(&record.token, endpoints::ADMIN_CALL, json!({}))
            .await?;
        Ok(AdminToken(record))
    }
}
