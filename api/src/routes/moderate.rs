//! Image moderation endpoint (/moderate)

use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    routing::post,
};
use serde_json::json;
use std::sync::Arc;

use super::auth::AuthToken;
use crate::AppState;
use crate::constants::{UPLOAD_FIELD, endpoints};
use crate::moderation::ModerationVerdict;
use crate::services::error::{ApiError, LogErr};
use crate::services::upload::{self, Upload};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/moderate", post(moderate_image))
}

/// POST /moderate - Analyze an uploaded image for harmful content
///
/// Multipart form with a single `file` field holding the image.
async fn moderate_image(
    State(state): State<Arc<AppState>>,
    AuthToken(token): AuthToken,
    multipart: Multipart,
) -> Result<Json<ModerationVerdict>, ApiError> {
    if !state.rate_limiter.check(&token.token) {
        return Err(ApiError::TooManyRequests);
    }

    let upload = read_upload(multipart, state.max_image_size_mb).await?;
    upload.validate(state.max_image_size_mb)?;
    let image_hash = upload.content_hash();

    let data = upload.data.clone();
    let image = tokio::task::spawn_blocking(move || upload::decode_image(&data))
        .await
        .log_500("Image decode task failed")??;

    let verdict = state.engine.moderate(image, &image_hash).await?;

    state
        .store
        .record_usage(
            &token.token,
            endpoints::MODERATE_IMAGE,
            json!({
                "filename": upload.filename,
                "content_type": upload.content_type,
                "file_size": upload.data.len(),
                "image_hash": image_hash,
                "is_safe": verdict.is_safe(),
            }),
        )
        .await?;

    tracing::info!(
        image_hash = %verdict.content_hash(),
        is_safe = verdict.is_safe(),
        risk_score = verdict.risk_score(),
        detected = ?verdict.detected().collect::<Vec<_>>(),
        analyzed_at = %verdict.analyzed_at(),
        processing_time_ms = verdict.processing_time_ms(),
        "Image moderation completed"
    );

    Ok(Json(verdict))
}

/// Take the `file` field, skipping any other form fields
async fn read_upload(mut multipart: Multipart, max_size_mb: u64) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size_mb))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_size_mb))?;

        return Ok(Upload {
            filename,
            content_type,
            data,
        });
    }

    Err(ApiError::bad_request(format!(
        "Missing '{}' field in multipart form",
        UPLOAD_FIELD
    )))
}

fn multipart_error(err: MultipartError, max_size_mb: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(format!(
            "File too large. Maximum size is {}MB",
            max_size_mb
        ));
    }
    tracing::warn!(error = %err.body_text(), "Malformed multipart body");
    ApiError::bad_request(err.body_text())
}
