pub mod auth;
pub mod health;
pub mod moderate;
pub mod tokens;
pub mod usage;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::routes())
        .merge(tokens::routes())
        .merge(moderate::routes())
        .merge(usage::routes())
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use image::{ImageFormat, Rgb, RgbImage};
    use serde_json::{Value, json};
    use std::io::Cursor;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    use crate::moderation::{HeuristicAnalyzer, ModerationEngine, RiskAggregator};
    use crate::services::credentials::CredentialStore;
    use crate::services::memory_store::MemoryCredentialStore;
    use crate::services::rate_limit::{RateLimitConfig, TokenRateLimiter};
    use crate::{AppState, build_app};

    const BOUNDARY: &str = "moderation-test-boundary";

    struct TestApp {
        router: Router,
        store: Arc<MemoryCredentialStore>,
        admin: String,
        user: String,
    }

    async fn test_app_with(burst: u32, max_image_size_mb: u64) -> TestApp {
        let store = Arc::new(MemoryCredentialStore::new());
        let admin = store.create_token(true).await.unwrap().token;
        let user = store.create_token(false).await.unwrap().token;

        let state = Arc::new(AppState {
            store: store.clone(),
            engine: ModerationEngine::new(
                Arc::new(HeuristicAnalyzer::seeded(7)),
                RiskAggregator::default(),
            ),
            rate_limiter: Arc::new(TokenRateLimiter::new(RateLimitConfig {
                max_tokens: burst,
                refill_rate: 0.001,
            })),
            max_image_size_mb,
        });

        TestApp {
            router: build_app(state),
            store,
            admin,
            user,
        }
    }

    async fn test_app() -> TestApp {
        test_app_with(60, 10).await
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 20) as u8, (y * 20) as u8, 90])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn multipart_body(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload.png\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn moderate_request(token: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/moderate")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn authed(method: Method, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn root_reports_running() {
        let app = test_app().await;
        let request = Request::get("/").body(Body::empty()).unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Image Moderation API is running");
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn health_is_healthy_with_memory_store() {
        let app = test_app().await;
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "healthy");
    }

    #[tokio::test]
    async fn moderate_returns_verdict_and_records_usage() {
        let app = test_app().await;
        let data = png(8, 6);
        let request = moderate_request(&app.user, multipart_body("file", "image/png", &data));

        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["categories"].as_array().unwrap().len(), 8);
        assert_eq!(body["categories"][0]["name"], "violence");
        assert_eq!(body["imageHash"], crate::services::upload::content_hash(&data));
        let risk = body["riskScore"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&risk));
        assert_eq!(body["isSafe"], risk < 0.6);

        let records = app.store.usage_records(&app.user, 10).await.unwrap();
        assert_eq!(records[0].endpoint, "moderate_image");
        assert_eq!(records[0].metadata["file_size"], data.len());
        assert_eq!(records[0].metadata["filename"], "upload.png");
        assert_eq!(records[1].endpoint, "api_call");
    }

    #[tokio::test]
    async fn moderate_requires_bearer_token() {
        let app = test_app().await;
        let mut request = moderate_request("x", multipart_body("file", "image/png", &png(2, 2)));
        request.headers_mut().remove(header::AUTHORIZATION);
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn moderate_rejects_unknown_token() {
        let app = test_app().await;
        let request = moderate_request("nope", multipart_body("file", "image/png", &png(2, 2)));
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid token");
    }

    #[tokio::test]
    async fn moderate_rejects_non_image_upload() {
        let app = test_app().await;
        let request = moderate_request(&app.user, multipart_body("file", "text/plain", b"hello"));
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Only image files are allowed");
    }

    #[tokio::test]
    async fn moderate_rejects_undecodable_image() {
        let app = test_app().await;
        let request = moderate_request(
            &app.user,
            multipart_body("file", "image/png", b"not really a png"),
        );
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().starts_with("Invalid image file"));
    }

    #[tokio::test]
    async fn moderate_rejects_missing_file_field() {
        let app = test_app().await;
        let request = moderate_request(&app.user, multipart_body("photo", "image/png", &png(2, 2)));
        let (status, _) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn moderate_rejects_oversized_upload() {
        let app = test_app_with(60, 1).await;
        let data = vec![0u8; 1024 * 1024 + 10];
        let request = moderate_request(&app.user, multipart_body("file", "image/png", &data));
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["detail"].as_str().unwrap().contains("Maximum size is 1MB"));
    }

    #[tokio::test]
    async fn moderate_is_rate_limited_per_token() {
        let app = test_app_with(1, 10).await;
        let body = multipart_body("file", "image/png", &png(2, 2));

        let (first, _) = send(&app.router, moderate_request(&app.user, body.clone())).await;
        assert_eq!(first, StatusCode::OK);
        let (second, _) = send(&app.router, moderate_request(&app.user, body.clone())).await;
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        // another token has its own bucket
        let (other, _) = send(&app.router, moderate_request(&app.admin, body)).await;
        assert_eq!(other, StatusCode::OK);
    }

    #[tokio::test]
    async fn token_management_requires_admin() {
        let app = test_app().await;
        let (status, body) = send(&app.router, authed(Method::GET, "/auth/tokens", &app.user)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "Admin access required");

        let (status, _) = send(&app.router, authed(Method::GET, "/auth/tokens", "unknown")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_creates_lists_and_deletes_tokens() {
        let app = test_app().await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/tokens")
            .header(header::AUTHORIZATION, format!("Bearer {}", app.admin))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "is_admin": false }).to_string()))
            .unwrap();
        let (status, created) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["is_admin"], false);
        let new_token = created["token"].as_str().unwrap().to_string();

        let (status, listed) = send(&app.router, authed(Method::GET, "/auth/tokens", &app.admin)).await;
        assert_eq!(status, StatusCode::OK);
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().any(|t| t["token"] == new_token.as_str()));

        let uri = format!("/auth/tokens/{}", new_token);
        let (status, body) = send(&app.router, authed(Method::DELETE, &uri, &app.admin)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Token deleted successfully");

        let (status, body) = send(&app.router, authed(Method::DELETE, &uri, &app.admin)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Token not found");
    }

    #[tokio::test]
    async fn create_token_without_body_defaults_to_non_admin() {
        let app = test_app().await;
        let (status, created) = send(&app.router, authed(Method::POST, "/auth/tokens", &app.admin)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["is_admin"], false);
    }

    #[tokio::test]
    async fn users_see_only_their_own_usage() {
        let app = test_app().await;

        let own = format!("/usage/{}", app.user);
        let (status, body) = send(&app.router, authed(Method::GET, &own, &app.user)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"], app.user.as_str());
        // the lookup itself counts as an api_call
        assert_eq!(body["usage_count"], 1);
        assert_eq!(body["records"][0]["endpoint"], "api_call");

        let other = format!("/usage/{}", app.admin);
        let (status, body) = send(&app.router, authed(Method::GET, &other, &app.user)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "Can only view your own usage statistics");

        let (status, _) = send(&app.router, authed(Method::GET, &own, &app.admin)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn usage_limit_is_bounded() {
        let app = test_app().await;
        let uri = format!("/usage/{}?limit=0", app.user);
        let (status, _) = send(&app.router, authed(Method::GET, &uri, &app.user)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/usage/{}?limit=1", app.user);
        let (status, body) = send(&app.router, authed(Method::GET, &uri, &app.user)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["records"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn usage_summary_groups_by_endpoint() {
        let app = test_app().await;
        let body = multipart_body("file", "image/png", &png(3, 3));
        let (status, _) = send(&app.router, moderate_request(&app.user, body)).await;
        assert_eq!(status, StatusCode::OK);

        let uri = format!("/usage/{}/summary", app.user);
        let (status, summary) = send(&app.router, authed(Method::GET, &uri, &app.user)).await;
        assert_eq!(status, StatusCode::OK);
        // api_call x2 (moderate + summary), moderate_image x1
        assert_eq!(summary["total_usage"], 3);
        assert_eq!(summary["endpoints"][0]["endpoint"], "api_call");
        assert_eq!(summary["endpoints"][0]["count"], 2);
        assert_eq!(summary["endpoints"][1]["endpoint"], "moderate_image");
    }
}
