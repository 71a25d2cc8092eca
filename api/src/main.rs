mod config;
mod constants;
mod domain;
mod models;
mod moderation;
mod routes;
mod services;

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::Settings;
use constants::MULTIPART_OVERHEAD_BYTES;
use moderation::{ModerationEngine, RiskAggregator};
use services::credentials::{self, CredentialStore};
use services::memory_store::MemoryCredentialStore;
use services::pg_store::PgCredentialStore;
use services::rate_limit::TokenRateLimiter;
use services::retention::{self, RetentionContext};

pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub engine: ModerationEngine,
    pub rate_limiter: Arc<TokenRateLimiter>,
    pub max_image_size_mb: u64,
}

/// Full application router with middleware applied
pub fn build_app(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.max_image_size_mb.saturating_mul(1024 * 1024))
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::build_routes()
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// RUST_LOG wins, then LOG_LEVEL, then info
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(std::env::var("LOG_LEVEL").unwrap_or_default()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env()?;

    let store: Arc<dyn CredentialStore> = match &settings.database_url {
        Some(url) => {
            let max_connections = settings.database_max_connections;
            let store = PgCredentialStore::connect(url, max_connections).await?;
            tracing::info!(max_connections, "Connected to Postgres");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, tokens and usage are kept in memory only");
            Arc::new(MemoryCredentialStore::new())
        }
    };

    let (admin, created) = credentials::ensure_admin_token(store.as_ref()).await?;
    if created {
        tracing::info!(token = %admin.token, "Created initial admin token, store it securely");
    }

    let engine = ModerationEngine::new(
        settings.build_analyzer(),
        RiskAggregator::new(settings.scoring_config()),
    )
    .with_inference_delay(settings.inference_delay);
    tracing::info!(
        analyzer = engine.analyzer_name(),
        safety_threshold = engine.aggregator().config().unsafe_risk_threshold,
        inference_delay_ms = settings.inference_delay.as_millis() as u64,
        "Moderation engine ready"
    );

    let rate_limiter = Arc::new(TokenRateLimiter::new(settings.rate_limit()));

    tokio::spawn(retention::run_retention_worker(
        RetentionContext {
            store: Arc::clone(&store),
            rate_limiter: Arc::clone(&rate_limiter),
            retention_days: settings.usage_retention_days,
        },
        settings.usage_retention_cron.clone(),
    ));

    let state = Arc::new(AppState {
        store,
        engine,
        rate_limiter,
        max_image_size_mb: settings.max_image_size_mb,
    });
    let app = build_app(state);

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
