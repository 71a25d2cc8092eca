//! Token and usage persistence behind a pluggable store

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::Rng;

use crate::constants::TOKEN_BYTES;
use crate::models::{TokenRecord, TokenSummary, UsageRecord, UsageSummary};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage for API tokens and their usage history.
///
/// Implementations must be safe to share across request handlers.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Short backend name for health output
    fn backend(&self) -> &'static str;

    /// Cheap connectivity check
    async fn ping(&self) -> Result<(), StoreError>;

    async fn create_token(&self, is_admin: bool) -> Result<TokenRecord, StoreError>;

    async fn get_token(&self, token: &str) -> Result<Option<TokenRecord>, StoreError>;

    async fn get_admin_token(&self) -> Result<Option<TokenRecord>, StoreError>;

    async fn list_tokens(&self) -> Result<Vec<TokenSummary>, StoreError>;

    /// Remove a token and its usage records. Returns false if it did not exist.
    async fn delete_token(&self, token: &str) -> Result<bool, StoreError>;

    /// Append a usage record and bump the token's `last_used_at`.
    /// A token that no longer exists records nothing and is not an error.
    async fn record_usage(
        &self,
        token: &str,
        endpoint: &str,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Newest first, at most `limit`
    async fn usage_records(&self, token: &str, limit: i64) -> Result<Vec<UsageRecord>, StoreError>;

    async fn usage_summary(&self, token: &str) -> Result<UsageSummary, StoreError>;

    /// Drop usage records older than `cutoff`, returning how many went
    async fn purge_usage_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Generate a fresh URL-safe bearer token
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Return the existing admin token, creating one on first start.
///
/// The bool is true when the token was just created.
pub async fn ensure_admin_token(
    store: &dyn CredentialStore,
) -> Result<(TokenRecord, bool), StoreError> {
    if let Some(existing) = store.get_admin_token().await? {
        return Ok((existing, false));
    }
    let created = store.create_token(true).await?;
    Ok((created, true))
}
