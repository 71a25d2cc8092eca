//! Postgres-backed credential store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::credentials::{CredentialStore, StoreError, generate_token};
use crate::domain::{schema, tokens, usages};
use crate::models::{TokenRecord, TokenSummary, UsageRecord, UsageSummary};

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Connect and make sure the tables exist
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        schema::ensure_schema(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_token(&self, is_admin: bool) -> Result<TokenRecord, StoreError> {
        let token = generate_token();
        Ok(tokens::insert_token(&self.pool, &token, is_admin, Utc::now()).await?)
    }

    async fn get_token(&self, token: &str) -> Result<Option<TokenRecord>, StoreError> {
        Ok(tokens::get_token(&self.pool, token).await?)
    }

    async fn get_admin_token(&self) -> Result<Option<TokenRecord>, StoreError> {
        Ok(tokens::get_admin_token(&self.pool).await?)
    }

    async fn list_tokens(&self) -> Result<Vec<TokenSummary>, StoreError> {
        Ok(tokens::list_tokens(&self.pool).await?)
    }

    async fn delete_token(&self, token: &str) -> Result<bool, StoreError> {
        // usages go with it via ON DELETE CASCADE
        Ok(tokens::delete_token(&self.pool, token).await?)
    }

    async fn record_usage(
        &self,
        token: &str,
        endpoint: &str,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        // a token deleted mid-request leaves nothing to attribute usage to
        if !tokens::touch_last_used(&mut *tx, token, now).await? {
            tx.rollback().await?;
            return Ok(());
        }
        usages::insert_usage(&mut *tx, token, endpoint, now, &metadata).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn usage_records(&self, token: &str, limit: i64) -> Result<Vec<UsageRecord>, StoreError> {
        Ok(usages::list_usages(&self.pool, token, limit).await?)
    }

    async fn usage_summary(&self, token: &str) -> Result<UsageSummary, StoreError> {
        let endpoints = usages::endpoint_usage(&self.pool, token).await?;
        Ok(UsageSummary {
            token: token.to_string(),
            total_usage: endpoints.iter().map(|e| e.count).sum(),
            endpoints,
        })
    }

    async fn purge_usage_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(usages::delete_usages_before(&self.pool, cutoff).await?)
    }
}
