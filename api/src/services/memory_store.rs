//! Process-local credential store, used without DATABASE_URL and in tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::credentials::{CredentialStore, StoreError, generate_token};
use crate::models::{EndpointUsage, TokenRecord, TokenSummary, UsageRecord, UsageSummary};

#[derive(Default)]
struct Inner {
    tokens: HashMap<String, TokenRecord>,
    usages: Vec<UsageRecord>,
    next_usage_id: i64,
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_token(&self, is_admin: bool) -> Result<TokenRecord, StoreError> {
        let record = TokenRecord {
            token: generate_token(),
            is_admin,
            created_at: Utc::now(),
            last_used_at: None,
        };
        self.inner
            .write()
            .await
            .tokens
            .insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn get_token(&self, token: &str) -> Result<Option<TokenRecord>, StoreError> {
        Ok(self.inner.read().await.tokens.get(token).cloned())
    }

    async fn get_admin_token(&self) -> Result<Option<TokenRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tokens
            .values()
            .filter(|t| t.is_admin)
            .min_by_key(|t| t.created_at)
            .cloned())
    }

    async fn list_tokens(&self) -> Result<Vec<TokenSummary>, StoreError> {
        let inner = self.inner.read().await;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for usage in &inner.usages {
            *counts.entry(usage.token.as_str()).or_default() += 1;
        }

        let mut summaries: Vec<TokenSummary> = inner
            .tokens
            .values()
            .map(|t| TokenSummary {
                token: t.token.clone(),
                is_admin: t.is_admin,
                created_at: t.created_at,
                last_used_at: t.last_used_at,
                usage_count: counts.get(t.token.as_str()).copied().unwrap_or(0),
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn delete_token(&self, token: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.tokens.remove(token).is_none() {
            return Ok(false);
        }
        inner.usages.retain(|u| u.token != token);
        Ok(true)
    }

    async fn record_usage(
        &self,
        token: &str,
        endpoint: &str,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        // usages reference tokens, same as the foreign key in Postgres
        let Some(record) = inner.tokens.get_mut(token) else {
            return Ok(());
        };
        record.last_used_at = Some(now);

        inner.next_usage_id += 1;
        let id = inner.next_usage_id;
        inner.usages.push(UsageRecord {
            id,
            token: token.to_string(),
            endpoint: endpoint.to_string(),
            timestamp: now,
            metadata,
        });
        Ok(())
    }

    async fn usage_records(&self, token: &str, limit: i64) -> Result<Vec<UsageRecord>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let inner = self.inner.read().await;
        // appended in time order, so reverse is newest first
        Ok(inner
            .usages
            .iter()
            .rev()
            .filter(|u| u.token == token)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn usage_summary(&self, token: &str) -> Result<UsageSummary, StoreError> {
        let inner = self.inner.read().await;
        let mut by_endpoint: BTreeMap<&str, (i64, DateTime<Utc>)> = BTreeMap::new();
        for usage in inner.usages.iter().filter(|u| u.token == token) {
            let entry = by_endpoint
                .entry(usage.endpoint.as_str())
                .or_insert((0, usage.timestamp));
            entry.0 += 1;
            entry.1 = entry.1.max(usage.timestamp);
        }

        let mut endpoints: Vec<EndpointUsage> = by_endpoint
            .into_iter()
            .map(|(endpoint, (count, last_used))| EndpointUsage {
                endpoint: endpoint.to_string(),
                count,
                last_used,
            })
            .collect();
        // stable sort keeps endpoint name order among ties
        endpoints.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(UsageSummary {
            token: token.to_string(),
            total_usage: endpoints.iter().map(|e| e.count).sum(),
            endpoints,
        })
    }

    async fn purge_usage_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.usages.len();
        inner.usages.retain(|u| u.timestamp >= cutoff);
        Ok((before - inner.usages.len()) as u64)
    }
}
