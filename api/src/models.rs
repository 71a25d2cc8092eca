//! Shared data models used across modules

use chrono::{DateTime, Utc};
use serde::Serialize;

/// An API token as stored
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TokenRecord {
    pub token: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Token listing entry with its usage count
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TokenSummary {
    pub token: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub usage_count: i64,
}

/// One recorded API call
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UsageRecord {
    pub id: i64,
    pub token: String,
    pub endpoint: String,
    #[sqlx(rename = "recorded_at")]
    pub timestamp: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

/// Per-endpoint aggregate within a usage summary
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct EndpointUsage {
    pub endpoint: String,
    pub count: i64,
    pub last_used: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    pub token: String,
    pub total_usage: i64,
    pub endpoints: Vec<EndpointUsage>,
}
