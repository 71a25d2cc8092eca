//! Usage domain - DB queries for usages

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

use crate::models::{EndpointUsage, UsageRecord};

pub async fn insert_usage<'e, E>(
    executor: E,
    token: &str,
    endpoint: &str,
    recorded_at: DateTime<Utc>,
    metadata: &serde_json::Value,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO usages (token, endpoint, recorded_at, metadata)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(token)
    .bind(endpoint)
    .bind(recorded_at)
    .bind(metadata)
    .execute(executor)
    .await?;
    Ok(())
}

/// Most recent usage records for a token, newest first
pub async fn list_usages<'e, E>(
    executor: E,
    token: &str,
    limit: i64,
) -> Result<Vec<UsageRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT id, token, endpoint, recorded_at, metadata FROM usages
        WHERE token = $1
        ORDER BY recorded_at DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(token)
    .bind(limit)
    .fetch_all(executor)
    .await
}

/// Per-endpoint counts for a token, busiest first
pub async fn endpoint_usage<'e, E>(
    executor: E,
    token: &str,
) -> Result<Vec<EndpointUsage>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT endpoint, COUNT(*) AS count, MAX(recorded_at) AS last_used
        FROM usages
        WHERE token = $1
        GROUP BY endpoint
        ORDER BY count DESC, endpoint
        "#,
    )
    .bind(token)
    .fetch_all(executor)
    .await
}

/// Delete records older than the cutoff. Returns how many were removed.
pub async fn delete_usages_before<'e, E>(
    executor: E,
    cutoff: DateTime<Utc>,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM usages WHERE recorded_at < $1")
        .bind(cutoff)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
