//! Token domain - DB queries for api_tokens

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

use crate::models::{TokenRecord, TokenSummary};

pub async fn insert_token<'e, E>(
    executor: E,
    token: &str,
    is_admin: bool,
    created_at: DateTime<Utc>,
) -> Result<TokenRecord, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        INSERT INTO api_tokens (token, is_admin, created_at)
        VALUES ($1, $2, $3)
        RETURNING token, is_admin, created_at, last_used_at
        "#,
    )
    .bind(token)
    .bind(is_admin)
    .bind(created_at)
    .fetch_one(executor)
    .await
}

pub async fn get_token<'e, E>(executor: E, token: &str) -> Result<Option<TokenRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        "SELECT token, is_admin, created_at, last_used_at FROM api_tokens WHERE token = $1",
    )
    .bind(token)
    .fetch_optional(executor)
    .await
}

/// Oldest admin token, if any
pub async fn get_admin_token<'e, E>(executor: E) -> Result<Option<TokenRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT token, is_admin, created_at, last_used_at FROM api_tokens
        WHERE is_admin
        ORDER BY created_at
        LIMIT 1
        "#,
    )
    .fetch_optional(executor)
    .await
}

/// All tokens with their usage counts, newest first
pub async fn list_tokens<'e, E>(executor: E) -> Result<Vec<TokenSummary>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT t.token, t.is_admin, t.created_at, t.last_used_at,
               COUNT(u.id) AS usage_count
        FROM api_tokens t
        LEFT JOIN usages u ON u.token = t.token
        GROUP BY t.token
        ORDER BY t.created_at DESC
        "#,
    )
    .fetch_all(executor)
    .await
}

/// Delete a token. Returns true if it existed.
pub async fn delete_token<'e, E>(executor: E, token: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM api_tokens WHERE token = $1")
        .bind(token)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns false when no such token exists
pub async fn touch_last_used<'e, E>(
    executor: E,
    token: &str,
    at: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("UPDATE api_tokens SET last_used_at = $2 WHERE token = $1")
        .bind(token)
        .bind(at)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
