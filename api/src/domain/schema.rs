//! Table setup, run once at startup

use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS api_tokens (
        token TEXT PRIMARY KEY,
        is_admin BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        last_used_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS usages (
        id BIGSERIAL PRIMARY KEY,
        token TEXT NOT NULL REFERENCES api_tokens(token) ON DELETE CASCADE,
        endpoint TEXT NOT NULL,
        recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        metadata JSONB NOT NULL DEFAULT '{}'::jsonb
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_usages_token ON usages (token)",
    "CREATE INDEX IF NOT EXISTS idx_usages_token_recorded ON usages (token, recorded_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_usages_recorded ON usages (recorded_at)",
];

/// Create tables and indexes if they don't exist yet
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await
}
