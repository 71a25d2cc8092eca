//! Usage retention background job using apalis
//!
//! Runs on a cron schedule and deletes usage records older than the
//! configured retention window.

use apalis::prelude::*;
use apalis_cron::{CronStream, Schedule};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use super::credentials::CredentialStore;
use super::rate_limit::TokenRateLimiter;

/// Rate limit buckets idle this long are dropped on each run
const IDLE_BUCKET_SECS: u64 = 3600;

/// Job input - the tick that triggered the purge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeJob {
    pub scheduled_at: DateTime<Utc>,
}

impl From<DateTime<Utc>> for PurgeJob {
    fn from(dt: DateTime<Utc>) -> Self {
        PurgeJob { scheduled_at: dt }
    }
}

#[derive(Clone)]
pub struct RetentionContext {
    pub store: Arc<dyn CredentialStore>,
    pub rate_limiter: Arc<TokenRateLimiter>,
    pub retention_days: i64,
}

/// Records strictly before this instant are purged
pub fn purge_cutoff(now: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    now - Duration::days(retention_days)
}

/// Always returns Ok - a failed purge is logged and retried on the next tick
async fn run_purge_job(job: PurgeJob, ctx: Data<RetentionContext>) -> Result<(), Error> {
    purge_once(&ctx, job.scheduled_at).await;
    Ok(())
}

async fn purge_once(ctx: &RetentionContext, now: DateTime<Utc>) {
    let cutoff = purge_cutoff(now, ctx.retention_days);
    match ctx.store.purge_usage_before(cutoff).await {
        Ok(0) => tracing::debug!(%cutoff, "No usage records to purge"),
        Ok(purged) => tracing::info!(purged, %cutoff, "Purged old usage records"),
        Err(e) => tracing::error!(error = %e, "Usage purge failed"),
    }
    ctx.rate_limiter
        .cleanup(std::time::Duration::from_secs(IDLE_BUCKET_SECS));
}

/// Start the retention worker. Runs until the process exits.
pub async fn run_retention_worker(ctx: RetentionContext, cron_expr: String) {
    let schedule = match Schedule::from_str(&cron_expr) {
        Ok(schedule) => schedule,
        Err(e) => {
            tracing::error!(error = %e, cron = %cron_expr, "Invalid retention schedule");
            return;
        }
    };

    tracing::info!(
        cron = %cron_expr,
        retention_days = ctx.retention_days,
        "Usage retention worker starting"
    );

    let worker = WorkerBuilder::new("usage-retention")
        .data(ctx)
        .backend(CronStream::new(schedule))
        .build_fn(run_purge_job);

    if let Err(e) = Monitor::new().register(worker).run().await {
        tracing::error!(error = ?e, "Retention worker monitor failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::MemoryCredentialStore;
    use crate::services::rate_limit::RateLimitConfig;
    use serde_json::json;

    #[test]
    fn cutoff_is_retention_days_before_now() {
        let now = DateTime::parse_from_rfc3339("2024-03-31T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let cutoff = purge_cutoff(now, 30);
        assert_eq!(cutoff.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }

    #[tokio::test]
    async fn purge_keeps_records_inside_window() {
        let store = Arc::new(MemoryCredentialStore::new());
        let token = store.create_token(false).await.unwrap().token;
        store.record_usage(&token, "api_call", json!({})).await.unwrap();

        let ctx = RetentionContext {
            store: store.clone(),
            rate_limiter: Arc::new(TokenRateLimiter::new(RateLimitConfig {
                max_tokens: 1,
                refill_rate: 1.0,
            })),
            retention_days: 30,
        };

        purge_once(&ctx, Utc::now()).await;
        assert_eq!(store.usage_records(&token, 10).await.unwrap().len(), 1);

        // a tick far in the future sees the record as expired
        purge_once(&ctx, Utc::now() + Duration::days(31)).await;
        assert!(store.usage_records(&token, 10).await.unwrap().is_empty());
    }
}
