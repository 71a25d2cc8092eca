//! Gateway configuration loaded from environment variables

use apalis_cron::Schedule;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::moderation::{
    HeuristicAnalyzer, NoOpAnalyzer, PixelAnalyzer, ScoringConfig, StatisticsAnalyzer,
};
use crate::services::rate_limit::RateLimitConfig;

/// Which [`PixelAnalyzer`] backs the moderation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerKind {
    Heuristic,
    Statistics,
    NoOp,
}

impl FromStr for AnalyzerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(Self::Heuristic),
            "statistics" => Ok(Self::Statistics),
            "noop" | "none" => Ok(Self::NoOp),
            other => Err(format!(
                "unknown analyzer '{}' (expected heuristic, statistics or noop)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// Bind host (default: 0.0.0.0)
    pub host: String,
    /// Bind port (default: 7000)
    pub port: u16,
    /// Postgres URL; the in-memory credential store is used when unset
    pub database_url: Option<String>,
    /// Pool size (default: 5)
    pub database_max_connections: u32,
    /// Upload cap in megabytes (default: 10)
    pub max_image_size_mb: u64,
    /// Risk at or above which an image is unsafe (default: 0.6)
    pub safety_threshold: f64,
    /// Simulated model latency (default: 100ms)
    pub inference_delay: Duration,
    /// Analyzer backend (default: heuristic)
    pub analyzer: AnalyzerKind,
    /// Fixed seed for the heuristic analyzer's noise
    pub analyzer_seed: Option<u64>,
    /// Requests a token may burst (default: 60)
    pub rate_limit_burst: u32,
    /// Sustained requests per second per token (default: 2.0)
    pub rate_limit_per_sec: f64,
    /// Usage records older than this are purged (default: 30)
    pub usage_retention_days: i64,
    /// Six-field cron expression for the purge job (default: hourly)
    pub usage_retention_cron: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7000,
            database_url: None,
            database_max_connections: 5,
            max_image_size_mb: 10,
            safety_threshold: 0.6,
            inference_delay: Duration::from_millis(100),
            analyzer: AnalyzerKind::Heuristic,
            analyzer_seed: None,
            rate_limit_burst: 60,
            rate_limit_per_sec: 2.0,
            usage_retention_days: 30,
            usage_retention_cron: "0 0 * * * *".into(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup; unset keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let settings = Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse(&get, "PORT")?.unwrap_or(defaults.port),
            database_url: get("DATABASE_URL"),
            database_max_connections: parse(&get, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.database_max_connections),
            max_image_size_mb: parse(&get, "MAX_IMAGE_SIZE_MB")?
                .unwrap_or(defaults.max_image_size_mb),
            safety_threshold: parse(&get, "SAFETY_THRESHOLD")?
                .unwrap_or(defaults.safety_threshold),
            inference_delay: parse(&get, "INFERENCE_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.inference_delay),
            analyzer: parse(&get, "ANALYZER")?.unwrap_or(defaults.analyzer),
            analyzer_seed: parse(&get, "ANALYZER_SEED")?,
            rate_limit_burst: parse(&get, "RATE_LIMIT_BURST")?
                .unwrap_or(defaults.rate_limit_burst),
            rate_limit_per_sec: parse(&get, "RATE_LIMIT_PER_SEC")?
                .unwrap_or(defaults.rate_limit_per_sec),
            usage_retention_days: parse(&get, "USAGE_RETENTION_DAYS")?
                .unwrap_or(defaults.usage_retention_days),
            usage_retention_cron: get("USAGE_RETENTION_CRON")
                .unwrap_or(defaults.usage_retention_cron),
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.safety_threshold) {
            return Err(ConfigError::invalid(
                "SAFETY_THRESHOLD",
                self.safety_threshold,
                "must be between 0 and 1",
            ));
        }
        if self.max_image_size_mb == 0 {
            return Err(ConfigError::invalid("MAX_IMAGE_SIZE_MB", 0, "must be positive"));
        }
        if self.database_max_connections == 0 {
            return Err(ConfigError::invalid(
                "DATABASE_MAX_CONNECTIONS",
                0,
                "must be positive",
            ));
        }
        if self.rate_limit_burst == 0 {
            return Err(ConfigError::invalid("RATE_LIMIT_BURST", 0, "must be positive"));
        }
        if !(self.rate_limit_per_sec.is_finite() && self.rate_limit_per_sec > 0.0) {
            return Err(ConfigError::invalid(
                "RATE_LIMIT_PER_SEC",
                self.rate_limit_per_sec,
                "must be a positive number",
            ));
        }
        if self.usage_retention_days <= 0 {
            return Err(ConfigError::invalid(
                "USAGE_RETENTION_DAYS",
                self.usage_retention_days,
                "must be positive",
            ));
        }
        if let Err(e) = Schedule::from_str(&self.usage_retention_cron) {
            return Err(ConfigError::invalid(
                "USAGE_RETENTION_CRON",
                &self.usage_retention_cron,
                e,
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn scoring_config(&self) -> ScoringConfig {
        ScoringConfig::default().with_unsafe_risk_threshold(self.safety_threshold)
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_tokens: self.rate_limit_burst,
            refill_rate: self.rate_limit_per_sec,
        }
    }

    pub fn build_analyzer(&self) -> Arc<dyn PixelAnalyzer> {
        match (self.analyzer, self.analyzer_seed) {
            (AnalyzerKind::Heuristic, Some(seed)) => Arc::new(HeuristicAnalyzer::seeded(seed)),
            (AnalyzerKind::Heuristic, None) => Arc::new(HeuristicAnalyzer::with_entropy()),
            (AnalyzerKind::Statistics, _) => Arc::new(StatisticsAnalyzer::default()),
            (AnalyzerKind::NoOp, _) => Arc::new(NoOpAnalyzer::new()),
        }
    }
}

fn parse<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::invalid(key, &raw, e))
        })
        .transpose()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: impl ToString, reason: impl ToString) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
