use chrono::Utc;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::aggregator::{RiskAggregator, RiskAssessment};
use super::analyzer::PixelAnalyzer;
use super::category::{Category, CategoryScores};
use super::error::ModerationError;
use super::pixels;
use super::verdict::ModerationVerdict;

/// Runs analyzer + aggregator for one image and stamps the result.
///
/// Cheap to clone; clones share the analyzer and scoring tables.
#[derive(Clone)]
pub struct ModerationEngine {
    analyzer: Arc<dyn PixelAnalyzer>,
    aggregator: RiskAggregator,
    inference_delay: Duration,
}

impl ModerationEngine {
    pub fn new(analyzer: Arc<dyn PixelAnalyzer>, aggregator: RiskAggregator) -> Self {
        Self {
            analyzer,
            aggregator,
            inference_delay: Duration::ZERO,
        }
    }

    /// Simulated model latency awaited before analysis
    pub fn with_inference_delay(mut self, delay: Duration) -> Self {
        self.inference_delay = delay;
        self
    }

    pub fn analyzer_name(&self) -> &'static str {
        self.analyzer.name()
    }

    pub fn aggregator(&self) -> &RiskAggregator {
        &self.aggregator
    }

    /// Moderate one decoded image.
    ///
    /// Empty images are rejected up front. RGB conversion and analysis run on
    /// the blocking pool; the simulated latency is a timer, so neither stalls
    /// other requests. Dropping the returned future abandons the work and no
    /// verdict is produced.
    pub async fn moderate(
        &self,
        image: DynamicImage,
        content_hash: &str,
    ) -> Result<ModerationVerdict, ModerationError> {
        pixels::ensure_non_empty(image.width(), image.height())?;

        let started = Instant::now();
        if !self.inference_delay.is_zero() {
            tokio::time::sleep(self.inference_delay).await;
        }

        let analyzer = Arc::clone(&self.analyzer);
        let aggregator = self.aggregator.clone();
        let assessment = tokio::task::spawn_blocking(
            move || -> Result<RiskAssessment, ModerationError> {
                let pixels = pixels::into_rgb(image)?;
                let scores = analyzer.analyze(&pixels)?;
                ensure_complete(&scores, analyzer.name())?;
                aggregator.aggregate(&scores)
            },
        )
        .await
        .map_err(|e| ModerationError::analysis_caused_by("analysis task failed", e))??;

        let processing_time_ms =
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok(ModerationVerdict::new(
            assessment,
            content_hash.to_owned(),
            Utc::now(),
            processing_time_ms,
        ))
    }
}

fn ensure_complete(scores: &CategoryScores, analyzer: &str) -> Result<(), ModerationError> {
    match Category::ALL.iter().find(|c| !scores.contains_key(*c)) {
        Some(missing) => Err(ModerationError::analysis(format!(
            "{} analyzer returned no score for {}",
            analyzer, missing
        ))),
        None => Ok(()),
    }
}
