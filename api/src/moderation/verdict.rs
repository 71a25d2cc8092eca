use chrono::{DateTime, Utc};
use serde::Serialize;

use super::aggregator::RiskAssessment;
use super::category::{Category, CategoryResult};

/// Complete moderation outcome for one image.
///
/// Only the engine builds verdicts and nothing mutates them afterwards;
/// fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationVerdict {
    is_safe: bool,
    risk_score: f64,
    categories: Vec<CategoryResult>,
    #[serde(rename = "imageHash")]
    content_hash: String,
    analyzed_at: DateTime<Utc>,
    processing_time_ms: u64,
}

impl ModerationVerdict {
    pub(crate) fn new(
        assessment: RiskAssessment,
        content_hash: String,
        analyzed_at: DateTime<Utc>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            is_safe: assessment.is_safe,
            risk_score: assessment.risk_score,
            categories: assessment.categories,
            content_hash,
            analyzed_at,
            processing_time_ms,
        }
    }

    pub fn is_safe(&self) -> bool {
        self.is_safe
    }

    pub fn risk_score(&self) -> f64 {
        self.risk_score
    }

    pub fn categories(&self) -> &[CategoryResult] {
        &self.categories
    }

    #[cfg(test)]
    pub fn category(&self, name: Category) -> Option<&CategoryResult> {
        self.categories.iter().find(|c| c.name() == name)
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn analyzed_at(&self) -> DateTime<Utc> {
        self.analyzed_at
    }

    pub fn processing_time_ms(&self) -> u64 {
        self.processing_time_ms
    }

    /// Categories whose confidence crossed the detection threshold
    pub fn detected(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories
            .iter()
            .filter(|c| c.detected())
            .map(|c| c.name())
    }
}
