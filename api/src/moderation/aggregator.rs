//! Risk aggregation
//!
//! Turns raw per-category confidences into detection flags, an overall risk
//! score and a safety decision.
//!
//! # Scoring
//!
//! 1. Clamp every confidence to [0, 1]
//! 2. `detected = confidence > detection_threshold`
//! 3. Weight each confidence by category severity
//! 4. `risk = max_share * max(weighted) + mean_share * mean(weighted)`, capped at 1.0
//! 5. `is_safe = risk < unsafe_risk_threshold`
//!
//! The aggregator holds no mutable state, so the same scores always produce
//! the same assessment.

use std::sync::Arc;

use super::category::{CategoryResult, CategoryScores};
use super::config::{DEFAULT_SCORING, ScoringConfig};
use super::error::ModerationError;

/// Aggregated outcome for one set of category scores
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub is_safe: bool,
    pub categories: Vec<CategoryResult>,
}

#[derive(Debug, Clone)]
pub struct RiskAggregator {
    config: Arc<ScoringConfig>,
}

impl RiskAggregator {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn aggregate(&self, scores: &CategoryScores) -> Result<RiskAssessment, ModerationError> {
        if scores.is_empty() {
            return Ok(RiskAssessment {
                risk_score: 0.0,
                is_safe: true,
                categories: Vec::new(),
            });
        }

        let mut categories = Vec::with_capacity(scores.len());
        let mut max_weighted = 0.0_f64;
        let mut sum_weighted = 0.0_f64;

        for (&category, &raw) in scores {
            if !raw.is_finite() {
                return Err(ModerationError::analysis(format!(
                    "non-finite confidence {} for {}",
                    raw, category
                )));
            }
            let confidence = raw.clamp(0.0, 1.0);
            let weighted = confidence * self.config.weight(category);

            max_weighted = max_weighted.max(weighted);
            sum_weighted += weighted;
            categories.push(CategoryResult::new(
                category,
                confidence,
                self.config.is_detected(confidence),
            ));
        }

        let mean_weighted = sum_weighted / categories.len() as f64;
        let risk_score = (self.config.max_share * max_weighted
            + self.config.mean_share * mean_weighted)
            .min(1.0);

        Ok(RiskAssessment {
            risk_score,
            is_safe: self.config.is_safe(risk_score),
            categories,
        })
    }
}

impl Default for RiskAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_SCORING.clone())
    }
}
