//! Moderation verdict engine
//!
//! Converts decoded pixels into per-category confidences, aggregates them
//! into an overall risk score and safety decision, and wraps the outcome in
//! an immutable [`ModerationVerdict`].
//!
//! ```text
//! DynamicImage -> pixels::into_rgb -> PixelAnalyzer -> RiskAggregator -> ModerationVerdict
//! ```
//!
//! Nothing in this module logs, persists, or performs I/O.

mod aggregator;
mod analyzer;
mod category;
mod config;
mod engine;
mod error;
pub mod pixels;
mod stats;
mod verdict;

pub use aggregator::RiskAggregator;
pub use analyzer::{HeuristicAnalyzer, NoOpAnalyzer, PixelAnalyzer, StatisticsAnalyzer};
pub use config::ScoringConfig;
pub use engine::ModerationEngine;
pub use error::ModerationError;
pub use verdict::ModerationVerdict;
