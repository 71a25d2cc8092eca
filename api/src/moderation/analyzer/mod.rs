use image::RgbImage;

use super::category::CategoryScores;
use super::error::ModerationError;

/// Pluggable per-category scorer.
///
/// Implementations receive an already-normalized RGB buffer, perform no I/O,
/// and must be callable from many threads at once. Returned confidences may
/// fall outside [0, 1]; the aggregator clamps them. Every category in
/// [`Category::ALL`](super::category::Category::ALL) must be scored.
pub trait PixelAnalyzer: Send + Sync {
    /// Short identifier used in logs and configuration
    fn name(&self) -> &'static str;

    /// Score every category for the given pixels
    fn analyze(&self, pixels: &RgbImage) -> Result<CategoryScores, ModerationError>;
}

mod heuristic;
mod noise;
mod noop;

pub use heuristic::{HeuristicAnalyzer, StatisticsAnalyzer};
pub use noop::NoOpAnalyzer;
