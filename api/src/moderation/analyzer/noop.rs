use image::RgbImage;

use super::PixelAnalyzer;
use crate::moderation::category::{Category, CategoryScores};
use crate::moderation::error::ModerationError;

/// Analyzer that scores every category zero - for smoke tests or opt-out
pub struct NoOpAnalyzer;

impl NoOpAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelAnalyzer for NoOpAnalyzer {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn analyze(&self, pixels: &RgbImage) -> Result<CategoryScores, ModerationError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(ModerationError::invalid_image("image has no pixels"));
        }
        Ok(Category::ALL.iter().map(|c| (*c, 0.0)).collect())
    }
}
