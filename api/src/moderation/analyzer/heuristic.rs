//! Reference analyzers built on whole-image pixel statistics
//!
//! These stand in for a trained classifier. `StatisticsAnalyzer` uses only the
//! deterministic brightness, variance and skin-tone terms. `HeuristicAnalyzer`
//! adds the uniform and Gaussian terms, drawn from a [`NoiseSource`].

use image::RgbImage;

use super::PixelAnalyzer;
use super::noise::{self, NoiseSource};
use crate::moderation::category::{Category, CategoryScores};
use crate::moderation::config::{DEFAULT_HEURISTIC, HeuristicConfig};
use crate::moderation::error::ModerationError;
use crate::moderation::stats::{self, PixelStats};

/// Deterministic analyzer: same pixels, same scores
pub struct StatisticsAnalyzer {
    config: HeuristicConfig,
}

impl StatisticsAnalyzer {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// Deterministic part of every category score (unclamped)
    pub fn score_stats(&self, stats: &PixelStats) -> CategoryScores {
        let c = &self.config;
        Category::ALL
            .iter()
            .map(|&category| {
                let signal = match category {
                    Category::Violence => {
                        stats.darkness() * c.violence_darkness
                            + (stats.variance / c.violence_variance_divisor)
                                .min(c.violence_variance_cap)
                    }
                    Category::Nudity => stats.skin_tone_ratio * c.nudity_skin,
                    Category::Weapons => stats.darkness() * c.weapons_darkness,
                    _ => 0.0,
                };
                (category, c.base_score + signal)
            })
            .collect()
    }
}

impl Default for StatisticsAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_HEURISTIC.clone())
    }
}

impl PixelAnalyzer for StatisticsAnalyzer {
    fn name(&self) -> &'static str {
        "statistics"
    }

    fn analyze(&self, pixels: &RgbImage) -> Result<CategoryScores, ModerationError> {
        let stats = stats::compute(pixels, &self.config.skin_tone)?;
        Ok(self
            .score_stats(&stats)
            .into_iter()
            .map(|(category, score)| (category, score.clamp(0.0, 1.0)))
            .collect())
    }
}

/// Statistics terms plus random terms, mirroring an untrained classifier
pub struct HeuristicAnalyzer {
    statistics: StatisticsAnalyzer,
    noise: NoiseSource,
}

impl HeuristicAnalyzer {
    pub fn new(config: HeuristicConfig, noise: NoiseSource) -> Self {
        Self {
            statistics: StatisticsAnalyzer::new(config),
            noise,
        }
    }

    /// Default coefficients with OS-seeded randomness
    pub fn with_entropy() -> Self {
        Self::new(DEFAULT_HEURISTIC.clone(), NoiseSource::entropy())
    }

    /// Default coefficients with a reproducible random sequence
    pub fn seeded(seed: u64) -> Self {
        Self::new(DEFAULT_HEURISTIC.clone(), NoiseSource::seeded(seed))
    }
}

impl PixelAnalyzer for HeuristicAnalyzer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn analyze(&self, pixels: &RgbImage) -> Result<CategoryScores, ModerationError> {
        let config = self.statistics.config();
        let stats = stats::compute(pixels, &config.skin_tone)?;
        let base = self.statistics.score_stats(&stats);
        let normal = noise::gaussian(config.noise_std_dev)?;

        self.noise.with_rng(|rng| {
            base.into_iter()
                .map(|(category, score)| {
                    let spread = config.random_spread(category);
                    let random_term = if spread > 0.0 {
                        noise::uniform(rng) * spread
                    } else {
                        0.0
                    };
                    let perturbed = score + random_term + noise::sample(&normal, rng);
                    (category, perturbed.clamp(0.0, 1.0))
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(8, 8, Rgb(rgb))
    }

    fn checkerboard() -> RgbImage {
        RgbImage::from_fn(8, 8, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn statistics_scores_black_image() {
        let scores = StatisticsAnalyzer::default().analyze(&solid([0, 0, 0])).unwrap();

        assert_eq!(scores.len(), Category::ALL.len());
        // base + full darkness * 0.3, no variance
        assert!((scores[&Category::Violence] - 0.4).abs() < 1e-12);
        assert!((scores[&Category::Weapons] - 0.3).abs() < 1e-12);
        assert!((scores[&Category::Nudity] - 0.1).abs() < 1e-12);
        assert!((scores[&Category::HateSymbols] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn statistics_variance_term_is_capped() {
        let scores = StatisticsAnalyzer::default().analyze(&checkerboard()).unwrap();
        // base 0.1 + darkness 0.5 * 0.3 + capped variance 0.4
        assert!((scores[&Category::Violence] - 0.65).abs() < 1e-12);
    }

    #[test]
    fn statistics_skin_tone_drives_nudity() {
        let scores = StatisticsAnalyzer::default()
            .analyze(&solid([210, 140, 110]))
            .unwrap();
        assert!((scores[&Category::Nudity] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn statistics_analyzer_is_deterministic() {
        let analyzer = StatisticsAnalyzer::default();
        let img = checkerboard();
        assert_eq!(analyzer.analyze(&img).unwrap(), analyzer.analyze(&img).unwrap());
    }

    #[test]
    fn seeded_heuristic_reproduces_scores() {
        let img = solid([120, 80, 60]);
        let first = HeuristicAnalyzer::seeded(42).analyze(&img).unwrap();
        let second = HeuristicAnalyzer::seeded(42).analyze(&img).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn heuristic_scores_stay_in_unit_range() {
        let analyzer = HeuristicAnalyzer::seeded(3);
        for img in [solid([0, 0, 0]), solid([255, 255, 255]), checkerboard()] {
            for _ in 0..20 {
                let scores = analyzer.analyze(&img).unwrap();
                assert_eq!(scores.len(), Category::ALL.len());
                assert!(scores.values().all(|v| (0.0..=1.0).contains(v)));
            }
        }
    }

    #[test]
    fn heuristic_without_noise_stays_within_random_spread() {
        let mut config = HeuristicConfig::default();
        config.noise_std_dev = 0.0;
        let analyzer = HeuristicAnalyzer::new(config, NoiseSource::seeded(9));

        let scores = analyzer.analyze(&solid([255, 255, 255])).unwrap();
        // deterministic categories equal the statistics score exactly
        assert!((scores[&Category::Violence] - 0.1).abs() < 1e-12);
        assert!((scores[&Category::Weapons] - 0.1).abs() < 1e-12);
        // random-only categories land in [base, base + spread)
        let hate = scores[&Category::HateSymbols];
        assert!((0.1..0.3).contains(&hate), "hate_symbols {hate}");
        let extremist = scores[&Category::ExtremistContent];
        assert!((0.1..0.2).contains(&extremist), "extremist {extremist}");
    }

    #[test]
    fn empty_image_is_rejected() {
        let err = HeuristicAnalyzer::seeded(1)
            .analyze(&RgbImage::new(0, 0))
            .unwrap_err();
        assert!(err.is_invalid_image());
    }
}
