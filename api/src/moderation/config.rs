//! Tunable constants for scoring and the reference heuristic
//!
//! Defaults are built once and shared through `LazyLock`; callers that need
//! different values clone a default and adjust it before building an
//! analyzer or aggregator. Nothing here is mutated at runtime.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::category::Category;

/// Risk aggregation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Confidence a category must strictly exceed to count as detected (default: 0.5)
    pub detection_threshold: f64,

    /// Overall risk at or above which an image is unsafe (default: 0.6)
    pub unsafe_risk_threshold: f64,

    /// Share of the highest weighted score in the overall risk (default: 0.7)
    pub max_share: f64,

    /// Share of the mean weighted score in the overall risk (default: 0.3)
    pub mean_share: f64,

    /// Weight for a category missing from `category_weights` (default: 0.5)
    pub default_weight: f64,

    /// Severity weight per category, each in (0, 1]
    pub category_weights: BTreeMap<Category, f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            detection_threshold: 0.5,
            unsafe_risk_threshold: 0.6,
            max_share: 0.7,
            mean_share: 0.3,
            default_weight: 0.5,
            category_weights: BTreeMap::from([
                (Category::Violence, 1.0),
                (Category::Nudity, 0.8),
                (Category::HateSymbols, 1.0),
                (Category::SelfHarm, 1.0),
                (Category::ExtremistContent, 1.0),
                (Category::IllegalDrugs, 0.7),
                (Category::Weapons, 0.9),
                (Category::Harassment, 0.6),
            ]),
        }
    }
}

impl ScoringConfig {
    pub fn with_unsafe_risk_threshold(mut self, threshold: f64) -> Self {
        self.unsafe_risk_threshold = threshold;
        self
    }

    pub fn weight(&self, category: Category) -> f64 {
        self.category_weights
            .get(&category)
            .copied()
            .unwrap_or(self.default_weight)
    }

    pub fn is_detected(&self, confidence: f64) -> bool {
        confidence > self.detection_threshold
    }

    pub fn is_safe(&self, risk_score: f64) -> bool {
        risk_score < self.unsafe_risk_threshold
    }
}

/// Pixel predicate used to estimate skin-tone coverage
#[derive(Debug, Clone, PartialEq)]
pub struct SkinToneRule {
    /// Red channel must exceed this (default: 95)
    pub min_red: u8,
    /// Green channel must exceed this (default: 40)
    pub min_green: u8,
    /// Blue channel must exceed this (default: 20)
    pub min_blue: u8,
    /// Red must exceed green by more than this (default: 15)
    pub min_red_green_gap: i16,
    /// Red must exceed blue by more than this (default: 15)
    pub min_red_blue_gap: i16,
    /// Multiplier applied to the matching fraction before capping at 1.0 (default: 2.0)
    pub ratio_scale: f64,
}

impl Default for SkinToneRule {
    fn default() -> Self {
        Self {
            min_red: 95,
            min_green: 40,
            min_blue: 20,
            min_red_green_gap: 15,
            min_red_blue_gap: 15,
            ratio_scale: 2.0,
        }
    }
}

impl SkinToneRule {
    pub fn matches(&self, r: u8, g: u8, b: u8) -> bool {
        let (ri, gi, bi) = (r as i16, g as i16, b as i16);
        r > self.min_red
            && g > self.min_green
            && b > self.min_blue
            && r > g
            && r > b
            && ri - gi > self.min_red_green_gap
            && ri - bi > self.min_red_blue_gap
    }
}

/// Coefficients of the statistics-based reference analyzer
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicConfig {
    /// Starting score for every category (default: 0.1)
    pub base_score: f64,

    /// Violence term per unit of darkness, `1 - mean/255` (default: 0.3)
    pub violence_darkness: f64,
    /// Divisor applied to pixel variance for the violence term (default: 10000.0)
    pub violence_variance_divisor: f64,
    /// Cap on the violence variance term (default: 0.4)
    pub violence_variance_cap: f64,

    /// Nudity term per unit of skin-tone ratio (default: 0.5)
    pub nudity_skin: f64,

    /// Weapons term per unit of darkness (default: 0.2)
    pub weapons_darkness: f64,

    /// Spread of the uniform random term for categories with no pixel signal.
    /// Hate symbols and illegal drugs 0.2, self-harm 0.15, extremist content
    /// and harassment 0.1.
    pub random_spread: BTreeMap<Category, f64>,

    /// Standard deviation of the Gaussian perturbation on every score (default: 0.05)
    pub noise_std_dev: f64,

    pub skin_tone: SkinToneRule,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            base_score: 0.1,
            violence_darkness: 0.3,
            violence_variance_divisor: 10_000.0,
            violence_variance_cap: 0.4,
            nudity_skin: 0.5,
            weapons_darkness: 0.2,
            random_spread: BTreeMap::from([
                (Category::HateSymbols, 0.2),
                (Category::SelfHarm, 0.15),
                (Category::ExtremistContent, 0.1),
                (Category::IllegalDrugs, 0.2),
                (Category::Harassment, 0.1),
            ]),
            noise_std_dev: 0.05,
            skin_tone: SkinToneRule::default(),
        }
    }
}

impl HeuristicConfig {
    pub fn random_spread(&self, category: Category) -> f64 {
        self.random_spread.get(&category).copied().unwrap_or(0.0)
    }
}

pub static DEFAULT_SCORING: LazyLock<ScoringConfig> = LazyLock::new(ScoringConfig::default);

pub static DEFAULT_HEURISTIC: LazyLock<HeuristicConfig> = LazyLock::new(HeuristicConfig::default);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_a_weight_in_range() {
        for category in Category::ALL {
            let weight = DEFAULT_SCORING.weight(category);
            assert!(weight > 0.0 && weight <= 1.0, "{category} weight {weight}");
        }
    }

    #[test]
    fn unlisted_category_falls_back_to_default_weight() {
        let mut config = ScoringConfig::default();
        config.category_weights.remove(&Category::Harassment);
        assert_eq!(config.weight(Category::Harassment), 0.5);
        assert_eq!(config.weight(Category::Violence), 1.0);
    }

    #[test]
    fn detection_boundary_is_strict() {
        assert!(!DEFAULT_SCORING.is_detected(0.5));
        assert!(DEFAULT_SCORING.is_detected(0.500_001));
        assert!(!DEFAULT_SCORING.is_detected(0.0));
    }

    #[test]
    fn safety_boundary_is_strict() {
        assert!(!DEFAULT_SCORING.is_safe(0.6));
        assert!(DEFAULT_SCORING.is_safe(0.599_999));
        assert!(!DEFAULT_SCORING.is_safe(1.0));
    }

    #[test]
    fn overriding_threshold_changes_safety() {
        let config = ScoringConfig::default().with_unsafe_risk_threshold(0.7);
        assert!(config.is_safe(0.65));
        assert!(!config.is_safe(0.7));
    }

    #[test]
    fn skin_tone_rule_matches_reference_inequalities() {
        let rule = SkinToneRule::default();
        assert!(rule.matches(200, 120, 90));
        // green not above 40
        assert!(!rule.matches(200, 40, 30));
        // red-green gap exactly 15
        assert!(!rule.matches(120, 105, 50));
        // blue dominant
        assert!(!rule.matches(100, 50, 120));
    }

    #[test]
    fn only_signal_free_categories_get_random_spread() {
        let config = HeuristicConfig::default();
        assert_eq!(config.random_spread(Category::Violence), 0.0);
        assert_eq!(config.random_spread(Category::Nudity), 0.0);
        assert_eq!(config.random_spread(Category::Weapons), 0.0);
        assert_eq!(config.random_spread(Category::SelfHarm), 0.15);
    }
}
