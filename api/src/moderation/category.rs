use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Harm categories scored for every image.
///
/// Declaration order is the order categories appear in a verdict; `Ord` is
/// derived so maps keyed by `Category` iterate in that order too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Violence,
    Nudity,
    HateSymbols,
    SelfHarm,
    ExtremistContent,
    IllegalDrugs,
    Weapons,
    Harassment,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Violence,
        Category::Nudity,
        Category::HateSymbols,
        Category::SelfHarm,
        Category::ExtremistContent,
        Category::IllegalDrugs,
        Category::Weapons,
        Category::Harassment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Violence => "violence",
            Category::Nudity => "nudity",
            Category::HateSymbols => "hate_symbols",
            Category::SelfHarm => "self_harm",
            Category::ExtremistContent => "extremist_content",
            Category::IllegalDrugs => "illegal_drugs",
            Category::Weapons => "weapons",
            Category::Harassment => "harassment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw per-category confidences produced by an analyzer
pub type CategoryScores = BTreeMap<Category, f64>;

/// Per-category outcome inside a verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResult {
    name: Category,
    confidence: f64,
    detected: bool,
}

impl CategoryResult {
    pub(crate) fn new(name: Category, confidence: f64, detected: bool) -> Self {
        Self {
            name,
            confidence,
            detected,
        }
    }

    pub fn name(&self) -> Category {
        self.name
    }

    #[cfg(test)]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn detected(&self) -> bool {
        self.detected
    }
}
