// src/classify/mod.rs
//! Coarse topic labels for trends plus the sports/non-sports rebalancer.

pub mod sports;

use anyhow::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub use sports::{balance, BalanceTargets};

pub const DEFAULT_CLASSIFIER_CONFIG: &str = include_str!("../../config/classifier.toml");
pub const ENV_CLASSIFIER_CONFIG_PATH: &str = "CLASSIFIER_CONFIG_PATH";

/// Coarse topic label. First matching keyword set wins, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Politics,
    Economic,
    Social,
    General,
}

/// Who decided the sports label for a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceSource {
    Keyword,
    Ai,
}

/// Per-trend classification, attached for the duration of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub is_sports: bool,
    pub confidence_source: ConfidenceSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub categories: CategoryKeywords,
    pub sports: SportsSection,
    pub balance: BalanceTargets,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryKeywords {
    pub politics: Vec<String>,
    pub economic: Vec<String>,
    pub social: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SportsSection {
    pub terms: Vec<String>,
}

impl ClassifierConfig {
    /// Embedded defaults, or the file named by `CLASSIFIER_CONFIG_PATH`.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(ENV_CLASSIFIER_CONFIG_PATH) {
            let content = fs::read_to_string(PathBuf::from(&path))
                .map_err(|e| anyhow::anyhow!("reading classifier config {path}: {e}"))?;
            return Self::from_toml_str(&content);
        }
        Self::from_toml_str(DEFAULT_CLASSIFIER_CONFIG)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: ClassifierConfig = toml::from_str(s)?;
        // Keywords are matched lowercased once, here, not per call.
        for set in [
            &mut cfg.categories.politics,
            &mut cfg.categories.economic,
            &mut cfg.categories.social,
            &mut cfg.sports.terms,
        ] {
            for kw in set.iter_mut() {
                *kw = kw.to_lowercase();
            }
        }
        Ok(cfg)
    }
}

static DEFAULT_CONFIG: Lazy<ClassifierConfig> = Lazy::new(|| {
    ClassifierConfig::from_toml_str(DEFAULT_CLASSIFIER_CONFIG).expect("valid embedded classifier config")
});

pub struct Classifier {
    cfg: ClassifierConfig,
}

impl Classifier {
    pub fn new(cfg: ClassifierConfig) -> Self {
        Self { cfg }
    }

    pub fn with_defaults() -> Self {
        Self {
            cfg: DEFAULT_CONFIG.clone(),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.cfg
    }

    /// Keyword categorization: politics beats economic beats social; no
    /// match means General.
    pub fn categorize(&self, text: &str) -> Category {
        let lower = text.to_lowercase();
        let hit = |set: &[String]| set.iter().any(|kw| lower.contains(kw.as_str()));

        if hit(&self.cfg.categories.politics) {
            Category::Politics
        } else if hit(&self.cfg.categories.economic) {
            Category::Economic
        } else if hit(&self.cfg.categories.social) {
            Category::Social
        } else {
            Category::General
        }
    }

    /// Local sports heuristic over the trend label: vocabulary match, or the
    /// fan-army pattern of a hashtag glued to a follower count.
    pub fn is_sports_label(&self, label: &str) -> bool {
        let lower = label.to_lowercase();
        if self.cfg.sports.terms.iter().any(|kw| lower.contains(kw.as_str())) {
            return true;
        }
        sports::hashtag_with_count(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn congreso_is_politics() {
        let c = Classifier::with_defaults();
        assert_eq!(c.categorize("El Congreso debate la nueva ley"), Category::Politics);
    }

    #[test]
    fn priority_politics_over_economic() {
        let c = Classifier::with_defaults();
        // Both "gobierno" and "impuesto" hit; politics wins.
        assert_eq!(c.categorize("gobierno sube el impuesto"), Category::Politics);
    }

    #[test]
    fn economic_and_social_and_general() {
        let c = Classifier::with_defaults();
        assert_eq!(c.categorize("sube el precio del dólar"), Category::Economic);
        assert_eq!(c.categorize("crisis en salud pública"), Category::Social);
        assert_eq!(c.categorize("eclipse lunar"), Category::General);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let c = Classifier::with_defaults();
        assert_eq!(c.categorize("EL CONGRESO"), Category::Politics);
    }

    #[test]
    fn sports_by_vocabulary_and_pattern() {
        let c = Classifier::with_defaults();
        assert!(c.is_sports_label("Golazo de Municipal"));
        assert!(c.is_sports_label("#TaylorArmy839K"));
        assert!(!c.is_sports_label("Congreso"));
    }
}
