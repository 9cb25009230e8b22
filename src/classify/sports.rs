// src/classify/sports.rs
//! Sports labeling and list rebalancing.
//!
//! The trending feed skews heavily toward football on match days; downstream
//! analysis wants a bounded slice of sports plus the rest. Labeling is either
//! the local vocabulary heuristic or one batch call to the AI analyst; the
//! rebalancer then caps each partition.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::ai::AiAnalyst;
use crate::sources::Trend;

use super::{Classifier, ClassificationResult, ConfidenceSource};

static RE_HASHTAG_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#\w+?\d+[KMB]$").expect("hashtag count regex"));

/// Fan-army shape: a hashtag with a follower count glued on.
pub fn hashtag_with_count(label: &str) -> bool {
    RE_HASHTAG_COUNT.is_match(label.trim())
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BalanceTargets {
    pub max_sports: usize,
    pub max_non_sports: usize,
}

impl BalanceTargets {
    /// Targets scaled down proportionally when fewer trends arrived than the
    /// combined target, so a thin feed still yields a mixed output.
    pub fn scaled_for(&self, available: usize) -> BalanceTargets {
        let total = self.max_sports + self.max_non_sports;
        if total == 0 || available >= total {
            return *self;
        }
        let sports = (available * self.max_sports + total / 2) / total;
        BalanceTargets {
            max_sports: sports,
            max_non_sports: available.saturating_sub(sports),
        }
    }
}

/// Label every trend. One batch AI call when an analyst is supplied; any AI
/// failure degrades to "everything non-sports" rather than aborting the run.
pub async fn label_trends(
    classifier: &Classifier,
    analyst: Option<&dyn AiAnalyst>,
    trends: &[Trend],
) -> Vec<ClassificationResult> {
    if let Some(analyst) = analyst {
        let names: Vec<String> = trends.iter().map(|t| t.name.clone()).collect();
        match analyst.classify_trends(&names).await {
            Ok(labels) => {
                let mut sports = vec![false; trends.len()];
                for label in labels {
                    if let Some(slot) = sports.get_mut(label.index) {
                        *slot = is_sports_category(&label.category);
                    }
                }
                return trends
                    .iter()
                    .zip(sports)
                    .map(|(t, is_sports)| ClassificationResult {
                        category: classifier.categorize(&t.name),
                        is_sports,
                        confidence_source: ConfidenceSource::Ai,
                    })
                    .collect();
            }
            Err(e) => {
                tracing::warn!(target: "classify", error = ?e, "batch classification failed, labeling all non-sports");
                return trends
                    .iter()
                    .map(|t| ClassificationResult {
                        category: classifier.categorize(&t.name),
                        is_sports: false,
                        confidence_source: ConfidenceSource::Keyword,
                    })
                    .collect();
            }
        }
    }

    trends
        .iter()
        .map(|t| ClassificationResult {
            category: classifier.categorize(&t.name),
            is_sports: classifier.is_sports_label(&t.name),
            confidence_source: ConfidenceSource::Keyword,
        })
        .collect()
}

fn is_sports_category(category: &str) -> bool {
    let c = category.trim().to_lowercase();
    c == "deportes" || c == "sports" || c == "deporte"
}

/// Cap and reorder a labeled trend list: non-sports first, then sports, each
/// partition truncated to its (possibly scaled) target. Input order is kept
/// within each partition.
pub fn balance(
    items: Vec<(Trend, ClassificationResult)>,
    targets: &BalanceTargets,
) -> Vec<(Trend, ClassificationResult)> {
    let targets = targets.scaled_for(items.len());
    let (sports, non_sports): (Vec<_>, Vec<_>) =
        items.into_iter().partition(|(_, c)| c.is_sports);

    let mut out: Vec<(Trend, ClassificationResult)> =
        non_sports.into_iter().take(targets.max_non_sports).collect();
    out.extend(sports.into_iter().take(targets.max_sports));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Category;

    fn trend(name: &str) -> Trend {
        Trend {
            name: name.to_string(),
            tweet_count: None,
            keywords: Vec::new(),
        }
    }

    fn labeled(name: &str, is_sports: bool) -> (Trend, ClassificationResult) {
        (
            trend(name),
            ClassificationResult {
                category: Category::General,
                is_sports,
                confidence_source: ConfidenceSource::Keyword,
            },
        )
    }

    #[test]
    fn full_volume_caps_to_ten_plus_five() {
        let mut items = Vec::new();
        for i in 0..8 {
            items.push(labeled(&format!("sports-{i}"), true));
        }
        for i in 0..42 {
            items.push(labeled(&format!("news-{i}"), false));
        }
        let targets = BalanceTargets {
            max_sports: 5,
            max_non_sports: 10,
        };
        let out = balance(items, &targets);
        assert_eq!(out.len(), 15);
        assert!(out[..10].iter().all(|(_, c)| !c.is_sports));
        assert!(out[10..].iter().all(|(_, c)| c.is_sports));
        // Order within each partition is preserved.
        assert_eq!(out[0].0.name, "news-0");
        assert_eq!(out[10].0.name, "sports-0");
    }

    #[test]
    fn thin_feed_scales_targets_proportionally() {
        let targets = BalanceTargets {
            max_sports: 5,
            max_non_sports: 10,
        };
        let scaled = targets.scaled_for(10);
        assert_eq!(scaled.max_sports, 3);
        assert_eq!(scaled.max_non_sports, 7);

        let mut items = Vec::new();
        for i in 0..5 {
            items.push(labeled(&format!("s{i}"), true));
        }
        for i in 0..5 {
            items.push(labeled(&format!("n{i}"), false));
        }
        let out = balance(items, &targets);
        assert_eq!(out.len(), 8); // 5 non-sports available (< 7) + 3 sports
    }

    #[test]
    fn hashtag_count_pattern() {
        assert!(hashtag_with_count("#TaylorArmy839K"));
        assert!(hashtag_with_count("#fans12m"));
        assert!(!hashtag_with_count("#JusticiaYa"));
        assert!(!hashtag_with_count("Taylor839K"));
    }
}
