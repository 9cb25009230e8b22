// src/politics/mod.rs
//! Political-relevance scoring for scraped posts.
//!
//! A post earns points for keyword hits across the configured categories,
//! plus bonuses for a verified author and engagement volume. The score gates
//! the expensive entity-extraction call (see `deep`). Scoring is pure: no
//! I/O, no globals, testable without a live database.

pub mod deep;

use anyhow::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::sources::SocialPost;

pub const DEFAULT_POLITICS_CONFIG: &str = include_str!("../../config/politics.toml");
pub const ENV_POLITICS_CONFIG_PATH: &str = "POLITICS_CONFIG_PATH";

// Dev logging gate: PULSE_DEV_LOG=1 and a debug build.
fn dev_logging_enabled() -> bool {
    std::env::var("PULSE_DEV_LOG").ok().as_deref() == Some("1") && cfg!(debug_assertions)
}

// Short anonymized id for a post body. Never log raw text.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn dev_log_score(text: &str, analysis: &PoliticalAnalysis) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(text);
    let matched: Vec<&String> = analysis.matched_entities.iter().take(5).collect();
    tracing::info!(
        target: "politics",
        %id,
        score = analysis.relevance_score,
        political = analysis.is_political,
        matched = ?matched,
        "scored"
    );
}

/// Outcome of scoring one post. Computed fresh per post, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliticalAnalysis {
    pub is_political: bool,
    /// 0–10, clamped.
    pub relevance_score: u8,
    /// Category names that had at least one hit, in evaluation order.
    pub categories: Vec<String>,
    /// Every matched keyword, in evaluation order.
    pub matched_entities: Vec<String>,
}

impl PoliticalAnalysis {
    fn none() -> Self {
        Self {
            is_political: false,
            relevance_score: 0,
            categories: Vec::new(),
            matched_entities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoliticsConfig {
    pub scoring: ScoringWeights,
    pub thresholds: Thresholds,
    pub categories: Vec<KeywordCategory>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScoringWeights {
    pub keyword_hit: u32,
    pub verified_bonus: u32,
    pub engagement_mid_threshold: u64,
    pub engagement_mid_bonus: u32,
    pub engagement_high_threshold: u64,
    pub engagement_high_bonus: u32,
    pub max_score: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Thresholds {
    pub min_political_score: u32,
    pub deep_analysis_score: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordCategory {
    pub name: String,
    pub keywords: Vec<String>,
}

impl PoliticsConfig {
    /// Embedded defaults, or the file named by `POLITICS_CONFIG_PATH`.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(ENV_POLITICS_CONFIG_PATH) {
            let content = fs::read_to_string(PathBuf::from(&path))
                .map_err(|e| anyhow::anyhow!("reading politics config {path}: {e}"))?;
            return Self::from_toml_str(&content);
        }
        Self::from_toml_str(DEFAULT_POLITICS_CONFIG)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: PoliticsConfig = toml::from_str(s)?;
        for cat in &mut cfg.categories {
            for kw in &mut cat.keywords {
                *kw = kw.to_lowercase();
            }
        }
        Ok(cfg)
    }
}

static DEFAULT_CONFIG: Lazy<PoliticsConfig> = Lazy::new(|| {
    PoliticsConfig::from_toml_str(DEFAULT_POLITICS_CONFIG).expect("valid embedded politics config")
});

pub struct RelevanceScorer {
    cfg: PoliticsConfig,
}

impl RelevanceScorer {
    pub fn new(cfg: PoliticsConfig) -> Self {
        Self { cfg }
    }

    pub fn with_defaults() -> Self {
        Self {
            cfg: DEFAULT_CONFIG.clone(),
        }
    }

    pub fn config(&self) -> &PoliticsConfig {
        &self.cfg
    }

    /// True when the post's score clears the deep-analysis gate.
    pub fn wants_deep_analysis(&self, analysis: &PoliticalAnalysis) -> bool {
        analysis.is_political
            && u32::from(analysis.relevance_score) >= self.cfg.thresholds.deep_analysis_score
    }

    /// Score one post. Keyword hits mark it political and accumulate points;
    /// verification and engagement add bonuses; the clamped score below the
    /// suppression threshold forces `is_political` back to false.
    pub fn score(&self, post: &SocialPost) -> PoliticalAnalysis {
        let w = &self.cfg.scoring;
        let text = post.text.to_lowercase();

        let mut analysis = PoliticalAnalysis::none();
        let mut score: u32 = 0;

        for cat in &self.cfg.categories {
            let matches: Vec<&String> =
                cat.keywords.iter().filter(|kw| text.contains(kw.as_str())).collect();
            if matches.is_empty() {
                continue;
            }
            analysis.is_political = true;
            analysis.categories.push(cat.name.clone());
            score += w.keyword_hit * matches.len() as u32;
            analysis
                .matched_entities
                .extend(matches.into_iter().cloned());
        }

        if post.verified {
            score += w.verified_bonus;
        }

        let engagement = post.engagement();
        if engagement > w.engagement_mid_threshold {
            score += w.engagement_mid_bonus;
        }
        if engagement > w.engagement_high_threshold {
            score += w.engagement_high_bonus;
        }

        analysis.relevance_score = score.min(w.max_score) as u8;

        if u32::from(analysis.relevance_score) < self.cfg.thresholds.min_political_score {
            analysis.is_political = false;
        }

        dev_log_score(&post.text, &analysis);
        analysis
    }
}
