// src/ai/mod.rs
//! AI-analysis collaborator: provider abstraction + response contracts.
//!
//! Three call shapes: per-post sentiment analysis, single-batch trend
//! classification, and deep political-context extraction. Providers are
//! swappable by configuration (Gemini, OpenAI, local keyword fallback);
//! every implementation must degrade to the documented default structures
//! at this boundary instead of letting malformed responses escape.

pub mod gemini;
pub mod keyword;
pub mod openai;
pub mod parser;
pub mod prompts;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use parser::{parse_tiered, ParseProvenance, Parsed};

// ------------------------------------------------------------
// Response contracts
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Informative,
    Opinion,
    Humor,
    Alarmist,
    Critical,
    Promotional,
    Conversational,
    Protest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionedEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub context: String,
}

/// Single-post analysis result. Defaults are the documented fallback shape:
/// neutral, zero score/confidence, informative intent, nothing extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    /// Polarity in [-1, 1].
    pub score: f32,
    /// Model confidence in [0, 1].
    pub confidence: f32,
    #[serde(default)]
    pub emotions: Vec<String>,
    #[serde(alias = "communicativeIntent")]
    pub intent: Intent,
    #[serde(default, alias = "mentionedEntities")]
    pub entities: Vec<MentionedEntity>,
    /// Which parse stage produced this (see `parser`).
    #[serde(skip)]
    pub provenance: ParseProvenance,
}

impl SentimentAnalysis {
    /// Clamp numeric fields into their documented ranges.
    pub fn clamped(mut self) -> Self {
        self.score = self.score.clamp(-1.0, 1.0);
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }
}

impl Default for SentimentAnalysis {
    fn default() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            score: 0.0,
            confidence: 0.0,
            emotions: Vec::new(),
            intent: Intent::Informative,
            entities: Vec::new(),
            provenance: ParseProvenance::Default,
        }
    }
}

/// One label from the batch trend classification call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendLabel {
    pub index: usize,
    pub name: String,
    pub category: String,
}

/// Deep extraction for a high-relevance political post. All-empty on any
/// provider failure so the relevance score is never lost with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliticalContext {
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub figures: Vec<Figure>,
    #[serde(default)]
    pub social_usernames: Vec<String>,
    #[serde(default)]
    pub laws_decrees: Vec<LawDecree>,
    #[serde(default)]
    pub news_events: Vec<NewsEvent>,
    #[serde(default)]
    pub nicknames_detected: Vec<Nickname>,
}

impl PoliticalContext {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self.figures.is_empty()
            && self.social_usernames.is_empty()
            && self.laws_decrees.is_empty()
            && self.news_events.is_empty()
            && self.nicknames_detected.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figure {
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawDecree {
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub event: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nickname {
    pub nickname: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

// ------------------------------------------------------------
// Provider abstraction
// ------------------------------------------------------------

/// Rough token estimate for cost projection: ~4 chars per token.
pub fn approx_tokens(s: &str) -> u64 {
    (s.chars().count() as u64 + 3) / 4
}

#[async_trait::async_trait]
pub trait AiAnalyst: Send + Sync {
    /// Sentiment/intent/entity analysis for one post body.
    async fn analyze_post(&self, text: &str) -> Result<SentimentAnalysis>;

    /// One batch call labeling every trend name with a topic category.
    async fn classify_trends(&self, names: &[String]) -> Result<Vec<TrendLabel>>;

    /// Deep political-context extraction for a high-relevance post.
    async fn extract_political_context(&self, text: &str, trend: &str) -> Result<PoliticalContext>;

    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynAnalyst = Arc<dyn AiAnalyst>;

/// Always answers with the fallback structures; used when AI is disabled.
pub struct DisabledAnalyst;

#[async_trait::async_trait]
impl AiAnalyst for DisabledAnalyst {
    async fn analyze_post(&self, _text: &str) -> Result<SentimentAnalysis> {
        Ok(SentimentAnalysis::default())
    }

    async fn classify_trends(&self, names: &[String]) -> Result<Vec<TrendLabel>> {
        Ok(names
            .iter()
            .enumerate()
            .map(|(index, name)| TrendLabel {
                index,
                name: name.clone(),
                category: "general".to_string(),
            })
            .collect())
    }

    async fn extract_political_context(
        &self,
        _text: &str,
        _trend: &str,
    ) -> Result<PoliticalContext> {
        Ok(PoliticalContext::default())
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_tokens_rounds_up() {
        assert_eq!(approx_tokens(""), 0);
        assert_eq!(approx_tokens("abcd"), 1);
        assert_eq!(approx_tokens("abcde"), 2);
    }

    #[tokio::test]
    async fn disabled_analyst_returns_defaults() {
        let a = DisabledAnalyst;
        let s = a.analyze_post("whatever").await.unwrap();
        assert_eq!(s.sentiment, Sentiment::Neutral);
        assert_eq!(s.provenance, ParseProvenance::Default);

        let labels = a
            .classify_trends(&["uno".to_string(), "dos".to_string()])
            .await
            .unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1].index, 1);

        assert!(a
            .extract_political_context("t", "tr")
            .await
            .unwrap()
            .is_empty());
    }
}
