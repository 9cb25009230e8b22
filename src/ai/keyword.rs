// src/ai/keyword.rs
//! Keyword-fallback analyst: last rung of the provider ladder.
//!
//! When no remote provider is configured (or budget is exhausted for the
//! day), this local analyst keeps the pipeline producing the same shapes:
//! lexicon-scored sentiment with simple negation handling, vocabulary-based
//! trend labels, and an honest empty political context.

use anyhow::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::classify::Classifier;

use super::{
    AiAnalyst, Intent, ParseProvenance, PoliticalContext, Sentiment, SentimentAnalysis, TrendLabel,
};

static LEXICON: Lazy<HashMap<&'static str, i32>> = Lazy::new(|| {
    HashMap::from([
        // positive
        ("bueno", 1),
        ("buena", 1),
        ("excelente", 2),
        ("logro", 1),
        ("avance", 1),
        ("apoyo", 1),
        ("justicia", 1),
        ("transparencia", 1),
        ("esperanza", 1),
        ("celebra", 1),
        ("aprueba", 1),
        ("gana", 1),
        // negative
        ("malo", -1),
        ("mala", -1),
        ("corrupto", -2),
        ("corrupcion", -2),
        ("corrupción", -2),
        ("crisis", -1),
        ("escandalo", -2),
        ("escándalo", -2),
        ("fraude", -2),
        ("impunidad", -2),
        ("violencia", -2),
        ("rechaza", -1),
        ("denuncia", -1),
        ("vergüenza", -2),
        ("miedo", -1),
        ("pierde", -1),
    ])
});

fn is_negator(tok: &str) -> bool {
    matches!(tok, "no" | "nunca" | "jamás" | "jamas" | "ni" | "sin" | "tampoco")
}

fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// Lexicon score with 1..=3-token negation lookback, mirroring the classic
/// rule-based scorer this provider replaces.
pub fn lexicon_score(text: &str) -> (i32, usize) {
    let tokens: Vec<String> = tokenize(text).collect();
    let mut score = 0;
    for i in 0..tokens.len() {
        let base = *LEXICON.get(tokens[i].as_str()).unwrap_or(&0);
        if base != 0 {
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            score += if negated { -base } else { base };
        }
    }
    (score, tokens.len())
}

pub struct KeywordAnalyst {
    classifier: Classifier,
}

impl KeywordAnalyst {
    pub fn new() -> Self {
        Self {
            classifier: Classifier::with_defaults(),
        }
    }
}

impl Default for KeywordAnalyst {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AiAnalyst for KeywordAnalyst {
    async fn analyze_post(&self, text: &str) -> Result<SentimentAnalysis> {
        let (raw, token_count) = lexicon_score(text);
        let sentiment = match raw {
            s if s > 0 => Sentiment::Positive,
            s if s < 0 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        };
        // Normalize the integer score into [-1, 1]; confidence grows with
        // how much of the text the lexicon actually saw.
        let score = (raw as f32 / 4.0).clamp(-1.0, 1.0);
        let confidence = if token_count == 0 {
            0.0
        } else {
            (raw.unsigned_abs() as f32 / token_count as f32).clamp(0.0, 0.6)
        };
        Ok(SentimentAnalysis {
            sentiment,
            score,
            confidence,
            emotions: Vec::new(),
            intent: Intent::Informative,
            entities: Vec::new(),
            provenance: ParseProvenance::Extracted,
        })
    }

    async fn classify_trends(&self, names: &[String]) -> Result<Vec<TrendLabel>> {
        Ok(names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let category = if self.classifier.is_sports_label(name) {
                    "deportes".to_string()
                } else {
                    format!("{:?}", self.classifier.categorize(name)).to_lowercase()
                };
                TrendLabel {
                    index,
                    name: name.clone(),
                    category,
                }
            })
            .collect())
    }

    async fn extract_political_context(
        &self,
        _text: &str,
        _trend: &str,
    ) -> Result<PoliticalContext> {
        // No local extraction: an empty context is more honest than a guess.
        Ok(PoliticalContext::default())
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn negative_words_drive_negative_sentiment() {
        let a = KeywordAnalyst::new();
        let s = a
            .analyze_post("El escándalo de corrupción indigna al país")
            .await
            .unwrap();
        assert_eq!(s.sentiment, Sentiment::Negative);
        assert!(s.score < 0.0);
        assert_eq!(s.provenance, ParseProvenance::Extracted);
    }

    #[tokio::test]
    async fn negation_flips_polarity() {
        let a = KeywordAnalyst::new();
        let plain = a.analyze_post("esto es bueno").await.unwrap();
        let negated = a.analyze_post("esto no es bueno").await.unwrap();
        assert_eq!(plain.sentiment, Sentiment::Positive);
        assert_eq!(negated.sentiment, Sentiment::Negative);
    }

    #[tokio::test]
    async fn classify_marks_sports_trends() {
        let a = KeywordAnalyst::new();
        let labels = a
            .classify_trends(&["Golazo de Municipal".to_string(), "Congreso".to_string()])
            .await
            .unwrap();
        assert_eq!(labels[0].category, "deportes");
        assert_eq!(labels[1].category, "politics");
    }
}
