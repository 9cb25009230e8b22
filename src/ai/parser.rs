// src/ai/parser.rs
//! Tiered parsing for model responses.
//!
//! Models wrap JSON in prose, code fences, or leave trailing commas. Instead
//! of a silent regex guess, parsing is an explicit chain (structured parse,
//! sanitizing re-parse, field-level extraction, all-default) and every
//! result carries the stage that produced it, so callers can log degraded
//! parses and tests can assert on them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use super::{Sentiment, SentimentAnalysis};

static RE_CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fence regex"));
static RE_TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("trailing comma regex"));
static RE_SENTIMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""sentiment"\s*:\s*"(positive|negative|neutral)""#).expect("sentiment regex")
});
static RE_SCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""score"\s*:\s*(-?\d+(?:\.\d+)?)"#).expect("score regex"));
static RE_CONFIDENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""confidence"\s*:\s*(\d+(?:\.\d+)?)"#).expect("confidence regex"));

/// Which stage of the chain produced a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseProvenance {
    /// Clean structured parse of the raw response.
    Structured,
    /// Parsed after stripping fences / trailing commas / surrounding prose.
    Sanitized,
    /// Individual fields pulled out by regex; the rest are defaults.
    Extracted,
    /// Nothing was recoverable.
    #[default]
    Default,
}

#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub value: T,
    pub provenance: ParseProvenance,
}

/// Run the chain for any JSON-shaped contract. `extract` is the optional
/// stage-three field scraper; pass `|_| None` when there is no sensible
/// per-field recovery.
pub fn parse_tiered<T, F>(raw: &str, extract: F) -> Parsed<T>
where
    T: DeserializeOwned + Default,
    F: Fn(&str) -> Option<T>,
{
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Parsed {
            value,
            provenance: ParseProvenance::Structured,
        };
    }

    if let Some(clean) = sanitize_json(trimmed) {
        if let Ok(value) = serde_json::from_str::<T>(&clean) {
            return Parsed {
                value,
                provenance: ParseProvenance::Sanitized,
            };
        }
    }

    if let Some(value) = extract(trimmed) {
        return Parsed {
            value,
            provenance: ParseProvenance::Extracted,
        };
    }

    Parsed {
        value: T::default(),
        provenance: ParseProvenance::Default,
    }
}

/// Best-effort cleanup: unwrap a code fence, cut to the outermost `{...}`
/// (or `[...]` for array contracts), drop trailing commas.
fn sanitize_json(raw: &str) -> Option<String> {
    let mut s = raw.to_string();

    if let Some(caps) = RE_CODE_FENCE.captures(&s) {
        s = caps[1].to_string();
    }

    let obj = s.find('{');
    let arr = s.find('[');
    let (start, close) = match (obj, arr) {
        (Some(o), Some(a)) if a < o => (a, ']'),
        (Some(o), _) => (o, '}'),
        (None, Some(a)) => (a, ']'),
        (None, None) => return None,
    };
    let end = s.rfind(close)?;
    if end <= start {
        return None;
    }
    s = s[start..=end].to_string();

    s = RE_TRAILING_COMMA.replace_all(&s, "$1").to_string();
    Some(s)
}

/// Stage-three scraper for the sentiment contract: recover the three scalar
/// fields when the surrounding JSON is beyond repair.
pub fn extract_sentiment_fields(raw: &str) -> Option<SentimentAnalysis> {
    let sentiment = RE_SENTIMENT.captures(raw).map(|c| match &c[1] {
        "positive" => Sentiment::Positive,
        "negative" => Sentiment::Negative,
        _ => Sentiment::Neutral,
    })?;

    let mut out = SentimentAnalysis {
        sentiment,
        ..SentimentAnalysis::default()
    };
    if let Some(c) = RE_SCORE.captures(raw) {
        if let Ok(v) = c[1].parse::<f32>() {
            out.score = v;
        }
    }
    if let Some(c) = RE_CONFIDENCE.captures(raw) {
        if let Ok(v) = c[1].parse::<f32>() {
            out.confidence = v;
        }
    }
    Some(out.clamped())
}
