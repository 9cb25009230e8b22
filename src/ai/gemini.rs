// src/ai/gemini.rs
//! Gemini provider for the three analyst call shapes.
//!
//! Transport/HTTP failures surface as errors (callers decide how to degrade);
//! malformed bodies never do: they go through the tiered parser and come
//! back as defaults with a provenance tag.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::prompts;
use super::parser::{extract_sentiment_fields, parse_tiered, ParseProvenance};
use super::{AiAnalyst, PoliticalContext, SentimentAnalysis, TrendLabel};

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiAnalyst {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiAnalyst {
    /// Reads `GEMINI_API_KEY`; `model_override` defaults to gemini-1.5-flash.
    pub fn new(model_override: Option<&str>) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent("trend-pulse/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .context("gemini http client")?;
        Ok(Self {
            http,
            api_key,
            model: model_override.unwrap_or(DEFAULT_MODEL).to_string(),
        })
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(anyhow!("GEMINI_API_KEY is not set"));
        }
        let url = format!(
            "{API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let req = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                // Low temperature for consistent JSON.
                temperature: 0.1,
                max_output_tokens: max_tokens,
            },
        };
        let resp = self
            .http
            .post(&url)
            .json(&req)
            .send()
            .await
            .context("gemini request")?;
        if !resp.status().is_success() {
            return Err(anyhow!("gemini api error: {}", resp.status()));
        }
        let body: GenerateResponse = resp.json().await.context("gemini response json")?;
        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(anyhow!("gemini returned no candidates"));
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl AiAnalyst for GeminiAnalyst {
    async fn analyze_post(&self, text: &str) -> Result<SentimentAnalysis> {
        let prompt = prompts::sentiment_prompt(text);
        let raw = self.generate(&prompt, 500).await?;
        let parsed = parse_tiered(&raw, extract_sentiment_fields);
        if parsed.provenance != ParseProvenance::Structured {
            tracing::warn!(target: "ai", provider = "gemini", provenance = ?parsed.provenance, "degraded sentiment parse");
        }
        let mut value = parsed.value.clamped();
        value.provenance = parsed.provenance;
        Ok(value)
    }

    async fn classify_trends(&self, names: &[String]) -> Result<Vec<TrendLabel>> {
        let prompt = prompts::classify_prompt(names);
        let raw = self.generate(&prompt, 1000).await?;
        let parsed = parse_tiered::<Vec<TrendLabel>, _>(&raw, |_| None);
        if parsed.provenance == ParseProvenance::Default {
            return Err(anyhow!("gemini classification response had no usable JSON"));
        }
        Ok(parsed.value)
    }

    async fn extract_political_context(&self, text: &str, trend: &str) -> Result<PoliticalContext> {
        let prompt = prompts::context_prompt(text, trend);
        let raw = self.generate(&prompt, 1000).await?;
        let parsed = parse_tiered::<PoliticalContext, _>(&raw, |_| None);
        if parsed.provenance != ParseProvenance::Structured {
            tracing::warn!(target: "ai", provider = "gemini", provenance = ?parsed.provenance, "degraded context parse");
        }
        Ok(parsed.value)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
