// src/ai/openai.rs
//! OpenAI provider (Chat Completions). Requires `OPENAI_API_KEY`.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::parser::{extract_sentiment_fields, parse_tiered, ParseProvenance};
use super::{AiAnalyst, PoliticalContext, SentimentAnalysis, TrendLabel};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiAnalyst {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: String,
}

impl OpenAiAnalyst {
    /// `model_override`: pass Some("gpt-4o") to override; defaults to gpt-4o-mini.
    pub fn new(model_override: Option<&str>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent("trend-pulse/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .context("openai http client")?;
        Ok(Self {
            http,
            api_key,
            model: model_override.unwrap_or(DEFAULT_MODEL).to_string(),
        })
    }

    async fn chat(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(anyhow!("OPENAI_API_KEY is not set"));
        }
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.3,
            max_tokens,
        };
        let resp = self
            .http
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("openai request")?;
        if !resp.status().is_success() {
            return Err(anyhow!("openai api error: {}", resp.status()));
        }
        let body: Resp = resp.json().await.context("openai response json")?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(anyhow!("openai returned no choices"));
        }
        Ok(content)
    }
}

const SYSTEM_ANALYST: &str = "Eres un experto en análisis de sentimiento y comunicación digital para el contexto guatemalteco. Responde únicamente con JSON válido.";

#[async_trait::async_trait]
impl AiAnalyst for OpenAiAnalyst {
    async fn analyze_post(&self, text: &str) -> Result<SentimentAnalysis> {
        let user = super::prompts::sentiment_prompt(text);
        let raw = self.chat(SYSTEM_ANALYST, &user, 500).await?;
        let parsed = parse_tiered(&raw, extract_sentiment_fields);
        if parsed.provenance != ParseProvenance::Structured {
            tracing::warn!(target: "ai", provider = "openai", provenance = ?parsed.provenance, "degraded sentiment parse");
        }
        let mut value = parsed.value.clamped();
        value.provenance = parsed.provenance;
        Ok(value)
    }

    async fn classify_trends(&self, names: &[String]) -> Result<Vec<TrendLabel>> {
        let user = super::prompts::classify_prompt(names);
        let raw = self.chat(SYSTEM_ANALYST, &user, 1000).await?;
        let parsed = parse_tiered::<Vec<TrendLabel>, _>(&raw, |_| None);
        if parsed.provenance == ParseProvenance::Default {
            return Err(anyhow!("openai classification response had no usable JSON"));
        }
        Ok(parsed.value)
    }

    async fn extract_political_context(&self, text: &str, trend: &str) -> Result<PoliticalContext> {
        let user = super::prompts::context_prompt(text, trend);
        let raw = self.chat(SYSTEM_ANALYST, &user, 1000).await?;
        let parsed = parse_tiered::<PoliticalContext, _>(&raw, |_| None);
        if parsed.provenance != ParseProvenance::Structured {
            tracing::warn!(target: "ai", provider = "openai", provenance = ?parsed.provenance, "degraded context parse");
        }
        Ok(parsed.value)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
