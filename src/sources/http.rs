// src/sources/http.rs
//! HTTP client for the scraping service (trending + post search endpoints).
//!
//! The service wraps everything in a `{status, ...}` envelope; `status` other
//! than "success" on the trending endpoint is an error (the caller treats a
//! failed first trending fetch as fatal), while a successful envelope with no
//! posts is a valid empty result.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::time::Duration;

use super::types::{PostSearch, RawTrend, SocialPost, TrendSource};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct ScraperClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TrendingEnvelope {
    status: String,
    #[serde(default)]
    trends: Vec<RawTrend>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    status: String,
    #[serde(default, rename = "tweets")]
    posts: Vec<SocialPost>,
}

impl ScraperClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: Option<u64>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("trend-pulse/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(
                timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()
            .context("building scraper http client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl TrendSource for ScraperClient {
    async fn fetch_trends(&self, location: &str, limit: usize) -> Result<Vec<RawTrend>> {
        let url = format!(
            "{}/trending?location={}&limit={}",
            self.base_url,
            urlencode(location),
            limit
        );
        let resp = self.http.get(&url).send().await.context("trending request")?;
        if !resp.status().is_success() {
            return Err(anyhow!("trending endpoint returned {}", resp.status()));
        }
        let body: TrendingEnvelope = resp.json().await.context("trending json")?;
        if body.status != "success" {
            return Err(anyhow!(
                "trending endpoint status {:?}: {}",
                body.status,
                body.message.unwrap_or_default()
            ));
        }
        Ok(body.trends)
    }

    fn name(&self) -> &'static str {
        "scraper-trending"
    }
}

#[async_trait::async_trait]
impl PostSearch for ScraperClient {
    async fn search_posts(
        &self,
        query: &str,
        location: &str,
        limit: usize,
    ) -> Result<Vec<SocialPost>> {
        let url = format!(
            "{}/nitter_context?q={}&location={}&limit={}",
            self.base_url,
            urlencode(query),
            urlencode(location),
            limit
        );
        let resp = self.http.get(&url).send().await.context("search request")?;
        if !resp.status().is_success() {
            return Err(anyhow!("search endpoint returned {}", resp.status()));
        }
        let body: SearchEnvelope = resp.json().await.context("search json")?;
        if body.status != "success" {
            // Treated as "no results" rather than transport failure; the retry
            // wrapper handles empty results on its own terms.
            return Ok(Vec::new());
        }
        Ok(body.posts)
    }

    fn name(&self) -> &'static str {
        "scraper-search"
    }
}

/// Minimal percent-encoding for query values; avoids pulling in a url crate
/// for two parameters.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => {
                use std::fmt::Write as _;
                let _ = write!(&mut out, "%{:02X}", b);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_escapes_spaces_and_unicode() {
        assert_eq!(urlencode("la ley"), "la%20ley");
        assert_eq!(urlencode("Arévalo"), "Ar%C3%A9valo");
        assert_eq!(urlencode("lang:es"), "lang%3Aes");
    }

    #[test]
    fn search_envelope_tolerates_missing_posts() {
        let body: SearchEnvelope = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert_eq!(body.status, "error");
        assert!(body.posts.is_empty());
    }
}
