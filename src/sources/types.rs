// src/sources/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A trending topic as the upstream API ships it: sometimes a bare string,
/// sometimes the richer object. Normalized to [`Trend`] at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTrend {
    Name(String),
    Rich {
        name: String,
        #[serde(default, rename = "tweetCount")]
        tweet_count: Option<String>,
        #[serde(default)]
        keywords: Vec<String>,
    },
}

/// Internal trend shape: always the rich form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub name: String,
    pub tweet_count: Option<String>,
    pub keywords: Vec<String>,
}

impl From<RawTrend> for Trend {
    fn from(raw: RawTrend) -> Self {
        match raw {
            RawTrend::Name(name) => Trend {
                name,
                tweet_count: None,
                keywords: Vec::new(),
            },
            RawTrend::Rich {
                name,
                tweet_count,
                keywords,
            } => Trend {
                name,
                tweet_count,
                keywords,
            },
        }
    }
}

/// One scraped post. The wire format uses the upstream Spanish field names;
/// `raw` keeps the original payload verbatim for the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    pub tweet_id: String,
    #[serde(rename = "usuario")]
    pub author: String,
    #[serde(rename = "texto")]
    pub text: String,
    #[serde(rename = "fecha")]
    pub raw_date: Option<String>,
    #[serde(rename = "enlace")]
    pub link: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub retweets: u64,
    #[serde(default)]
    pub replies: u64,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl SocialPost {
    pub fn engagement(&self) -> u64 {
        self.likes + self.retweets + self.replies
    }
}

/// Trending-topics collaborator. Empty Ok is a valid answer and must stay
/// distinguishable from a transport error.
#[async_trait::async_trait]
pub trait TrendSource: Send + Sync {
    async fn fetch_trends(&self, location: &str, limit: usize) -> Result<Vec<RawTrend>>;
    fn name(&self) -> &'static str;
}

/// Post-search collaborator. The query is a cleaned term, optionally already
/// expanded by the query builder (OR groups, `lang:`, `since:`).
#[async_trait::async_trait]
pub trait PostSearch: Send + Sync {
    async fn search_posts(
        &self,
        query: &str,
        location: &str,
        limit: usize,
    ) -> Result<Vec<SocialPost>>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_trend_deserializes_both_shapes() {
        let bare: RawTrend = serde_json::from_str(r##""#JusticiaYa""##).unwrap();
        let rich: RawTrend =
            serde_json::from_str(r#"{"name":"Congreso","tweetCount":"12K"}"#).unwrap();

        let bare = Trend::from(bare);
        assert_eq!(bare.name, "#JusticiaYa");
        assert!(bare.tweet_count.is_none());

        let rich = Trend::from(rich);
        assert_eq!(rich.name, "Congreso");
        assert_eq!(rich.tweet_count.as_deref(), Some("12K"));
    }

    #[test]
    fn post_deserializes_upstream_field_names() {
        let json = r#"{
            "tweet_id": "1931250420254380159",
            "usuario": "prensa_gt",
            "texto": "El Congreso aprueba la ley",
            "fecha": "2h",
            "enlace": "https://example.org/status/1",
            "likes": 10,
            "retweets": 3,
            "replies": 1,
            "verified": true
        }"#;
        let post: SocialPost = serde_json::from_str(json).unwrap();
        assert_eq!(post.author, "prensa_gt");
        assert_eq!(post.engagement(), 14);
        assert!(post.verified);
    }
}
