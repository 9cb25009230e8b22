// tests/pipeline_e2e.rs
// Full pipeline run against mock collaborators: trends in, records out,
// per-unit failures tolerated, duplicates collapsed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use trend_pulse::ai::{PoliticalContext, SentimentAnalysis, TrendLabel};
use trend_pulse::pipeline::{run_once, Collaborators, RunConfig, RunContext};
use trend_pulse::retry::RetryPolicy;
use trend_pulse::sources::{PostSearch, RawTrend, SocialPost, TrendSource};
use trend_pulse::{
    AiAnalyst, Classifier, CostConfig, CostTracker, MemoryStore, RelevanceScorer,
};

// ---- mocks -------------------------------------------------------------

struct FixedTrendSource {
    trends: Vec<RawTrend>,
    fail: bool,
}

#[async_trait]
impl TrendSource for FixedTrendSource {
    async fn fetch_trends(&self, _location: &str, _limit: usize) -> Result<Vec<RawTrend>> {
        if self.fail {
            return Err(anyhow!("503 from trending endpoint"));
        }
        Ok(self.trends.clone())
    }
    fn name(&self) -> &'static str {
        "fixed-trends"
    }
}

struct ScriptedSearch {
    calls: AtomicUsize,
}

fn post(id: &str, author: &str, text: &str, likes: u64, verified: bool) -> SocialPost {
    SocialPost {
        tweet_id: id.to_string(),
        author: author.to_string(),
        text: text.to_string(),
        raw_date: Some("2h".to_string()),
        link: Some(format!("https://example.org/status/{id}")),
        likes,
        retweets: 0,
        replies: 0,
        verified,
        raw: serde_json::json!({"tweet_id": id}),
    }
}

#[async_trait]
impl PostSearch for ScriptedSearch {
    async fn search_posts(
        &self,
        query: &str,
        _location: &str,
        _limit: usize,
    ) -> Result<Vec<SocialPost>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match query {
            q if q.contains("Congreso") => Ok(vec![
                post(
                    "101",
                    "prensa_gt",
                    "El congreso aprueba la reforma; el presidente y el fiscal reaccionan",
                    800,
                    true,
                ),
                // Same post surfaces under two trends; must be stored once.
                post("300", "vecino", "qué buen clima hace hoy", 2, false),
            ]),
            q if q.contains("Clima") => Ok(vec![
                post("300", "vecino", "qué buen clima hace hoy", 2, false),
            ]),
            q if q.contains("falla") => Err(anyhow!("search endpoint down")),
            _ => Ok(Vec::new()),
        }
    }
    fn name(&self) -> &'static str {
        "scripted-search"
    }
}

struct CountingAnalyst {
    sentiment_calls: AtomicUsize,
    context_calls: AtomicUsize,
}

#[async_trait]
impl AiAnalyst for CountingAnalyst {
    async fn analyze_post(&self, _text: &str) -> Result<SentimentAnalysis> {
        self.sentiment_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SentimentAnalysis::default())
    }
    async fn classify_trends(&self, _names: &[String]) -> Result<Vec<TrendLabel>> {
        Err(anyhow!("not used in this test"))
    }
    async fn extract_political_context(&self, _t: &str, _tr: &str) -> Result<PoliticalContext> {
        self.context_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PoliticalContext {
            entities: vec!["congreso".to_string()],
            ..PoliticalContext::default()
        })
    }
    fn name(&self) -> &'static str {
        "counting"
    }
}

fn fast_cfg() -> RunConfig {
    RunConfig {
        retry: RetryPolicy {
            max_attempts: 2,
            delays_ms: vec![1, 1],
        },
        ..RunConfig::default()
    }
}

fn ctx_with(cfg: RunConfig) -> RunContext {
    RunContext {
        cfg,
        classifier: Arc::new(Classifier::with_defaults()),
        scorer: Arc::new(RelevanceScorer::with_defaults()),
        cost: Arc::new(CostTracker::new(CostConfig::default())),
    }
}

// ---- tests -------------------------------------------------------------

#[tokio::test]
async fn run_stores_analyzed_posts_and_survives_unit_failures() {
    let store = Arc::new(MemoryStore::new());
    let analyst = Arc::new(CountingAnalyst {
        sentiment_calls: AtomicUsize::new(0),
        context_calls: AtomicUsize::new(0),
    });
    let collab = Collaborators {
        trends: Arc::new(FixedTrendSource {
            // Four interesting trends plus filler so the rebalancer runs at
            // full targets and keeps all four in the selection.
            trends: {
                let mut t = vec![
                    RawTrend::Name("1. Congreso (12K)".to_string()),
                    RawTrend::Name("Clima hoy".to_string()),
                    RawTrend::Name("falla total".to_string()),
                    RawTrend::Name("x".to_string()), // rejected by cleaning
                ];
                t.extend((0..11).map(|i| RawTrend::Name(format!("relleno {i}"))));
                t
            },
            fail: false,
        }),
        posts: Arc::new(ScriptedSearch {
            calls: AtomicUsize::new(0),
        }),
        analyst: analyst.clone(),
        store: store.clone(),
    };

    let stats = run_once(&ctx_with(fast_cfg()), &collab).await.unwrap();

    assert_eq!(stats.trends_total, 15);
    assert_eq!(stats.trends_selected, 10);
    assert_eq!(stats.trends_rejected, 1);
    // "falla total" exhausted retries; run continued.
    assert_eq!(stats.trends_failed, 1);
    assert!(stats.unit_errors >= 1);

    // Posts 101 + 300 stored once each; the duplicate 300 skipped.
    assert_eq!(store.len(), 2);
    assert_eq!(stats.posts_saved, 2);
    assert_eq!(stats.posts_duplicate, 1);

    let political = store.get("101").expect("political post stored");
    let analysis = political.political.expect("analysis attached");
    assert!(analysis.is_political);
    assert!(analysis.relevance_score >= 5);
    assert_eq!(stats.political_posts, 1);
    // High-relevance post triggered exactly one deep extraction.
    assert_eq!(analyst.context_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stats.deep_analyses, 1);

    // Every stored post got a sentiment call (budget allowed both).
    assert_eq!(analyst.sentiment_calls.load(Ordering::SeqCst), 2);

    let mundane = store.get("300").expect("non-political post stored");
    assert!(!mundane.political.unwrap().is_political);

    // Trend metadata landed on the record.
    assert_eq!(political.trend_clean, "Congreso");
    assert_eq!(political.trend_original, "1. Congreso (12K)");
}

#[tokio::test]
async fn unreachable_trending_source_is_fatal() {
    let collab = Collaborators {
        trends: Arc::new(FixedTrendSource {
            trends: Vec::new(),
            fail: true,
        }),
        posts: Arc::new(ScriptedSearch {
            calls: AtomicUsize::new(0),
        }),
        analyst: Arc::new(CountingAnalyst {
            sentiment_calls: AtomicUsize::new(0),
            context_calls: AtomicUsize::new(0),
        }),
        store: Arc::new(MemoryStore::new()),
    };

    let err = run_once(&ctx_with(fast_cfg()), &collab).await.unwrap_err();
    assert!(err.to_string().contains("trending source unreachable"));
}

#[tokio::test]
async fn empty_trend_list_is_a_clean_noop() {
    let store = Arc::new(MemoryStore::new());
    let collab = Collaborators {
        trends: Arc::new(FixedTrendSource {
            trends: Vec::new(),
            fail: false,
        }),
        posts: Arc::new(ScriptedSearch {
            calls: AtomicUsize::new(0),
        }),
        analyst: Arc::new(CountingAnalyst {
            sentiment_calls: AtomicUsize::new(0),
            context_calls: AtomicUsize::new(0),
        }),
        store: store.clone(),
    };

    let stats = run_once(&ctx_with(fast_cfg()), &collab).await.unwrap();
    assert_eq!(stats.trends_total, 0);
    assert_eq!(stats.posts_saved, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn exhausted_budget_still_stores_posts_with_default_sentiment() {
    let store = Arc::new(MemoryStore::new());
    let analyst = Arc::new(CountingAnalyst {
        sentiment_calls: AtomicUsize::new(0),
        context_calls: AtomicUsize::new(0),
    });
    let collab = Collaborators {
        trends: Arc::new(FixedTrendSource {
            trends: vec![RawTrend::Name("Congreso".to_string())],
            fail: false,
        }),
        posts: Arc::new(ScriptedSearch {
            calls: AtomicUsize::new(0),
        }),
        analyst: analyst.clone(),
        store: store.clone(),
    };

    let mut ctx = ctx_with(fast_cfg());
    ctx.cost = Arc::new(CostTracker::new(CostConfig {
        max_daily_cost_usd: 0.0,
        ..CostConfig::default()
    }));

    let stats = run_once(&ctx, &collab).await.unwrap();

    // No paid calls went out, but the records still landed with defaults.
    assert_eq!(analyst.sentiment_calls.load(Ordering::SeqCst), 0);
    assert_eq!(analyst.context_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stats.posts_saved, 2);
    let rec = store.get("101").unwrap();
    let sentiment = rec.sentiment.unwrap();
    assert_eq!(sentiment, SentimentAnalysis::default());
}
