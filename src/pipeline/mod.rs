// src/pipeline/mod.rs
//! One full fetch→clean→classify→score→store run.
//!
//! Each trend is an independent unit of work keyed by post id, so the batch
//! is commutative: a bounded number of trends are in flight at once and
//! completion order does not matter. Per-unit failures are counted and the
//! batch continues; only a failed *first* trending fetch aborts the run.

pub mod config;

pub use config::RunConfig;

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::ai::{approx_tokens, AiAnalyst, SentimentAnalysis};
use crate::classify::{balance, sports, Classifier};
use crate::cost::CostTracker;
use crate::politics::{deep, RelevanceScorer};
use crate::query;
use crate::retry::with_retry;
use crate::sources::{normalize_posts, normalize_trends, PostSearch, SocialPost, Trend, TrendSource};
use crate::store::{PostStore, StoredPost};
use crate::{dates, normalize};

/// One-time metrics registration (so series show up wherever they're exported).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pulse_trends_total", "Trends returned by the source.");
        describe_counter!("pulse_trends_rejected_total", "Trends rejected by cleaning.");
        describe_counter!("pulse_posts_kept_total", "Posts stored or refreshed.");
        describe_counter!("pulse_posts_duplicate_total", "Posts skipped as duplicates.");
        describe_counter!("pulse_political_posts_total", "Posts scored as political.");
        describe_counter!("pulse_deep_analyses_total", "Deep extraction calls issued.");
        describe_counter!("pulse_unit_errors_total", "Per-unit failures (run continued).");
        describe_counter!("ai_calls_total", "Paid analyst calls recorded.");
        describe_counter!("ai_tokens_total", "Tokens recorded against the budget.");
        describe_gauge!("pulse_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Everything a run needs besides the collaborators. Built once per process
/// and threaded explicitly, no module-level singletons.
pub struct RunContext {
    pub cfg: RunConfig,
    pub classifier: Arc<Classifier>,
    pub scorer: Arc<RelevanceScorer>,
    pub cost: Arc<CostTracker>,
}

/// The external services a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub trends: Arc<dyn TrendSource>,
    pub posts: Arc<dyn PostSearch>,
    pub analyst: Arc<dyn AiAnalyst>,
    pub store: Arc<dyn PostStore>,
}

/// Per-run outcome counts, reported to the operator at the end.
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub trends_total: usize,
    pub trends_selected: usize,
    pub trends_rejected: usize,
    pub trends_failed: usize,
    pub posts_seen: usize,
    pub posts_saved: usize,
    pub posts_duplicate: usize,
    pub political_posts: usize,
    pub deep_analyses: usize,
    pub unit_errors: usize,
    pub elapsed_secs: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct TrendStats {
    posts_seen: usize,
    posts_saved: usize,
    posts_duplicate: usize,
    political_posts: usize,
    deep_analyses: usize,
    unit_errors: usize,
}

/// Run the pipeline once. Fatal only when the trending source fails the very
/// first call; everything after that degrades per unit.
pub async fn run_once(ctx: &RunContext, collab: &Collaborators) -> Result<RunStats> {
    ensure_metrics_described();
    let started = std::time::Instant::now();

    let raw = collab
        .trends
        .fetch_trends(&ctx.cfg.location, ctx.cfg.trend_limit)
        .await
        .context("trending source unreachable")?;
    let trends = normalize_trends(raw);

    let mut stats = RunStats {
        trends_total: trends.len(),
        ..RunStats::default()
    };
    counter!("pulse_trends_total").increment(trends.len() as u64);

    if trends.is_empty() {
        tracing::warn!(target: "pipeline", "no trends returned, nothing to do");
        stats.elapsed_secs = started.elapsed().as_secs_f64();
        return Ok(stats);
    }

    let analyst_for_labels: Option<&dyn AiAnalyst> = if ctx.cfg.ai_classification {
        Some(collab.analyst.as_ref())
    } else {
        None
    };
    let labels = sports::label_trends(&ctx.classifier, analyst_for_labels, &trends).await;
    let labeled: Vec<(Trend, _)> = trends.into_iter().zip(labels).collect();
    let selected = balance(labeled, &ctx.classifier.config().balance);
    stats.trends_selected = selected.len();

    let semaphore = Arc::new(Semaphore::new(ctx.cfg.concurrency.max(1)));
    let seen: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));

    let mut join_set: JoinSet<TrendStats> = JoinSet::new();
    for (trend, classification) in selected {
        let semaphore = semaphore.clone();
        let seen = seen.clone();
        let collab = collab.clone();
        let cfg = ctx.cfg.clone();
        let scorer = ctx.scorer.clone();
        let cost = ctx.cost.clone();

        let Some(term) = normalize::clean_trend(&trend.name) else {
            tracing::info!(target: "pipeline", trend = %trend.name, "rejected after cleaning");
            counter!("pulse_trends_rejected_total").increment(1);
            stats.trends_rejected += 1;
            continue;
        };

        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            process_trend(
                &cfg, &scorer, &cost, &collab, &seen, &trend, classification, &term,
            )
            .await
        });
    }

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(t) => {
                stats.posts_seen += t.posts_seen;
                stats.posts_saved += t.posts_saved;
                stats.posts_duplicate += t.posts_duplicate;
                stats.political_posts += t.political_posts;
                stats.deep_analyses += t.deep_analyses;
                stats.unit_errors += t.unit_errors;
                if t.unit_errors > 0 && t.posts_saved == 0 {
                    stats.trends_failed += 1;
                }
            }
            Err(e) => {
                tracing::warn!(target: "pipeline", error = ?e, "trend task panicked");
                stats.trends_failed += 1;
                stats.unit_errors += 1;
            }
        }
    }

    stats.elapsed_secs = started.elapsed().as_secs_f64();
    gauge!("pulse_last_run_ts").set(Utc::now().timestamp().max(0) as f64);
    tracing::info!(
        target: "pipeline",
        trends = stats.trends_total,
        selected = stats.trends_selected,
        saved = stats.posts_saved,
        political = stats.political_posts,
        errors = stats.unit_errors,
        elapsed_secs = stats.elapsed_secs,
        "run complete"
    );
    Ok(stats)
}

#[allow(clippy::too_many_arguments)]
async fn process_trend(
    cfg: &RunConfig,
    scorer: &RelevanceScorer,
    cost: &CostTracker,
    collab: &Collaborators,
    seen: &Mutex<HashSet<String>>,
    trend: &Trend,
    classification: crate::classify::ClassificationResult,
    term: &str,
) -> TrendStats {
    let mut stats = TrendStats::default();

    let query = if cfg.broaden_search {
        let mut terms = vec![term.to_string()];
        terms.extend(trend.keywords.iter().cloned());
        query::build_context_query(&terms, &cfg.lang, cfg.days_back)
    } else {
        term.to_string()
    };

    let posts = match with_retry(&cfg.retry, || {
        collab
            .posts
            .search_posts(&query, &cfg.location, cfg.posts_per_trend)
    })
    .await
    {
        Ok(posts) => normalize_posts(posts),
        Err(e) => {
            tracing::warn!(target: "pipeline", trend = %term, error = ?e, "search failed after retries");
            counter!("pulse_unit_errors_total").increment(1);
            stats.unit_errors += 1;
            return stats;
        }
    };

    if posts.is_empty() {
        tracing::info!(target: "pipeline", trend = %term, "no posts found");
        return stats;
    }

    for post in posts {
        stats.posts_seen += 1;

        {
            let mut guard = seen.lock().expect("seen set poisoned");
            if !guard.insert(post.tweet_id.clone()) {
                stats.posts_duplicate += 1;
                counter!("pulse_posts_duplicate_total").increment(1);
                continue;
            }
        }

        match process_post(cfg, scorer, cost, collab, trend, classification.category, term, &post)
            .await
        {
            Ok(outcome) => {
                if outcome.saved {
                    stats.posts_saved += 1;
                    counter!("pulse_posts_kept_total").increment(1);
                } else {
                    stats.posts_duplicate += 1;
                    counter!("pulse_posts_duplicate_total").increment(1);
                }
                if outcome.political {
                    stats.political_posts += 1;
                    counter!("pulse_political_posts_total").increment(1);
                }
                if outcome.deep_analysis {
                    stats.deep_analyses += 1;
                    counter!("pulse_deep_analyses_total").increment(1);
                }
            }
            Err(e) => {
                tracing::warn!(target: "pipeline", trend = %term, tweet_id = %post.tweet_id, error = ?e, "post failed");
                counter!("pulse_unit_errors_total").increment(1);
                stats.unit_errors += 1;
            }
        }
    }

    stats
}

struct PostOutcome {
    saved: bool,
    political: bool,
    deep_analysis: bool,
}

#[allow(clippy::too_many_arguments)]
async fn process_post(
    cfg: &RunConfig,
    scorer: &RelevanceScorer,
    cost: &CostTracker,
    collab: &Collaborators,
    trend: &Trend,
    category: crate::classify::Category,
    term: &str,
    post: &SocialPost,
) -> Result<PostOutcome> {
    if cfg.insert_only && collab.store.exists(&post.tweet_id).await? {
        return Ok(PostOutcome {
            saved: false,
            political: false,
            deep_analysis: false,
        });
    }

    let posted_at = dates::resolve(post.raw_date.as_deref(), Some(&post.tweet_id));
    let political = scorer.score(post);

    let sentiment = analyze_sentiment(cost, collab.analyst.as_ref(), post).await;

    let mut deep_analysis = false;
    if scorer.wants_deep_analysis(&political) {
        let context = deep::extract_if_relevant(
            scorer,
            collab.analyst.as_ref(),
            cost,
            post,
            &political,
            term,
        )
        .await;
        if !context.is_empty() {
            deep_analysis = true;
            tracing::info!(
                target: "politics",
                tweet_id = %post.tweet_id,
                score = political.relevance_score,
                figures = context.figures.len(),
                entities = context.entities.len(),
                "political context extracted"
            );
        }
    }

    let record = StoredPost {
        tweet_id: post.tweet_id.clone(),
        trend_original: trend.name.clone(),
        trend_clean: term.to_string(),
        category,
        author: post.author.clone(),
        text: post.text.clone(),
        link: post.link.clone(),
        posted_at,
        captured_at: Utc::now(),
        likes: post.likes,
        retweets: post.retweets,
        replies: post.replies,
        verified: post.verified,
        location: cfg.location.clone(),
        sentiment: Some(sentiment),
        political: Some(political.clone()),
        raw: post.raw.clone(),
    };
    collab.store.upsert(record).await.context("store upsert")?;

    Ok(PostOutcome {
        saved: true,
        political: political.is_political,
        deep_analysis,
    })
}

/// Sentiment with the cost guard in front: a refused budget or a failed
/// provider both produce the documented default structure.
async fn analyze_sentiment(
    cost: &CostTracker,
    analyst: &dyn AiAnalyst,
    post: &SocialPost,
) -> SentimentAnalysis {
    let estimated = approx_tokens(&post.text) + 500;
    let decision = cost.can_proceed(estimated);
    if !decision.allowed {
        tracing::info!(
            target: "ai",
            reason = ?decision.reason,
            tweet_id = %post.tweet_id,
            "sentiment call refused by cost guard"
        );
        return SentimentAnalysis::default();
    }
    match analyst.analyze_post(&post.text).await {
        Ok(s) => {
            cost.record(estimated);
            s
        }
        Err(e) => {
            tracing::warn!(target: "ai", tweet_id = %post.tweet_id, error = ?e, "sentiment analysis failed");
            SentimentAnalysis::default()
        }
    }
}
