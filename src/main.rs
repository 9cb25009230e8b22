//! Cron driver: one pipeline run per invocation.
//!
//! Wires collaborators from the environment, runs the pipeline once, prints
//! the per-unit outcome counts, and exits non-zero only when the trending
//! source was unreachable at startup. Persistence here is the in-memory
//! store; the hosted database adapter lives with the deployment, not in
//! this crate.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_pulse::ai::{gemini::GeminiAnalyst, keyword::KeywordAnalyst, openai::OpenAiAnalyst};
use trend_pulse::classify::ClassifierConfig;
use trend_pulse::pipeline::{run_once, Collaborators, RunConfig, RunContext};
use trend_pulse::politics::PoliticsConfig;
use trend_pulse::sources::http::ScraperClient;
use trend_pulse::{Classifier, CostConfig, CostTracker, DisabledAnalyst, MemoryStore, RelevanceScorer};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trend_pulse=info,pipeline=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn build_analyst() -> Result<Arc<dyn trend_pulse::AiAnalyst>> {
    let provider = std::env::var("PULSE_AI_PROVIDER").unwrap_or_default();
    Ok(match provider.to_lowercase().as_str() {
        "gemini" => Arc::new(GeminiAnalyst::new(None)?),
        "openai" => Arc::new(OpenAiAnalyst::new(None)?),
        "keyword" => Arc::new(KeywordAnalyst::new()),
        _ => Arc::new(DisabledAnalyst),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = RunConfig::from_env();
    let base_url =
        std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());

    let scraper = Arc::new(ScraperClient::new(base_url, None)?);
    let analyst = build_analyst()?;
    tracing::info!(
        location = %cfg.location,
        provider = analyst.name(),
        concurrency = cfg.concurrency,
        "starting run"
    );

    // Config files are embedded defaults unless *_CONFIG_PATH points elsewhere.
    let ctx = RunContext {
        cfg,
        classifier: Arc::new(Classifier::new(ClassifierConfig::load()?)),
        scorer: Arc::new(RelevanceScorer::new(PoliticsConfig::load()?)),
        cost: Arc::new(CostTracker::new(CostConfig::from_env())),
    };
    let collab = Collaborators {
        trends: scraper.clone(),
        posts: scraper,
        analyst,
        store: Arc::new(MemoryStore::new()),
    };

    let stats = run_once(&ctx, &collab).await?;

    println!("run complete in {:.2}s", stats.elapsed_secs);
    println!(
        "  trends: {} total, {} selected, {} rejected, {} failed",
        stats.trends_total, stats.trends_selected, stats.trends_rejected, stats.trends_failed
    );
    println!(
        "  posts: {} seen, {} saved, {} duplicates",
        stats.posts_seen, stats.posts_saved, stats.posts_duplicate
    );
    println!(
        "  political: {} posts, {} deep analyses",
        stats.political_posts, stats.deep_analyses
    );
    println!("  unit errors: {}", stats.unit_errors);

    Ok(())
}
