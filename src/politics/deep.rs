// src/politics/deep.rs
//! Deep political-context extraction, gated by the relevance score.
//!
//! The extraction call is the expensive half of the analysis. It only runs
//! for posts that clear the configured gate, and it can only *add* data:
//! any failure (provider error, refused budget) collapses to the empty
//! context while the relevance score and category tags survive.

use crate::ai::{AiAnalyst, PoliticalContext};
use crate::cost::CostTracker;
use crate::sources::SocialPost;

use super::{PoliticalAnalysis, RelevanceScorer};

/// Run the deep extraction when the score clears the gate and the cost guard
/// allows the call. Returns the empty context otherwise; never an error.
pub async fn extract_if_relevant(
    scorer: &RelevanceScorer,
    analyst: &dyn AiAnalyst,
    cost: &CostTracker,
    post: &SocialPost,
    analysis: &PoliticalAnalysis,
    trend: &str,
) -> PoliticalContext {
    if !scorer.wants_deep_analysis(analysis) {
        return PoliticalContext::default();
    }

    let estimated = crate::ai::approx_tokens(&post.text) + 400; // prompt + response headroom
    let decision = cost.can_proceed(estimated);
    if !decision.allowed {
        tracing::info!(
            target: "politics",
            reason = ?decision.reason,
            tweet_id = %post.tweet_id,
            "deep analysis skipped by cost guard"
        );
        return PoliticalContext::default();
    }

    match analyst.extract_political_context(&post.text, trend).await {
        Ok(ctx) => {
            cost.record(estimated);
            ctx
        }
        Err(e) => {
            tracing::warn!(
                target: "politics",
                error = ?e,
                tweet_id = %post.tweet_id,
                "deep analysis failed, keeping score without context"
            );
            PoliticalContext::default()
        }
    }
}
