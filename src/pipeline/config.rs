// src/pipeline/config.rs
//! Run configuration for the driver. Environment variables override the
//! defaults; unparseable values fall back silently (a cron job must not die
//! on a typo'd env var).

use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Country/region passed to the trending and search endpoints.
    pub location: String,
    /// Trends requested from the trending endpoint.
    pub trend_limit: usize,
    /// Posts requested per trend.
    pub posts_per_trend: usize,
    /// Concurrent in-flight trends (semaphore width).
    pub concurrency: usize,
    /// `true`: skip posts that already exist. `false`: upsert and refresh.
    pub insert_only: bool,
    /// Use the AI analyst for the sports/non-sports batch labeling.
    pub ai_classification: bool,
    /// Expand each search into an OR-group query with lang/since filters.
    pub broaden_search: bool,
    /// Days-back window for the `since:` filter when broadening.
    pub days_back: i64,
    /// Language filter for broadened queries.
    pub lang: String,
    pub retry: RetryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            location: "guatemala".to_string(),
            trend_limit: 15,
            posts_per_trend: 15,
            concurrency: 4,
            insert_only: false,
            ai_classification: false,
            broaden_search: false,
            days_back: 3,
            lang: "es".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl RunConfig {
    /// Defaults with `PULSE_*` env overrides.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("PULSE_LOCATION") {
            if !v.trim().is_empty() {
                cfg.location = v.trim().to_string();
            }
        }
        if let Some(v) = env_usize("PULSE_TREND_LIMIT") {
            cfg.trend_limit = v;
        }
        if let Some(v) = env_usize("PULSE_POSTS_PER_TREND") {
            cfg.posts_per_trend = v;
        }
        if let Some(v) = env_usize("PULSE_CONCURRENCY") {
            cfg.concurrency = v.clamp(1, 16);
        }
        cfg.insert_only = env_flag("PULSE_INSERT_ONLY");
        cfg.ai_classification = env_flag("PULSE_AI_CLASSIFICATION");
        cfg.broaden_search = env_flag("PULSE_BROADEN_SEARCH");
        if let Some(v) = env_usize("PULSE_DAYS_BACK") {
            cfg.days_back = v as i64;
        }
        if let Ok(v) = std::env::var("PULSE_LANG") {
            if !v.trim().is_empty() {
                cfg.lang = v.trim().to_string();
            }
        }
        cfg
    }
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().as_deref() == Some("1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_overrides_apply_and_bad_values_fall_back() {
        std::env::set_var("PULSE_LOCATION", "honduras");
        std::env::set_var("PULSE_CONCURRENCY", "not-a-number");
        std::env::set_var("PULSE_TREND_LIMIT", "25");
        let cfg = RunConfig::from_env();
        assert_eq!(cfg.location, "honduras");
        assert_eq!(cfg.concurrency, 4);
        assert_eq!(cfg.trend_limit, 25);
        std::env::remove_var("PULSE_LOCATION");
        std::env::remove_var("PULSE_CONCURRENCY");
        std::env::remove_var("PULSE_TREND_LIMIT");
    }
}
