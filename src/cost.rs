// src/cost.rs
//! Advisory spend guard for paid AI calls.
//!
//! Tracks calls-per-minute, calls-per-day and running dollar cost against
//! configured ceilings. Purely advisory: it answers yes/no and lets the
//! caller decide whether to wait, skip, or abort. Windows are fixed
//! wall-clock spans reset lazily on each check, not sliding windows and not
//! background timers. State is process-local and starts cold every run.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

const MINUTE_MS: u64 = 60_000;
const DAY_MS: u64 = 86_400_000;

/// Ceilings and pricing. Env overrides keep deployments tunable without a
/// rebuild; the defaults mirror observed production settings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CostConfig {
    /// Estimated USD per token (gpt-4o-mini class pricing).
    pub usd_per_token: f64,
    /// Hard ceiling for a single call's estimated cost.
    pub max_cost_per_call_usd: f64,
    pub max_calls_per_minute: u32,
    pub max_daily_cost_usd: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            usd_per_token: 0.000002,
            max_cost_per_call_usd: 0.01,
            max_calls_per_minute: 10,
            max_daily_cost_usd: 5.0,
        }
    }
}

impl CostConfig {
    /// Defaults with optional env overrides (`COST_USD_PER_TOKEN`,
    /// `COST_MAX_PER_CALL_USD`, `COST_MAX_CALLS_PER_MINUTE`,
    /// `COST_MAX_DAILY_USD`). Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_f64("COST_USD_PER_TOKEN") {
            cfg.usd_per_token = v;
        }
        if let Some(v) = env_f64("COST_MAX_PER_CALL_USD") {
            cfg.max_cost_per_call_usd = v;
        }
        if let Some(v) = std::env::var("COST_MAX_CALLS_PER_MINUTE")
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            cfg.max_calls_per_minute = v;
        }
        if let Some(v) = env_f64("COST_MAX_DAILY_USD") {
            cfg.max_daily_cost_usd = v;
        }
        cfg
    }
}

fn env_f64(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Machine-readable refusal causes, in rejection precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The single call's estimate already exceeds the per-call ceiling.
    PerCallLimit,
    /// This minute's call budget is spent; waiting may help.
    MinuteLimit,
    /// The daily budget would be exceeded; waiting won't help today.
    DailyLimit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostDecision {
    pub allowed: bool,
    pub reason: Option<RejectReason>,
}

impl CostDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }
    fn reject(reason: RejectReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Usage after recording one call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub cost_usd: f64,
    pub daily_cost_usd: f64,
    pub calls_today: u32,
}

#[derive(Debug, Clone, Copy)]
struct UsageLedger {
    calls_this_minute: u32,
    total_calls_today: u32,
    daily_cost_usd: f64,
    last_minute_reset_ms: u64,
    last_daily_reset_ms: u64,
}

pub struct CostTracker {
    cfg: CostConfig,
    ledger: Mutex<UsageLedger>,
}

impl CostTracker {
    pub fn new(cfg: CostConfig) -> Self {
        let now = now_ms();
        Self {
            cfg,
            ledger: Mutex::new(UsageLedger {
                calls_this_minute: 0,
                total_calls_today: 0,
                daily_cost_usd: 0.0,
                last_minute_reset_ms: now,
                last_daily_reset_ms: now,
            }),
        }
    }

    pub fn config(&self) -> &CostConfig {
        &self.cfg
    }

    pub fn can_proceed(&self, estimated_tokens: u64) -> CostDecision {
        self.can_proceed_at(estimated_tokens, now_ms())
    }

    /// Window math with an explicit clock, so tests can drive rollovers.
    pub fn can_proceed_at(&self, estimated_tokens: u64, now_ms: u64) -> CostDecision {
        let mut ledger = self.ledger.lock().expect("cost ledger poisoned");
        roll_windows(&mut ledger, now_ms);

        let estimated_cost = estimated_tokens as f64 * self.cfg.usd_per_token;

        if estimated_cost > self.cfg.max_cost_per_call_usd {
            return CostDecision::reject(RejectReason::PerCallLimit);
        }
        if ledger.calls_this_minute >= self.cfg.max_calls_per_minute {
            return CostDecision::reject(RejectReason::MinuteLimit);
        }
        if ledger.daily_cost_usd + estimated_cost > self.cfg.max_daily_cost_usd {
            return CostDecision::reject(RejectReason::DailyLimit);
        }
        CostDecision::allow()
    }

    pub fn record(&self, actual_tokens: u64) -> UsageSnapshot {
        self.record_at(actual_tokens, now_ms())
    }

    pub fn record_at(&self, actual_tokens: u64, now_ms: u64) -> UsageSnapshot {
        let mut ledger = self.ledger.lock().expect("cost ledger poisoned");
        roll_windows(&mut ledger, now_ms);

        let cost_usd = actual_tokens as f64 * self.cfg.usd_per_token;
        ledger.calls_this_minute += 1;
        ledger.total_calls_today += 1;
        ledger.daily_cost_usd += cost_usd;

        metrics::counter!("ai_calls_total").increment(1);
        metrics::counter!("ai_tokens_total").increment(actual_tokens);

        UsageSnapshot {
            cost_usd,
            daily_cost_usd: ledger.daily_cost_usd,
            calls_today: ledger.total_calls_today,
        }
    }
}

fn roll_windows(ledger: &mut UsageLedger, now_ms: u64) {
    if now_ms.saturating_sub(ledger.last_minute_reset_ms) > MINUTE_MS {
        ledger.calls_this_minute = 0;
        ledger.last_minute_reset_ms = now_ms;
    }
    if now_ms.saturating_sub(ledger.last_daily_reset_ms) > DAY_MS {
        ledger.total_calls_today = 0;
        ledger.daily_cost_usd = 0.0;
        ledger.last_daily_reset_ms = now_ms;
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> CostTracker {
        CostTracker::new(CostConfig::default())
    }

    #[test]
    fn allows_within_all_ceilings() {
        let t = tracker();
        let d = t.can_proceed_at(500, 1_000);
        assert!(d.allowed);
        assert!(d.reason.is_none());
    }

    #[test]
    fn per_call_ceiling_wins_over_everything() {
        let cfg = CostConfig {
            max_cost_per_call_usd: 0.000001,
            max_calls_per_minute: 0, // would also reject, but per-call checks first
            ..CostConfig::default()
        };
        let t = CostTracker::new(cfg);
        let d = t.can_proceed_at(1_000, 1_000);
        assert_eq!(d.reason, Some(RejectReason::PerCallLimit));
    }

    #[test]
    fn minute_ceiling_resets_after_a_minute() {
        let cfg = CostConfig {
            max_calls_per_minute: 2,
            ..CostConfig::default()
        };
        let t = CostTracker::new(cfg);
        let start = now_ms();

        t.record_at(100, start);
        t.record_at(100, start + 1);
        let d = t.can_proceed_at(100, start + 2);
        assert_eq!(d.reason, Some(RejectReason::MinuteLimit));

        // 60_000 ms is not enough ("more than" a minute), 60_001 is.
        let d = t.can_proceed_at(100, start + MINUTE_MS);
        assert_eq!(d.reason, Some(RejectReason::MinuteLimit));
        let d = t.can_proceed_at(100, start + MINUTE_MS + 1);
        assert!(d.allowed);
    }

    #[test]
    fn daily_ceiling_rejects_any_positive_estimate_once_reached() {
        let cfg = CostConfig {
            usd_per_token: 0.001,
            max_cost_per_call_usd: 10.0,
            max_calls_per_minute: 1_000,
            max_daily_cost_usd: 1.0,
        };
        let t = CostTracker::new(cfg);
        let start = now_ms();

        // Push the daily cost to exactly the ceiling.
        let snap = t.record_at(1_000, start);
        assert!((snap.daily_cost_usd - 1.0).abs() < 1e-9);

        let d = t.can_proceed_at(1, start + 1);
        assert_eq!(d.reason, Some(RejectReason::DailyLimit));

        // The day rolling over clears it.
        let d = t.can_proceed_at(1, start + DAY_MS + 1);
        assert!(d.allowed);
    }

    #[test]
    fn record_accumulates_cost_and_calls() {
        let t = tracker();
        let start = now_ms();
        let a = t.record_at(1_000, start);
        let b = t.record_at(2_000, start + 10);
        assert_eq!(b.calls_today, 2);
        assert!(b.daily_cost_usd > a.daily_cost_usd);
        assert!((b.cost_usd - 0.004).abs() < 1e-9);
    }
}
