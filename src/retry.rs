// src/retry.rs
//! Bounded retry for outbound fetches.
//!
//! The scraping service routinely answers 200-with-nothing while a page
//! renders upstream, so an empty result retries exactly like a transport
//! failure. Exhaustion is asymmetric on purpose: a final transport error is
//! re-raised, a final empty result comes back as an empty collection.
//! Callers must treat both as failure signals.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delays_ms: Vec<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delays_ms: vec![500, 1_000, 2_000],
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: usize) -> Duration {
        let ms = self
            .delays_ms
            .get(attempt)
            .or(self.delays_ms.last())
            .copied()
            .unwrap_or(500);
        Duration::from_millis(ms)
    }
}

/// Run `op` until it yields a non-empty collection, retrying through the
/// policy's delay schedule on errors and on empty results.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<Vec<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut last_err: Option<anyhow::Error> = None;

    for attempt in 0..policy.max_attempts {
        match op().await {
            Ok(items) if !items.is_empty() => return Ok(items),
            Ok(_) => {
                tracing::debug!(target: "retry", attempt, "empty result, retrying");
                last_err = None;
            }
            Err(e) => {
                tracing::debug!(target: "retry", attempt, error = ?e, "attempt failed");
                last_err = Some(e);
            }
        }
        if attempt + 1 < policy.max_attempts {
            tokio::time::sleep(policy.delay_for(attempt)).await;
        }
    }

    match last_err {
        Some(e) => Err(e),
        None => Ok(Vec::new()),
    }
}
