//! Bounded polling with exponential backoff and jitter.
//!
//! Used after a product copy: the copy completes asynchronously on the remote
//! side, so the copied product is probed until it becomes visible or the
//! attempt budget is spent.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Polling policy.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Maximum probes (minimum 1).
    pub max_attempts: u32,
    /// Delay before the first probe; doubles per attempt.
    pub base_delay: Duration,
    /// Maximum delay between probes.
    pub max_delay: Duration,
    /// Jitter factor (0.0-1.0) applied to delay.
    pub jitter: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(20),
            jitter: 0.2,
        }
    }
}

impl PollPolicy {
    /// Calculate backoff delay for a given attempt (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let base_secs = self.base_delay.as_secs_f64();
        let max_secs = self.max_delay.as_secs_f64().max(0.0);

        let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1)) as f64;
        let mut delay = (base_secs * multiplier).min(max_secs);

        if self.jitter > 0.0 && delay > 0.0 {
            let jitter = (fastrand::f64() * 2.0 - 1.0) * self.jitter;
            delay = (delay * (1.0 + jitter)).max(0.0);
        }

        Duration::from_secs_f64(delay)
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Same attempt budget with no waiting, for catalogs where writes are
    /// visible at once.
    pub fn without_delay(&self) -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: 0.0,
            ..self.clone()
        }
    }
}

/// Result of a poll that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready { value: T, attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Wait, probe, repeat until `probe` yields `Some` or attempts run out.
///
/// Probe errors are returned immediately; only "not visible yet" is retried.
pub async fn poll_until_ready<F, Fut, T, E>(
    what: &str,
    policy: &PollPolicy,
    mut probe: F,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let max_attempts = policy.attempts();

    for attempt in 1..=max_attempts {
        let delay = policy.backoff_delay(attempt);
        debug!(
            what,
            attempt,
            max_attempts,
            delay_secs = delay.as_secs_f64(),
            "Waiting before visibility probe"
        );
        sleep(delay).await;

        if let Some(value) = probe().await? {
            info!(what, attempt, "Resource became visible");
            return Ok(PollOutcome::Ready {
                value,
                attempts: attempt,
            });
        }
    }

    warn!(what, max_attempts, "Resource still not visible after polling");
    Ok(PollOutcome::Exhausted {
        attempts: max_attempts,
    })
}
