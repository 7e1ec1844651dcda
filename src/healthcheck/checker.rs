use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// Health checker trait for services
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Check if the service is healthy
    async fn check(&self) -> Result<bool>;

    /// Timeout of a single check
    fn timeout(&self) -> Duration;

    /// What is being checked, for log lines
    fn target(&self) -> String;
}

/// Outcome of polling a checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Healthy { attempts: u32 },
    TimedOut { attempts: u32 },
    Cancelled,
}

/// Poll `checker` every `interval` until it reports healthy, `deadline`
/// passes, or `cancel` fires.
///
/// The interval is fixed. A check that errors counts as unhealthy.
pub async fn poll_until_healthy<C: HealthChecker + ?Sized>(
    checker: &C,
    interval: Duration,
    deadline: Duration,
    cancel: &CancellationToken,
) -> PollOutcome {
    let give_up_at = Instant::now() + deadline;
    let mut attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }
        attempts += 1;
        let healthy = tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            result = checker.check() => matches!(result, Ok(true)),
        };
        if healthy {
            return PollOutcome::Healthy { attempts };
        }
        tracing::trace!("{} not ready (attempt {})", checker.target(), attempts);

        let now = Instant::now();
        if now >= give_up_at {
            return PollOutcome::TimedOut { attempts };
        }
        let pause = interval.min(give_up_at - now);
        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = sleep(pause) => {}
        }
    }
}
