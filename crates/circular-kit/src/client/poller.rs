//! Outcome polling.
//!
//! Re-queries a transaction until it reaches a terminal status or a single
//! deadline, measured from the start of the wait, passes. A failed query is
//! not retried: it ends the wait with that error.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tracing::debug;

use crate::error::Error;
use crate::types::Outcome;

/// Timing for [`Account::wait_for_outcome`](crate::Account::wait_for_outcome).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Overall bound on the wait.
    pub timeout: Duration,
    /// Delay between queries. Must be non-zero.
    pub interval: Duration,
}

impl PollConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

    /// Create a validated configuration.
    pub fn new(timeout: Duration, interval: Duration) -> Result<Self, Error> {
        let config = Self { timeout, interval };
        config.validate()?;
        Ok(config)
    }

    /// Shorthand for whole-second timings.
    pub fn from_secs(timeout_secs: u64, interval_secs: u64) -> Result<Self, Error> {
        Self::new(
            Duration::from_secs(timeout_secs),
            Duration::from_secs(interval_secs),
        )
    }

    /// Reject configurations that would spin.
    pub fn validate(&self) -> Result<(), Error> {
        if self.interval.is_zero() {
            return Err(Error::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            interval: Self::DEFAULT_INTERVAL,
        }
    }
}

/// Run `query` until it yields a terminal [`Outcome`].
///
/// The first query is issued immediately, then one per `interval`. No query
/// is started once the deadline has passed; the wait then fails with
/// [`Error::Timeout`].
pub async fn poll_until_terminal<F, Fut>(
    tx_id: &str,
    config: &PollConfig,
    mut query: F,
) -> Result<Outcome, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Outcome, Error>>,
{
    config.validate()?;

    // A timeout too large to represent means no deadline.
    let deadline = Instant::now().checked_add(config.timeout);
    let timed_out = || Error::Timeout {
        tx_id: tx_id.to_string(),
        timeout: config.timeout,
    };

    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let outcome = query().await?;
        debug!(tx_id, attempt, status = %outcome.status, "polled transaction outcome");

        if outcome.is_terminal() {
            return Ok(outcome);
        }

        let now = Instant::now();
        if deadline.is_some_and(|deadline| now >= deadline) {
            return Err(timed_out());
        }
        let wake = match (now.checked_add(config.interval), deadline) {
            (Some(next), Some(deadline)) => Some(next.min(deadline)),
            (next, None) => next,
            (None, deadline) => deadline,
        };
        match wake {
            Some(wake) => sleep_until(wake).await,
            None => std::future::pending::<()>().await,
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(timed_out());
        }
    }
}
