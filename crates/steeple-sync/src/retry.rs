//! Bounded retry runner
//!
//! Stand-in for the durable activity executor's retry boundary: retryable
//! adapter failures are attempted a fixed number of times with exponential
//! backoff, each attempt logged with its number. Business failures are
//! never retried.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use steeple_adapter::error::{AdapterError, AdapterResult};

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Run an operation up to `max_attempts` times.
///
/// Only errors reporting `is_retryable()` trigger another attempt; the
/// last error is returned unchanged when attempts run out.
pub async fn run_with_retries<T, F, Fut>(
    label: &str,
    max_attempts: u32,
    operation: F,
) -> AdapterResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AdapterResult<T>>,
{
    run_counted(label, max_attempts, operation).await.result
}

/// Outcome of a retried run, for callers that need the attempt count.
#[derive(Debug)]
pub struct Attempted<T> {
    /// The final result.
    pub result: AdapterResult<T>,
    /// Attempts consumed.
    pub attempts: u32,
}

/// Like [`run_with_retries`], but reports how many attempts were used.
pub async fn run_counted<T, F, Fut>(
    label: &str,
    max_attempts: u32,
    mut operation: F,
) -> Attempted<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AdapterResult<T>>,
{
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    attempts: attempt,
                }
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                warn!(label, attempt, max_attempts, error = %e, "attempt failed, retrying");
                sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            Err(e) => {
                warn!(label, attempt, max_attempts, error = %e, "attempt failed, giving up");
                return Attempted {
                    result: Err(e),
                    attempts: attempt,
                };
            }
        }
    }
}
