//! Retry executor for ledger operations.

use std::future::Future;

use reelpay_core::{LedgerError, RetryPolicy};
use tracing::warn;

/// Runs `attempt` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up.
///
/// Each call of `attempt` must be a complete unit of work (its own database
/// transaction), so re-running it after a rollback is safe.
///
/// # Errors
///
/// Returns the last error produced by `attempt`.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut attempt: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let mut attempt_no = 1;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if policy.should_retry(attempt_no, &err) => {
                let delay = policy.delay_for(attempt_no);
                warn!(
                    operation,
                    attempt = attempt_no,
                    ?delay,
                    error = %err,
                    "Transient store failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt_no += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
