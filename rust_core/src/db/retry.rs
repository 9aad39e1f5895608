//! Retry with exponential backoff for transient alias-store failures.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Backoff schedule for store operations.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, used by tests and callers that retry on their own schedule
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// Run `f` until it succeeds, fails with a non-transient error, or the
/// attempts run out.
///
/// # Example
/// ```ignore
/// let rows = execute_with_retry(&RetryPolicy::default(), "load team_aliases", || async {
///     sqlx::query("SELECT ...").fetch_all(&pool).await
/// })
/// .await?;
/// ```
pub async fn execute_with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation: &str,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && is_retriable(&e.to_string()) => {
                let backoff = policy.backoff(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {}ms",
                    operation,
                    attempt,
                    max_attempts,
                    e,
                    backoff.as_millis()
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Whether an error message describes a transient connection-level failure.
pub fn is_retriable(message: &str) -> bool {
    let message = message.to_lowercase();
    [
        "connection",
        "timeout",
        "timed out",
        "broken pipe",
        "could not serialize",
        "deadlock detected",
        "too many clients",
        "server closed the connection",
        "pool timed out",
        "network error",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}
