//! Exponential backoff with jitter: `delay_k = base *
//! 2^k * U[0.5, 1.5]`, capped at `max_delay`, retried up to `max_attempts`
//! times. Only `TransientStorage` is retried; any other error class
//! short-circuits immediately — see `WqError::is_retryable`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use wq_core::WqError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, base: Duration::from_millis(50), max_delay: Duration::from_secs(5) }
    }
}

static JITTER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A jitter factor in `[0.5, 1.5)`. Avoids pulling in a dedicated `rand`
/// dependency for one call site: mixes a monotonic counter with the
/// current time's sub-second nanoseconds, which is plenty of entropy for
/// spreading out retry attempts across concurrent workers.
fn jitter_factor() -> f64 {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.subsec_nanos() as u64).unwrap_or(0);
    let counter = JITTER_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mixed = nanos ^ counter.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    0.5 + ((mixed % 1_000) as f64 / 1_000.0)
}

fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exp = policy.base.as_millis() as f64 * 2f64.powi(attempt as i32) * jitter_factor();
    let capped = exp.min(policy.max_delay.as_millis() as f64);
    Duration::from_millis(capped.max(0.0) as u64)
}

/// Runs `f`, retrying on `WqError::is_retryable` errors with backoff. Any
/// other error returns immediately.
pub fn with_backoff<T>(policy: &RetryPolicy, op: &str, mut f: impl FnMut() -> Result<T, WqError>) -> Result<T, WqError> {
    let mut attempt = 0;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && attempt + 1 < policy.max_attempts => {
                let delay = delay_for_attempt(policy, attempt);
                log::warn!("{op}: retryable error on attempt {}: {e}; sleeping {:?}", attempt + 1, delay);
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retries_transient_errors_up_to_max_attempts() {
        let policy = RetryPolicy { max_attempts: 3, base: Duration::from_millis(1), max_delay: Duration::from_millis(5) };
        let calls = Cell::new(0);
        let result: Result<i32, WqError> = with_backoff(&policy, "test", || {
            calls.set(calls.get() + 1);
            Err(WqError::TransientStorage("boom".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn does_not_retry_fatal_errors() {
        let policy = RetryPolicy::default();
        let calls = Cell::new(0);
        let result: Result<i32, WqError> = with_backoff(&policy, "test", || {
            calls.set(calls.get() + 1);
            Err(WqError::FatalStorage("nope".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn succeeds_without_retry_when_first_attempt_ok() {
        let policy = RetryPolicy::default();
        let result = with_backoff(&policy, "test", || Ok::<_, WqError>(42));
        assert_eq!(result.unwrap(), 42);
    }
}
