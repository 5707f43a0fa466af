//! Retry for transient SQLite lock contention
//!
//! Only "database is locked" errors are retried, with exponential backoff
//! from 10ms capped at 1s, until `max_wait_ms` has elapsed. Every other error
//! returns immediately.

use std::time::{Duration, Instant};

use goldrec_common::{Error, Result};

/// Default retry budget for store writes
pub const MAX_LOCK_WAIT_MS: u64 = 5000;

fn is_lock_error(err: &Error) -> bool {
    matches!(err, Error::Database(db_err) if db_err.to_string().contains("database is locked"))
}

pub async fn retry_on_lock<F, Fut, T>(operation_name: &str, max_wait_ms: u64, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let started = Instant::now();
    let budget = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = 10u64;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Store write succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_lock_error(&err) {
            return Err(err);
        }

        let elapsed = started.elapsed();
        if elapsed >= budget {
            tracing::error!(
                operation = operation_name,
                attempt,
                elapsed_ms = elapsed.as_millis() as u64,
                max_wait_ms,
                "Store write failed: database stayed locked"
            );
            return Err(Error::Internal(format!(
                "Database locked after {} attempts ({} ms elapsed, max {} ms)",
                attempt,
                elapsed.as_millis(),
                max_wait_ms
            )));
        }

        tracing::warn!(
            operation = operation_name,
            attempt,
            backoff_ms,
            "Database locked, retrying"
        );
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        backoff_ms = (backoff_ms * 2).min(1000);
    }
}
