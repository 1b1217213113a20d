use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Whether a failed request is worth repeating.
///
/// Client errors (4xx other than 429) are final: the ECB answers 404 when a
/// window has no observations, and retrying will not change that.
pub fn is_transient(err: &reqwest::Error) -> bool {
    match err.status() {
        Some(status) => status.is_server_error() || status.as_u16() == 429,
        None => true,
    }
}

/// Retries an async request on transient failures.
///
/// Runs `operation` once plus up to `retries` more times, sleeping `delay_ms`
/// between attempts. Non-transient errors are returned immediately.
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries || !is_transient(&err) {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt,
                    retries + 1,
                    err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
