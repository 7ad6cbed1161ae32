use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::is_connection_error;
use crate::result::ProbeResult;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Exponential backoff schedule: 1s doubling to a 30s cap.
pub fn backoff_for(attempt: usize) -> Duration {
    let factor = 1u32 << attempt.min(5) as u32;
    (INITIAL_BACKOFF * factor).min(MAX_BACKOFF)
}

/// Re-run an attempt on connection-level failures, up to `max_retries`
/// extra times. A response that completed the handshake is authoritative:
/// 4xx/5xx and clean results are never retried, and the backoff sleep is
/// cut short by cancellation.
pub async fn with_retries<F, Fut>(
    max_retries: usize,
    cancel: &CancellationToken,
    mut attempt_fn: F,
) -> ProbeResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult>,
{
    let total_attempts = max_retries + 1;

    for attempt in 0..total_attempts {
        let mut result = attempt_fn().await;

        let retryable = result.failed()
            && result.status_code < 400
            && result.error.as_deref().map(is_connection_error).unwrap_or(false);

        if !retryable {
            return result;
        }

        if attempt + 1 == total_attempts {
            if total_attempts > 1 {
                if let Some(err) = result.error.take() {
                    result.error = Some(format!("failed after {total_attempts} attempts: {err}"));
                }
            }
            return result;
        }

        let delay = backoff_for(attempt);
        debug!(attempt = attempt + 1, ?delay, "retrying after connection failure");
        tokio::select! {
            _ = cancel.cancelled() => {
                result.error = Some(crate::error::ProbeError::Cancelled.to_string());
                return result;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }

    unreachable!("with_retries always returns inside the loop")
}
