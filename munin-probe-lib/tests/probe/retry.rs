use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use munin_probe_lib::probe::retry::with_retries;
use munin_probe_lib::ProbeResult;
use tokio_util::sync::CancellationToken;

fn failing(error: &str, status: u16) -> ProbeResult {
    let mut record = ProbeResult::new("input", "http://t.example/");
    record.error = Some(error.to_string());
    record.status_code = status;
    record
}

fn success() -> ProbeResult {
    let mut record = ProbeResult::new("input", "http://t.example/");
    record.status_code = 200;
    record
}

#[tokio::test(start_paused = true)]
async fn connection_failures_exhaust_all_attempts() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let record = with_retries(2, &CancellationToken::new(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { failing("dial tcp 192.0.2.1:80: connection refused", 0) }
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(
        record.error.as_deref(),
        Some("failed after 3 attempts: dial tcp 192.0.2.1:80: connection refused")
    );
}

#[tokio::test(start_paused = true)]
async fn success_is_never_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let record = with_retries(5, &CancellationToken::new(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { success() }
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(record.error, None);
}

#[tokio::test(start_paused = true)]
async fn authoritative_status_is_never_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let record = with_retries(5, &CancellationToken::new(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { failing("connection reset mid-body", 503) }
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(record.status_code, 503);
    assert!(!record.error.unwrap().starts_with("failed after"));
}

#[tokio::test(start_paused = true)]
async fn non_connection_errors_are_not_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let record = with_retries(5, &CancellationToken::new(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { failing("stopped after 10 redirects", 301) }
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(record.error.as_deref(), Some("stopped after 10 redirects"));
}

#[tokio::test(start_paused = true)]
async fn recovery_midway_returns_the_clean_result() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let record = with_retries(5, &CancellationToken::new(), move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                failing("remote error: tls: handshake failure", 0)
            } else {
                success()
            }
        }
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(record.error, None);
    assert_eq!(record.status_code, 200);
}

#[tokio::test]
async fn cancellation_interrupts_the_backoff() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let record = with_retries(3, &cancel, || async {
        failing("dial tcp 192.0.2.1:80: connection refused", 0)
    })
    .await;

    assert_eq!(record.error.as_deref(), Some("cancelled"));
}
