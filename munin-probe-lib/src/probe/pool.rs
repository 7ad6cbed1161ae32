use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::probe::engine::{ProbeEngine, TargetItem};
use crate::result::ProbeResult;

/// Fan expanded targets out over N workers and stream records back.
///
/// Results arrive in completion order, not input order. Every submitted
/// target produces exactly one record; under cancellation the stream just
/// ends early, nothing already written is lost.
pub fn run_pool(
    engine: Arc<ProbeEngine>,
    targets: Vec<TargetItem>,
    results: mpsc::Sender<ProbeResult>,
    cancel: CancellationToken,
) {
    let workers = engine.config().concurrency.max(1);
    let (target_tx, target_rx) = mpsc::channel::<TargetItem>(workers * 2);
    let target_rx = Arc::new(Mutex::new(target_rx));

    info!(targets = targets.len(), workers, "starting worker pool");

    // Feeder: pushes every target, yielding to cancellation between pushes.
    let feeder_cancel = cancel.clone();
    tokio::spawn(async move {
        for item in targets {
            tokio::select! {
                _ = feeder_cancel.cancelled() => {
                    debug!("feeder stopped by cancellation");
                    return;
                }
                sent = target_tx.send(item) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    });

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let engine = engine.clone();
        let target_rx = target_rx.clone();
        let results = results.clone();
        let cancel = cancel.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let item = {
                    let mut rx = target_rx.lock().await;
                    tokio::select! {
                        _ = cancel.cancelled() => None,
                        item = rx.recv() => item,
                    }
                };
                let Some(item) = item else {
                    debug!(worker_id, "worker draining complete");
                    break;
                };

                let record = engine.probe_target(&item.url, &item.input).await;
                if results.send(record).await.is_err() {
                    break;
                }
            }
        }));
    }

    // Collector: the result stream closes once every worker is done.
    tokio::spawn(async move {
        for handle in handles {
            let _ = handle.await;
        }
        drop(results);
        debug!("worker pool drained");
    });
}
