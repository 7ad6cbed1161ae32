use std::sync::Arc;

use http::HeaderMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::client::ClientFactory;
use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::extract::CnameResolver;
use crate::input;
use crate::limiter::HostRateLimiter;
use crate::probe::attempt::{probe_once, ProbeContext};
use crate::probe::{fallback, pool, retry};
use crate::result::ProbeResult;

/// External technology-fingerprinting oracle. The engine consults it when
/// present and records whatever labels it returns.
pub trait TechDetector: Send + Sync {
    fn detect(&self, headers: &HeaderMap, body: &[u8]) -> Vec<String>;
}

/// One concrete probe URL paired with the input line it expanded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetItem {
    pub url: String,
    pub input: String,
}

/// The probing engine: expansion, ladder, redirects, retries, fan-out.
///
/// One engine per run; configuration is immutable and the cancellation
/// token is shared with every in-flight attempt.
pub struct ProbeEngine {
    config: Arc<ProbeConfig>,
    factory: ClientFactory,
    limiter: HostRateLimiter,
    cname: CnameResolver,
    tech: Option<Arc<dyn TechDetector>>,
    cancel: CancellationToken,
}

impl ProbeEngine {
    pub fn new(config: Arc<ProbeConfig>) -> Self {
        Self {
            factory: ClientFactory::new(config.clone()),
            limiter: HostRateLimiter::new(config.rate_limit_timeout()),
            cname: CnameResolver::new(),
            tech: None,
            cancel: CancellationToken::new(),
            config,
        }
    }

    pub fn with_tech_detector(mut self, detector: Arc<dyn TechDetector>) -> Self {
        self.tech = Some(detector);
        self
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Clone of the run-wide token, for wiring signal handlers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Expand input lines into concrete targets. Inputs the validator
    /// rejects become error records so nothing silently disappears.
    pub fn expand_inputs(&self, lines: &[String]) -> (Vec<TargetItem>, Vec<ProbeResult>) {
        let mut targets = Vec::new();
        let mut rejected = Vec::new();

        for line in lines {
            match input::expand(line, &self.config) {
                Ok(set) => {
                    for url in set.iter() {
                        targets.push(TargetItem { url: url.to_string(), input: line.clone() });
                    }
                }
                Err(e) => {
                    warn!(input = line.as_str(), error = %e, "input rejected");
                    let mut record = ProbeResult::new(line.clone(), String::new());
                    record.error = Some(e.to_string());
                    rejected.push(record);
                }
            }
        }

        (targets, rejected)
    }

    /// Probe every input line, streaming one record per expanded target
    /// (plus one per rejected input) in completion order.
    pub fn run(self: Arc<Self>, lines: Vec<String>) -> mpsc::Receiver<ProbeResult> {
        let (targets, rejected) = self.expand_inputs(&lines);
        let capacity = (targets.len() + rejected.len()).max(1);
        let (tx, rx) = mpsc::channel(capacity);

        for record in rejected {
            // Channel is sized for every record; this cannot block.
            let _ = tx.try_send(record);
        }

        pool::run_pool(self.clone(), targets, tx, self.cancel.clone());
        rx
    }

    /// One target through retries, the HTTPS ladder, and annotation.
    pub async fn probe_target(&self, target: &str, input: &str) -> ProbeResult {
        if self.cancel.is_cancelled() {
            let mut record = ProbeResult::new(input, target);
            record.error = Some(ProbeError::Cancelled.to_string());
            return record;
        }

        let mut record = retry::with_retries(self.config.max_retries, &self.cancel, || {
            self.attempt_target(target, input)
        })
        .await;

        self.annotate(&mut record).await;
        record
    }

    async fn attempt_target(&self, target: &str, input: &str) -> ProbeResult {
        let ctx = ProbeContext {
            config: &self.config,
            limiter: &self.limiter,
            cancel: &self.cancel,
            tech: self.tech.as_ref(),
        };

        if target.starts_with("https://") {
            fallback::probe_https(&self.factory, target, input, ctx).await
        } else {
            match self.factory.general() {
                Ok(client) => probe_once(&client, target, input, None, ctx).await,
                Err(e) => {
                    let mut record = ProbeResult::new(input, target);
                    record.error = Some(e.to_string());
                    record
                }
            }
        }
    }

    /// CNAME annotation, best-effort, only for records that will reach the
    /// emitter.
    async fn annotate(&self, record: &mut ProbeResult) {
        if record.failed() && !record.diagnostic() {
            return;
        }
        if !record.host.is_empty() {
            record.cname = self.cname.lookup(&record.host).await;
        }
    }
}
