use std::sync::Arc;
use std::time::Duration;

use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::client::dns::DnsCache;
use crate::client::exchange::PlainClient;
pub use crate::client::exchange::ProbeClient;
use crate::config::ProbeConfig;
use crate::error::Result;
use crate::tls::{build_client_config, Protocol, TlsStrategy, TlsVersion};

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE_PER_HOST: usize = 4;

/// Version-flexible parameters for probes that start on plain HTTP but may
/// be redirected onto HTTPS mid-chain.
const GENERAL_STRATEGY: TlsStrategy = TlsStrategy {
    name: "default",
    min_version: TlsVersion::V1_2,
    max_version: TlsVersion::V1_3,
    cipher_suites: None,
    protocol: Protocol::Http2,
};

/// Builds probe clients: one shared pooled plain-HTTP client, plus a
/// per-strategy TLS configuration for each ladder rung.
pub struct ClientFactory {
    config: Arc<ProbeConfig>,
    dns: Arc<DnsCache>,
    plain: PlainClient,
}

impl ClientFactory {
    pub fn new(config: Arc<ProbeConfig>) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.request_timeout()));

        let plain = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .build(connector);

        Self { config, dns: Arc::new(DnsCache::default()), plain }
    }

    /// Client pinned to one TLS strategy rung.
    pub fn for_strategy(&self, strategy: &TlsStrategy) -> Result<ProbeClient> {
        let tls = build_client_config(strategy, self.config.insecure_skip_verify)?;
        Ok(self.assemble(Arc::new(tls)))
    }

    /// Version-flexible client for plain-HTTP targets.
    pub fn general(&self) -> Result<ProbeClient> {
        let tls = build_client_config(&GENERAL_STRATEGY, self.config.insecure_skip_verify)?;
        Ok(self.assemble(Arc::new(tls)))
    }

    fn assemble(&self, tls_config: Arc<tokio_rustls::rustls::ClientConfig>) -> ProbeClient {
        ProbeClient {
            plain: self.plain.clone(),
            tls_config,
            dns: self.dns.clone(),
            dial_timeout: self.config.request_timeout(),
            max_body_size: self.config.max_body_size,
        }
    }
}
