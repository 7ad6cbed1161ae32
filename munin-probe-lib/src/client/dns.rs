use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::net::lookup_host;
use tracing::trace;

use crate::error::{ProbeError, Result};

const DNS_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry {
    addresses: Vec<IpAddr>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Per-run DNS cache shared by all workers.
///
/// Probing expands one host into many scheme/port targets; caching the
/// lookup keeps that from turning into one resolver round-trip per target.
#[derive(Debug)]
pub struct DnsCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl Default for DnsCache {
    fn default() -> Self {
        Self::new(DNS_CACHE_TTL)
    }
}

impl DnsCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl }
    }

    /// Resolve `host` to socket addresses for `port`, consulting the cache
    /// first. IP literals (including bracketed IPv6) bypass resolution.
    pub async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>> {
        let literal = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);
        if let Ok(ip) = IpAddr::from_str(literal) {
            return Ok(vec![SocketAddr::new(ip, port)]);
        }

        if let Some(entry) = self.entries.get(host) {
            let snapshot = entry.value().clone();
            drop(entry);
            if !snapshot.is_expired() {
                trace!(host, "dns cache hit");
                return Ok(snapshot
                    .addresses
                    .iter()
                    .map(|&ip| SocketAddr::new(ip, port))
                    .collect());
            }
        }

        let resolved: Vec<SocketAddr> = lookup_host((literal, port))
            .await
            .map_err(|_| ProbeError::Connection(format!("lookup {host}: no such host")))?
            .collect();
        if resolved.is_empty() {
            return Err(ProbeError::Connection(format!("lookup {host}: no such host")));
        }

        self.entries.insert(
            host.to_string(),
            CacheEntry {
                addresses: resolved.iter().map(|a| a.ip()).collect(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        Ok(resolved)
    }
}
