use std::net::IpAddr;
use std::str::FromStr;

use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::{Resolver, TokioResolver};
use tracing::debug;

/// Best-effort CNAME annotation. Lookup failures never fail a probe; the
/// field just stays empty.
pub struct CnameResolver {
    resolver: TokioResolver,
}

impl CnameResolver {
    /// System resolver configuration when readable, public defaults
    /// otherwise.
    pub fn new() -> Self {
        let resolver = match Resolver::builder_tokio() {
            Ok(builder) => builder.build(),
            Err(e) => {
                debug!(error = %e, "system resolver config unavailable, using defaults");
                Resolver::builder_with_config(
                    ResolverConfig::default(),
                    TokioConnectionProvider::default(),
                )
                .build()
            }
        };
        Self { resolver }
    }

    pub async fn lookup(&self, host: &str) -> Option<String> {
        if IpAddr::from_str(host.trim_start_matches('[').trim_end_matches(']')).is_ok() {
            return None;
        }

        let lookup = self.resolver.lookup(host, RecordType::CNAME).await.ok()?;
        lookup.iter().find_map(|rdata| match rdata {
            RData::CNAME(name) => Some(name.to_utf8().trim_end_matches('.').to_string()),
            _ => None,
        })
    }
}

impl Default for CnameResolver {
    fn default() -> Self {
        Self::new()
    }
}
