use std::collections::BTreeMap;

use serde::Serialize;

/// Adjacent domains surfaced by one probe, with where each came from.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DiscoveredDomains {
    /// Sorted, lower-cased union of everything seen.
    pub domains: Vec<String>,
    /// Domain -> first source that produced it ("san", "cn", "csp").
    pub domain_sources: BTreeMap<String, String>,
    /// `domains` minus an exact match with the probed hostname.
    pub new_domains: Vec<String>,
}

/// Union certificate SANs, the certificate CN, and CSP-sourced hosts.
/// Earlier sources win: a CN that is already a SAN keeps source "san".
pub fn discover_domains(
    input_host: &str,
    sans: &[String],
    cn: Option<&str>,
    csp: &[String],
) -> Option<DiscoveredDomains> {
    let mut sources: BTreeMap<String, String> = BTreeMap::new();

    for san in sans {
        let domain = san.to_ascii_lowercase();
        sources.entry(domain).or_insert_with(|| "san".to_string());
    }
    if let Some(cn) = cn {
        if !cn.is_empty() {
            sources
                .entry(cn.to_ascii_lowercase())
                .or_insert_with(|| "cn".to_string());
        }
    }
    for domain in csp {
        sources
            .entry(domain.to_ascii_lowercase())
            .or_insert_with(|| "csp".to_string());
    }

    if sources.is_empty() {
        return None;
    }

    let domains: Vec<String> = sources.keys().cloned().collect();
    let input = input_host.to_ascii_lowercase();
    let new_domains = domains.iter().filter(|d| **d != input).cloned().collect();

    Some(DiscoveredDomains { domains, domain_sources: sources, new_domains })
}
