use std::collections::HashSet;

use crate::config::ProbeConfig;
use crate::error::Result;
use crate::input::{parse_input, parse_port_list, validate_input, Scheme};

/// Ports probed per scheme when `ignore_ports` widens the sweep.
const HTTP_COMMON_PORTS: &[u16] = &[80, 8000, 8080, 8888];
const HTTPS_COMMON_PORTS: &[u16] = &[443, 8443, 10443, 8444];

/// Why a port ended up in the expansion; decides whether the emitted URL
/// spells it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortReason {
    Custom,
    CommonSet,
    Explicit,
    SchemeDefault,
}

/// The concrete probe URLs expanded from one input, deduplicated by
/// normalized form (default port stripped) with first-seen order kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    urls: Vec<String>,
    keys: HashSet<String>,
}

impl TargetSet {
    fn insert(&mut self, url: String, key: String) {
        if self.keys.insert(key) {
            self.urls.push(url);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

/// Expand a loose input into the set of URLs to probe under the configured
/// flags: scheme × port × path, canonicalized and deduplicated.
pub fn expand(input: &str, cfg: &ProbeConfig) -> Result<TargetSet> {
    let parsed = parse_input(input);
    validate_input(&parsed, cfg.allow_private_ips)?;

    let schemes: Vec<Scheme> = if cfg.all_schemes {
        vec![Scheme::Http, Scheme::Https]
    } else if let Some(scheme) = parsed.scheme {
        vec![scheme]
    } else if parsed.port == Some(443) {
        vec![Scheme::Https]
    } else if parsed.port == Some(80) {
        vec![Scheme::Http]
    } else {
        vec![Scheme::Http, Scheme::Https]
    };

    let custom_ports = cfg
        .custom_ports
        .as_deref()
        .and_then(|spec| parse_port_list(spec).ok())
        .filter(|ports| !ports.is_empty());

    let mut set = TargetSet::default();
    for scheme in schemes {
        let ports: Vec<(u16, PortReason)> = if let Some(custom) = &custom_ports {
            custom
                .iter()
                .filter_map(|p| p.parse().ok())
                .map(|p| (p, PortReason::Custom))
                .collect()
        } else if cfg.ignore_ports {
            let common = match scheme {
                Scheme::Http => HTTP_COMMON_PORTS,
                Scheme::Https => HTTPS_COMMON_PORTS,
            };
            common.iter().map(|&p| (p, PortReason::CommonSet)).collect()
        } else if let Some(port) = parsed.port {
            vec![(port, PortReason::Explicit)]
        } else {
            vec![(scheme.default_port(), PortReason::SchemeDefault)]
        };

        for (port, reason) in ports {
            let spell_port = reason != PortReason::SchemeDefault || port != scheme.default_port();
            let url = build_url(scheme, &parsed.host, port, spell_port, &parsed.path);
            let key = normalize_url(scheme, &parsed.host, port, &parsed.path);
            set.insert(url, key);
        }
    }

    Ok(set)
}

fn build_url(scheme: Scheme, host: &str, port: u16, spell_port: bool, path: &str) -> String {
    if spell_port {
        format!("{scheme}://{host}:{port}{path}")
    } else {
        format!("{scheme}://{host}{path}")
    }
}

/// Dedup key: the URL with a scheme-default port stripped.
fn normalize_url(scheme: Scheme, host: &str, port: u16, path: &str) -> String {
    build_url(scheme, host, port, port != scheme.default_port(), path)
}
