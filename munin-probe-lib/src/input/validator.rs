use std::net::IpAddr;
use std::str::FromStr;
use std::sync::LazyLock;

use ipnet::IpNet;

use crate::error::{ProbeError, Result};
use crate::input::ParsedInput;

/// Longest input accepted, in bytes.
const MAX_INPUT_LENGTH: usize = 2048;

/// Loopback, RFC1918, CGNAT, link-local, and ULA ranges rejected unless
/// `allow_private_ips` is set.
static PRIVATE_NETS: LazyLock<Vec<IpNet>> = LazyLock::new(|| {
    [
        "127.0.0.0/8",
        "10.0.0.0/8",
        "172.16.0.0/12",
        "192.168.0.0/16",
        "100.64.0.0/10",
        "169.254.0.0/16",
        "::1/128",
        "fc00::/7",
        "fe80::/10",
    ]
    .iter()
    .filter_map(|s| IpNet::from_str(s).ok())
    .collect()
});

/// Reject inputs exceeding safety bounds before any network activity.
pub fn validate_input(parsed: &ParsedInput, allow_private_ips: bool) -> Result<()> {
    if parsed.original.len() > MAX_INPUT_LENGTH {
        return Err(ProbeError::InvalidUrl(format!(
            "input exceeds {MAX_INPUT_LENGTH} bytes"
        )));
    }

    if parsed.original.contains('\0') {
        return Err(ProbeError::InvalidUrl("input contains NUL byte".into()));
    }

    if parsed.host.is_empty() {
        return Err(ProbeError::InvalidUrl(format!(
            "no host in input {:?}",
            parsed.original.trim()
        )));
    }

    if !allow_private_ips && is_private_host(&parsed.host) {
        return Err(ProbeError::InvalidUrl(format!(
            "private or loopback address not allowed: {}",
            parsed.host
        )));
    }

    Ok(())
}

fn is_private_host(host: &str) -> bool {
    if host == "localhost" || host == "127.0.0.1" {
        return true;
    }

    let literal = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);
    match IpAddr::from_str(literal) {
        Ok(ip) => PRIVATE_NETS.iter().any(|net| net.contains(&ip)),
        Err(_) => false,
    }
}
