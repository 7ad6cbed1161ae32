use std::time::Duration;

use http::header::LOCATION;
use http::HeaderMap;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::trace;
use url::Url;

use crate::client::{Exchange, ProbeClient};
use crate::error::ProbeError;

/// Where a redirect chain ended.
///
/// Every terminal state keeps the currently-held response and the chain
/// accumulated so far; `error` distinguishes a clean final response from a
/// capped, blocked, or cancelled chain.
#[derive(Debug)]
pub struct RedirectOutcome {
    pub exchange: Exchange,
    pub final_url: Url,
    pub chain_status_codes: Vec<u16>,
    pub chain_hosts: Vec<String>,
    pub error: Option<ProbeError>,
}

/// Follow redirects from an already-received first response.
///
/// Iterative on purpose: the hop cap bounds the loop, not the stack. Hop
/// requests are GETs carrying the prior request's headers, executed with
/// the same client.
pub async fn follow_redirects(
    client: &ProbeClient,
    first: Exchange,
    initial_url: Url,
    headers: &HeaderMap,
    max_redirects: usize,
    same_host_only: bool,
    hop_timeout: Duration,
    cancel: &CancellationToken,
) -> RedirectOutcome {
    let initial_host = initial_url.host_str().unwrap_or_default().to_string();

    let mut exchange = first;
    let mut current_url = initial_url;
    let mut chain_status_codes = vec![exchange.status.as_u16()];
    let mut chain_hosts = vec![initial_host.clone()];
    let mut hops = 0usize;

    loop {
        if !exchange.status.is_redirection() {
            return terminal(exchange, current_url, chain_status_codes, chain_hosts, None);
        }
        let Some(location) = header_str(&exchange.headers, LOCATION.as_str()) else {
            return terminal(exchange, current_url, chain_status_codes, chain_hosts, None);
        };

        if hops >= max_redirects {
            return terminal(
                exchange,
                current_url,
                chain_status_codes,
                chain_hosts,
                Some(ProbeError::RedirectCap(max_redirects)),
            );
        }

        let mut next = match current_url.join(&location) {
            Ok(next) => next,
            Err(e) => {
                return terminal(
                    exchange,
                    current_url,
                    chain_status_codes,
                    chain_hosts,
                    Some(ProbeError::InvalidUrl(format!(
                        "invalid redirect location {location:?}: {e}"
                    ))),
                );
            }
        };
        normalize_cross_scheme_port(&current_url, &mut next);

        let next_host = next.host_str().unwrap_or_default().to_string();
        if same_host_only && next_host != initial_host {
            return terminal(
                exchange,
                current_url,
                chain_status_codes,
                chain_hosts,
                Some(ProbeError::CrossHostBlocked { from: initial_host, to: next_host }),
            );
        }

        trace!(from = %current_url, to = %next, hop = hops + 1, "following redirect");
        let followed = match timeout(hop_timeout, client.execute(&next, headers, cancel)).await {
            Ok(Ok(followed)) => followed,
            Ok(Err(e)) => {
                return terminal(exchange, current_url, chain_status_codes, chain_hosts, Some(e));
            }
            Err(_) => {
                return terminal(
                    exchange,
                    current_url,
                    chain_status_codes,
                    chain_hosts,
                    Some(ProbeError::Connection("i/o timeout".into())),
                );
            }
        };

        chain_status_codes.push(followed.status.as_u16());
        chain_hosts.push(next_host);
        hops += 1;
        exchange = followed;
        current_url = next;
    }
}

fn terminal(
    exchange: Exchange,
    final_url: Url,
    chain_status_codes: Vec<u16>,
    chain_hosts: Vec<String>,
    error: Option<ProbeError>,
) -> RedirectOutcome {
    RedirectOutcome { exchange, final_url, chain_status_codes, chain_hosts, error }
}

/// A scheme-changing hop whose Location pins the *previous* scheme's
/// default port is treated as sloppy server config: `http://h` redirected
/// to `https://h:80/p` next requests `https://h/p`. A Location without an
/// explicit port passes through untouched.
fn normalize_cross_scheme_port(current: &Url, next: &mut Url) {
    if next.scheme() == current.scheme() {
        return;
    }
    let current_default = match current.scheme() {
        "http" => 80,
        "https" => 443,
        _ => return,
    };
    if next.port() == Some(current_default) {
        let _ = next.set_port(None);
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}
