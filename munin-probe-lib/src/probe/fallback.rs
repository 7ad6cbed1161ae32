use std::net::IpAddr;
use std::str::FromStr;

use tracing::debug;
use url::Url;

use crate::client::ClientFactory;
use crate::error::{is_connection_error, ProbeError};
use crate::probe::attempt::{probe_once, ProbeContext};
use crate::result::ProbeResult;
use crate::tls::strategy_ladder;

/// Walk the TLS strategy ladder against one HTTPS target until a response
/// arrives or every rung fails at the connection level.
///
/// A non-connection failure (rate-limit timeout, redirect cap, body read)
/// is authoritative and short-circuits the ladder.
pub async fn probe_https(
    factory: &ClientFactory,
    target: &str,
    input: &str,
    ctx: ProbeContext<'_>,
) -> ProbeResult {
    let ladder = strategy_ladder(ctx.config.disable_http3);
    let mut failures: Vec<String> = Vec::with_capacity(ladder.len());

    for strategy in &ladder {
        let client = match factory.for_strategy(strategy) {
            Ok(client) => client,
            Err(e) => {
                failures.push(format!("{} ({}): {e}", strategy.name, strategy.protocol));
                continue;
            }
        };

        let result = probe_once(&client, target, input, Some(strategy), ctx).await;

        match result.error.as_deref() {
            None | Some("") => return result,
            Some(message) if !is_connection_error(message) => return result,
            Some(message) => {
                debug!(url = target, strategy = strategy.name, error = message, "strategy failed");
                failures.push(format!("{} ({}): {message}", strategy.name, strategy.protocol));
            }
        }
    }

    let mut result = ProbeResult::new(input, target);
    if let Ok(url) = Url::parse(target) {
        result.scheme = url.scheme().to_string();
        result.host = url.host_str().unwrap_or_default().to_string();
        result.port = url.port_or_known_default().map(|p| p.to_string()).unwrap_or_default();
        result.path = url.path().to_string();
    }
    result.error = Some(ProbeError::AllStrategiesFailed(failures.join("; ")).to_string());

    if sni_required(&result.host, &failures) {
        result.sni_required = Some(true);
    }

    result
}

/// A bare-IP target whose every recorded failure looks like a TLS alert is
/// most likely a server that routes by server name.
fn sni_required(host: &str, failures: &[String]) -> bool {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if IpAddr::from_str(bare).is_err() {
        return false;
    }
    !failures.is_empty()
        && failures.iter().all(|f| {
            let lower = f.to_ascii_lowercase();
            lower.contains("handshake failure") || lower.contains("remote error: tls")
        })
}
