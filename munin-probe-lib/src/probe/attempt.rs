use std::sync::Arc;
use std::time::Duration;

use http::header::{
    ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONTENT_LENGTH, CONTENT_TYPE, SERVER, USER_AGENT,
};
use http::{HeaderMap, HeaderValue};
use rand::Rng;
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::client::{Exchange, ProbeClient};
use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::extract;
use crate::limiter::HostRateLimiter;
use crate::probe::engine::TechDetector;
use crate::probe::redirect::{follow_redirects, RedirectOutcome};
use crate::result::{HashInfo, ProbeResult, TlsInfo};
use crate::tls::TlsStrategy;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const USER_AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
];

/// Shared references every attempt needs.
#[derive(Clone, Copy)]
pub struct ProbeContext<'a> {
    pub config: &'a ProbeConfig,
    pub limiter: &'a HostRateLimiter,
    pub cancel: &'a CancellationToken,
    pub tech: Option<&'a Arc<dyn TechDetector>>,
}

/// Request headers for one probe: User-Agent (custom, random-from-pool, or
/// the browser-like default), Accept, Accept-Language, Accept-Encoding.
pub fn build_headers(config: &ProbeConfig) -> HeaderMap {
    let ua = if let Some(custom) = &config.user_agent {
        custom.clone()
    } else if config.random_user_agent {
        let idx = rand::rng().random_range(0..USER_AGENT_POOL.len());
        USER_AGENT_POOL[idx].to_string()
    } else {
        DEFAULT_USER_AGENT.to_string()
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&ua).unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    // Compressed bodies are decoded transparently before extraction.
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    headers
}

/// Execute one request against one target under one strategy and assemble
/// the record. Failures are carried in the result's error field, never as
/// an Err; the fallback and retry layers dispatch on it.
pub async fn probe_once(
    client: &ProbeClient,
    target: &str,
    input: &str,
    strategy: Option<&TlsStrategy>,
    ctx: ProbeContext<'_>,
) -> ProbeResult {
    let mut result = ProbeResult::new(input, target);

    let url = match Url::parse(target) {
        Ok(url) => url,
        Err(e) => {
            result.error = Some(ProbeError::InvalidUrl(e.to_string()).to_string());
            return result;
        }
    };
    // Url::parse drops a scheme-default port, so an expanded
    // `https://h:443/` probes as `https://h/` and the Host header never
    // carries `:80`/`:443`; some origins reject those.
    result.url = url.to_string();
    fill_url_fields(&mut result, &url);

    let host = url.host_str().unwrap_or_default().to_string();
    let started = Instant::now();

    if let Err(e) = acquire_token(ctx.limiter, &host, ctx.cancel).await {
        result.time = format!("{:?}", started.elapsed());
        result.error = Some(e.to_string());
        return result;
    }

    let attempt_timeout = if url.scheme() == "https" {
        ctx.config.tls_handshake_timeout()
    } else {
        ctx.config.request_timeout()
    };

    let headers = build_headers(ctx.config);
    let exchange = match run_exchange(client, &url, &headers, attempt_timeout, ctx.cancel).await {
        Ok(exchange) => exchange,
        Err(e) => {
            result.time = format!("{:?}", started.elapsed());
            result.error = Some(e.to_string());
            debug!(%url, error = %result.error.as_deref().unwrap_or_default(), "attempt failed");
            return result;
        }
    };

    let outcome = if exchange.status.is_redirection() && ctx.config.follow_redirects {
        follow_redirects(
            client,
            exchange,
            url.clone(),
            &headers,
            ctx.config.max_redirects,
            ctx.config.same_host_only,
            ctx.config.request_timeout(),
            ctx.cancel,
        )
        .await
    } else {
        RedirectOutcome {
            chain_status_codes: vec![exchange.status.as_u16()],
            chain_hosts: vec![host.clone()],
            final_url: url.clone(),
            exchange,
            error: None,
        }
    };
    result.time = format!("{:?}", started.elapsed());

    if outcome.exchange.truncated {
        debug!(%url, cap = ctx.config.max_body_size, "body read stopped at the size cap");
    }

    assemble(&mut result, &url, outcome, strategy, ctx.tech);
    result
}

async fn acquire_token(
    limiter: &HostRateLimiter,
    host: &str,
    cancel: &CancellationToken,
) -> Result<(), ProbeError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(ProbeError::Cancelled),
        res = limiter.acquire(host) => res,
    }
}

async fn run_exchange(
    client: &ProbeClient,
    url: &Url,
    headers: &HeaderMap,
    attempt_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Exchange, ProbeError> {
    match timeout(attempt_timeout, client.execute(url, headers, cancel)).await {
        Ok(res) => res,
        Err(_) => Err(ProbeError::Connection("i/o timeout".into())),
    }
}

/// Fold the terminal response, chain, and annotations into the record.
fn assemble(
    result: &mut ProbeResult,
    initial_url: &Url,
    outcome: RedirectOutcome,
    strategy: Option<&TlsStrategy>,
    tech: Option<&Arc<dyn TechDetector>>,
) {
    let exchange = &outcome.exchange;

    result.final_url = outcome.final_url.to_string();
    fill_url_fields(result, &outcome.final_url);
    result.status_code = exchange.status.as_u16();
    result.chain_status_codes = outcome.chain_status_codes;
    result.chain_hosts = outcome.chain_hosts;
    result.protocol = exchange.protocol_label().to_string();

    result.webserver = header_string(&exchange.headers, SERVER.as_str());
    result.content_type = header_string(&exchange.headers, CONTENT_TYPE.as_str())
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    result.content_length = header_string(&exchange.headers, CONTENT_LENGTH.as_str())
        .parse()
        .unwrap_or(exchange.body.len());

    result.hash = HashInfo {
        body_mmh3: extract::body_hash(&exchange.body),
        header_mmh3: extract::header_hash(&exchange.headers),
    };
    result.title = extract::extract_title(&exchange.body);
    result.words = extract::count_words(&exchange.body);
    result.lines = extract::count_lines(&exchange.body);

    let mut sans: Vec<String> = Vec::new();
    let mut cn = String::new();

    if let Some(session) = &exchange.tls {
        result.tls_version = Some(session.version.clone());
        result.cipher_suite = Some(session.cipher_suite.clone());
        result.tls_config_strategy = strategy.map(|s| s.name.to_string());

        let (leaf, chain) = extract::parse_chain(&session.peer_certificates);
        if let Some(leaf) = &leaf {
            sans = leaf.subject_alternative_names.clone();
            cn = leaf.subject_cn.clone();
        }
        result.tls = Some(TlsInfo {
            version: session.version.clone(),
            cipher: session.cipher_suite.clone(),
            certificate: leaf,
            chain,
        });
    }

    let csp_domains = extract::extract_csp_domains(&header_string(
        &exchange.headers,
        "content-security-policy",
    ));
    let input_host = initial_url.host_str().unwrap_or_default();
    result.discovered_domains = extract::discover_domains(
        input_host,
        &sans,
        (!cn.is_empty()).then_some(cn.as_str()),
        &csp_domains,
    );

    if let Some(name) = extract::detect_cdn(&exchange.headers) {
        result.cdn = Some(true);
        result.cdn_name = Some(name);
    }

    if let Some(detector) = tech {
        result.technologies = detector.detect(&exchange.headers, &exchange.body);
    }

    if let Some(err) = outcome.error {
        result.error = Some(err.to_string());
    }
}

fn fill_url_fields(result: &mut ProbeResult, url: &Url) {
    result.scheme = url.scheme().to_string();
    result.host = url.host_str().unwrap_or_default().to_string();
    result.port = url
        .port()
        .or_else(|| default_port(url.scheme()))
        .map(|p| p.to_string())
        .unwrap_or_default();
    result.path = match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    };
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}
