#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use munin_probe_lib::{load_from_path, ProbeConfig, ProbeEngine, ProbeResult};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP reconnaissance prober (TLS ladder, redirect chains, content fingerprints)")]
struct Cli {
    /// File with one host/URL per line; standard input when omitted
    #[arg(short = 'l', long, value_name = "FILE")]
    list: Option<PathBuf>,

    /// Write JSON lines here instead of standard output
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Configuration TOML file; flags below override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Do not follow redirects
    #[arg(long)]
    no_follow_redirects: bool,

    /// Maximum redirect hops
    #[arg(long, value_name = "N")]
    max_redirects: Option<usize>,

    /// Refuse redirects that leave the initial hostname
    #[arg(long)]
    same_host_only: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Per-strategy TLS attempt timeout in seconds
    #[arg(long, value_name = "SECS")]
    tls_handshake_timeout: Option<u64>,

    /// Rate-limit token wait budget in seconds
    #[arg(long, value_name = "SECS")]
    rate_limit_timeout: Option<u64>,

    /// Worker count
    #[arg(short = 'c', long, value_name = "N")]
    concurrency: Option<usize>,

    /// Verify TLS certificates (verification is off by default)
    #[arg(long)]
    verify_tls: bool,

    /// Probe loopback and private addresses
    #[arg(long)]
    allow_private_ips: bool,

    /// Response body read cap in bytes
    #[arg(long, value_name = "BYTES")]
    max_body_size: Option<usize>,

    /// Extra attempts for connection-level failures
    #[arg(long, value_name = "N")]
    retries: Option<usize>,

    /// Use HTTP/2 on the TLS 1.3 rung instead of HTTP/3
    #[arg(long)]
    disable_http3: bool,

    /// Probe both http and https regardless of the input scheme
    #[arg(long)]
    all_schemes: bool,

    /// Probe each scheme's common port set instead of parsed ports
    #[arg(long)]
    ignore_ports: bool,

    /// Comma/range port list overriding everything else, e.g. "8443,9000-9005"
    #[arg(short = 'p', long, value_name = "PORTS")]
    ports: Option<String>,

    /// Custom User-Agent header
    #[arg(long, value_name = "UA", conflicts_with = "random_user_agent")]
    user_agent: Option<String>,

    /// Pick a User-Agent from the built-in pool per request
    #[arg(long)]
    random_user_agent: bool,

    /// Also emit records whose error field is set
    #[arg(long)]
    include_failed: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "failed to build configuration");
            std::process::exit(1);
        }
    };

    let lines = match read_inputs(cli.list.as_deref()) {
        Ok(lines) => lines,
        Err(err) => {
            error!(%err, "failed to read inputs");
            std::process::exit(1);
        }
    };
    if lines.is_empty() {
        error!("no inputs given");
        std::process::exit(1);
    }

    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => match File::create(path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(err) => {
                error!(%err, path = %path.display(), "failed to open output file");
                std::process::exit(1);
            }
        },
        None => Box::new(io::stdout().lock()),
    };

    let engine = Arc::new(ProbeEngine::new(Arc::new(config)));
    spawn_signal_handler(&engine);

    info!(inputs = lines.len(), "probing");
    let mut results = engine.run(lines);
    let mut emitted = 0usize;
    while let Some(record) = results.recv().await {
        if record.failed() && !record.diagnostic() && !cli.include_failed {
            debug!(url = record.url.as_str(), error = record.error.as_deref().unwrap_or_default(), "suppressed failed probe");
            continue;
        }
        if let Err(err) = emit(&mut writer, &record) {
            error!(%err, "failed to write record");
            std::process::exit(1);
        }
        emitted += 1;
    }
    let _ = writer.flush();
    info!(emitted, "done");
}

fn emit(writer: &mut dyn Write, record: &ProbeResult) -> io::Result<()> {
    let line = serde_json::to_string(record).map_err(io::Error::other)?;
    writeln!(writer, "{line}")
}

/// Load the TOML config when given, then lay CLI overrides on top.
fn build_config(cli: &Cli) -> munin_probe_lib::Result<ProbeConfig> {
    let mut config = match &cli.config {
        Some(path) => load_from_path(path)?,
        None => ProbeConfig::default(),
    };

    if cli.no_follow_redirects {
        config.follow_redirects = false;
    }
    if let Some(n) = cli.max_redirects {
        config.max_redirects = n;
    }
    if cli.same_host_only {
        config.same_host_only = true;
    }
    if let Some(secs) = cli.timeout {
        config.timeout_seconds = secs;
    }
    if let Some(secs) = cli.tls_handshake_timeout {
        config.tls_handshake_timeout_seconds = secs;
    }
    if let Some(secs) = cli.rate_limit_timeout {
        config.rate_limit_timeout_seconds = secs;
    }
    if let Some(n) = cli.concurrency {
        config.concurrency = n;
    }
    if cli.verify_tls {
        config.insecure_skip_verify = false;
    }
    if cli.allow_private_ips {
        config.allow_private_ips = true;
    }
    if let Some(bytes) = cli.max_body_size {
        config.max_body_size = bytes;
    }
    if let Some(n) = cli.retries {
        config.max_retries = n;
    }
    if cli.disable_http3 {
        config.disable_http3 = true;
    }
    if cli.all_schemes {
        config.all_schemes = true;
    }
    if cli.ignore_ports {
        config.ignore_ports = true;
    }
    if let Some(ports) = &cli.ports {
        config.custom_ports = Some(ports.clone());
    }
    if let Some(ua) = &cli.user_agent {
        config.user_agent = Some(ua.clone());
    }
    if cli.random_user_agent {
        config.random_user_agent = true;
    }

    config.validate()?;
    Ok(config)
}

/// One line per input; `#` comments and blank lines are skipped.
fn read_inputs(list: Option<&std::path::Path>) -> io::Result<Vec<String>> {
    let reader: Box<dyn BufRead> = match list {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        lines.push(trimmed.to_string());
    }
    Ok(lines)
}

/// First SIGINT/SIGTERM cancels the run; a second SIGINT aborts outright.
fn spawn_signal_handler(engine: &Arc<ProbeEngine>) {
    let cancel = engine.cancellation_token();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received, cancelling outstanding probes");
        cancel.cancel();
        wait_for_signal().await;
        error!("second interrupt, aborting");
        std::process::exit(130);
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
