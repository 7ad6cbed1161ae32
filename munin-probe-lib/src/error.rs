use thiserror::Error;

/// Errors surfaced by the probing engine.
///
/// The `Display` form of each variant is the exact string carried in the
/// `error` field of an emitted record, so downstream consumers can match on
/// it the same way the fallback coordinator does.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Token acquisition exceeded its wait budget. Never retried.
    #[error("rate limit timeout: no token for {host} within {waited_secs}s")]
    RateLimitTimeout { host: String, waited_secs: u64 },

    #[error("cancelled")]
    Cancelled,

    /// Handshake, DNS, TCP, TLS, or peer reset failure. The message keeps
    /// the wire-level wording (`dial tcp …`, `remote error: tls: …`) so the
    /// connection-level predicate can classify it.
    #[error("{0}")]
    Connection(String),

    #[error("body read failed: {0}")]
    BodyRead(String),

    #[error("stopped after {0} redirects")]
    RedirectCap(usize),

    #[error("cross-host redirect blocked: {from} → {to}")]
    CrossHostBlocked { from: String, to: String },

    /// Every rung of the TLS strategy ladder failed with a connection-level
    /// error; the payload is the joined per-strategy messages.
    #[error("All TLS attempts failed: {0}")]
    AllStrategiesFailed(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ProbeError>;

/// Substrings that mark an error message as connection-level.
///
/// Matched case-insensitively; the list mirrors the wording produced by the
/// dial/TLS layers in this crate and by common HTTP stacks.
const CONNECTION_ERROR_NEEDLES: &[&str] = &[
    "tls:",
    "tls_",
    "handshake",
    "connection refused",
    "connection reset",
    "i/o timeout",
    "eof",
    "certificate",
    "no route to host",
    "network unreachable",
    "protocol",
    "no such host",
    "dial tcp",
    "remote error",
];

/// Case-insensitive substring classification of an error message as
/// connection-level (pre-response) failure.
pub fn is_connection_error(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    CONNECTION_ERROR_NEEDLES.iter().any(|n| lower.contains(n))
}
