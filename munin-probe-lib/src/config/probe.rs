use serde::Deserialize;
use std::time::Duration;

/// Engine configuration, immutable once constructed.
///
/// Shared across workers as `Arc<ProbeConfig>`; every field has a serde
/// default so a partial TOML file (or a bare `ProbeConfig::default()`) is a
/// complete, runnable configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ProbeConfig {
    /// Follow 3xx responses through the redirect engine
    /// Default: true
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    /// Maximum redirect hops before the chain is cut with
    /// "stopped after N redirects"
    /// Default: 10
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Reject redirect hops that leave the initial hostname
    /// Default: false
    #[serde(default)]
    pub same_host_only: bool,
    /// Per-request wall clock ceiling in seconds
    /// Default: 15
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Ceiling on a single TLS strategy attempt in seconds
    /// Default: 10
    #[serde(default = "default_tls_handshake_timeout")]
    pub tls_handshake_timeout_seconds: u64,
    /// Ceiling on waiting for a per-host rate limit token in seconds
    /// Default: 30
    #[serde(default = "default_rate_limit_timeout")]
    pub rate_limit_timeout_seconds: u64,
    /// Worker count, at least 1
    /// Default: 50
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Skip TLS certificate verification
    /// Recon targets routinely present self-signed or mismatched
    /// certificates, so verification is off by default
    /// Default: true
    #[serde(default = "default_true")]
    pub insecure_skip_verify: bool,
    /// Allow probing loopback and RFC1918/ULA/link-local addresses
    /// Default: false
    #[serde(default)]
    pub allow_private_ips: bool,
    /// Cap on bytes read per response body; bodies at the cap are recorded
    /// as truncated
    /// Default: 1 MiB
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Attempts beyond the first for connection-level failures only
    /// Default: 0 (no retries)
    #[serde(default)]
    pub max_retries: usize,
    /// Use HTTP/2 instead of HTTP/3 on the TLS 1.3 strategy rung
    /// Default: false
    #[serde(default)]
    pub disable_http3: bool,
    /// Expand every input to both http and https regardless of what the
    /// input specified
    /// Default: false
    #[serde(default)]
    pub all_schemes: bool,
    /// Ignore parsed ports and probe each scheme's common port set
    /// (HTTP: 80,8000,8080,8888 / HTTPS: 443,8443,10443,8444)
    /// Default: false
    #[serde(default)]
    pub ignore_ports: bool,
    /// Comma/range port list overriding all other port selection,
    /// e.g. "8443,9000-9005"
    /// Default: none
    #[serde(default)]
    pub custom_ports: Option<String>,
    /// Override the User-Agent header; mutually exclusive with
    /// `random_user_agent`
    /// Default: none (a browser-like default is sent)
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Pick a User-Agent from the built-in pool per request; mutually
    /// exclusive with `user_agent`
    /// Default: false
    #[serde(default)]
    pub random_user_agent: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            follow_redirects: default_true(),
            max_redirects: default_max_redirects(),
            same_host_only: false,
            timeout_seconds: default_timeout(),
            tls_handshake_timeout_seconds: default_tls_handshake_timeout(),
            rate_limit_timeout_seconds: default_rate_limit_timeout(),
            concurrency: default_concurrency(),
            insecure_skip_verify: default_true(),
            allow_private_ips: false,
            max_body_size: default_max_body_size(),
            max_retries: 0,
            disable_http3: false,
            all_schemes: false,
            ignore_ports: false,
            custom_ports: None,
            user_agent: None,
            random_user_agent: false,
        }
    }
}

impl ProbeConfig {
    /// Reject combinations the engine cannot honor.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::ProbeError;

        if self.concurrency == 0 {
            return Err(ProbeError::Config("concurrency must be at least 1".into()));
        }

        if self.user_agent.is_some() && self.random_user_agent {
            return Err(ProbeError::Config(
                "user_agent and random_user_agent are mutually exclusive".into(),
            ));
        }

        if let Some(ports) = &self.custom_ports {
            crate::input::parse_port_list(ports)
                .map_err(|e| ProbeError::Config(format!("Invalid custom_ports: {e}")))?;
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn tls_handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.tls_handshake_timeout_seconds)
    }

    pub fn rate_limit_timeout(&self) -> Duration {
        Duration::from_secs(self.rate_limit_timeout_seconds)
    }
}

fn default_true() -> bool {
    true
}

fn default_max_redirects() -> usize {
    10
}

fn default_timeout() -> u64 {
    15
}

fn default_tls_handshake_timeout() -> u64 {
    10
}

fn default_rate_limit_timeout() -> u64 {
    30
}

fn default_concurrency() -> usize {
    50
}

fn default_max_body_size() -> usize {
    1024 * 1024
}
