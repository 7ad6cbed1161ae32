use serde::Serialize;

use crate::extract::{CertificateInfo, DiscoveredDomains};

/// Body and canonical-header fingerprints.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct HashInfo {
    pub body_mmh3: String,
    pub header_mmh3: String,
}

/// Negotiated TLS parameters plus the parsed certificate material.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TlsInfo {
    pub version: String,
    pub cipher: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<CertificateInfo>,
}

/// One emitted record per probe; the JSON schema consumed downstream.
///
/// Optional annotation fields serialize only when present, everything else
/// is always on the wire (empty strings included) so consumers can rely on
/// the shape.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    /// RFC3339 UTC.
    pub timestamp: String,
    pub hash: HashInfo,
    /// Probed port as a string, defaulted from the scheme when the URL
    /// does not spell it.
    pub port: String,
    /// The URL this probe actually requested.
    pub url: String,
    /// The original input line this probe expanded from.
    pub input: String,
    /// Where the redirect chain ended up.
    pub final_url: String,
    pub title: String,
    pub scheme: String,
    /// Server response header, verbatim.
    pub webserver: String,
    pub content_type: String,
    pub method: String,
    pub host: String,
    pub path: String,
    /// Wall-clock duration of the attempt, e.g. "412.58ms".
    pub time: String,
    pub chain_status_codes: Vec<u16>,
    pub chain_hosts: Vec<String>,
    pub words: usize,
    pub lines: usize,
    pub status_code: u16,
    pub content_length: usize,
    /// Negotiated application protocol: "HTTP/1.1" | "HTTP/2" | "HTTP/3".
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher_suite: Option<String>,
    /// Ladder rung that produced the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_config_strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovered_domains: Option<DiscoveredDomains>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cname: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<String>,
    /// Diagnostic: every ladder rung failed the handshake against a bare
    /// IP, consistent with the server requiring SNI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni_required: Option<bool>,
    /// Empty on success; a non-empty value means the emitter skips the
    /// record unless a diagnostic flag is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    /// Skeleton with every mandatory field present and empty.
    pub fn new(input: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            hash: HashInfo::default(),
            port: String::new(),
            url: url.into(),
            input: input.into(),
            final_url: String::new(),
            title: String::new(),
            scheme: String::new(),
            webserver: String::new(),
            content_type: String::new(),
            method: "GET".to_string(),
            host: String::new(),
            path: String::new(),
            time: String::new(),
            chain_status_codes: Vec::new(),
            chain_hosts: Vec::new(),
            words: 0,
            lines: 0,
            status_code: 0,
            content_length: 0,
            protocol: String::new(),
            tls_version: None,
            cipher_suite: None,
            tls_config_strategy: None,
            tls: None,
            discovered_domains: None,
            cdn: None,
            cdn_name: None,
            cname: None,
            technologies: Vec::new(),
            sni_required: None,
            error: None,
        }
    }

    pub fn failed(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// True when the record should reach the emitter despite a non-empty
    /// error.
    pub fn diagnostic(&self) -> bool {
        self.sni_required == Some(true)
    }
}
