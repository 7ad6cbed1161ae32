use std::fmt;

/// TLS protocol version, as the wire-level canonical string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    V1_0,
    V1_1,
    V1_2,
    V1_3,
}

impl TlsVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsVersion::V1_0 => "1.0",
            TlsVersion::V1_1 => "1.1",
            TlsVersion::V1_2 => "1.2",
            TlsVersion::V1_3 => "1.3",
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application protocol requested for a strategy rung.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http11,
    Http2,
    Http3,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http11 => "HTTP/1.1",
            Protocol::Http2 => "HTTP/2",
            Protocol::Http3 => "HTTP/3",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rung of the HTTPS fallback ladder.
///
/// Pure data: the connector decides how much of it the local TLS stack can
/// honor. `cipher_suites: None` means protocol defaults (TLS 1.3 negotiates
/// its suites automatically).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsStrategy {
    pub name: &'static str,
    pub min_version: TlsVersion,
    pub max_version: TlsVersion,
    pub cipher_suites: Option<&'static [&'static str]>,
    pub protocol: Protocol,
}

/// ECDHE with AES-GCM or ChaCha20-Poly1305 only.
pub const SECURE_SUITES: &[&str] = &[
    "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
];

/// The secure set widened with ECDHE-CBC and then plain-RSA variants.
pub const COMPATIBLE_SUITES: &[&str] = &[
    "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA",
    "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA",
    "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA",
    "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA",
    "TLS_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_RSA_WITH_AES_128_CBC_SHA",
    "TLS_RSA_WITH_AES_256_CBC_SHA",
];

/// The compatible set with 3DES as last resort.
pub const LEGACY_SUITES: &[&str] = &[
    "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA",
    "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA",
    "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA",
    "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA",
    "TLS_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_RSA_WITH_AES_128_CBC_SHA",
    "TLS_RSA_WITH_AES_256_CBC_SHA",
    "TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA",
    "TLS_RSA_WITH_3DES_EDE_CBC_SHA",
];

/// The fixed fallback order tried against an HTTPS target.
///
/// The TLS 1.3 rung requests HTTP/3 unless disabled; without a QUIC client
/// in the build the connector degrades that rung to ALPN h2, and the
/// emitted record reports whatever was actually negotiated.
pub fn strategy_ladder(disable_http3: bool) -> [TlsStrategy; 5] {
    [
        TlsStrategy {
            name: "TLS 1.2 Compatible",
            min_version: TlsVersion::V1_2,
            max_version: TlsVersion::V1_2,
            cipher_suites: Some(COMPATIBLE_SUITES),
            protocol: Protocol::Http11,
        },
        TlsStrategy {
            name: "TLS 1.2 Secure",
            min_version: TlsVersion::V1_2,
            max_version: TlsVersion::V1_2,
            cipher_suites: Some(SECURE_SUITES),
            protocol: Protocol::Http2,
        },
        TlsStrategy {
            name: "TLS 1.3",
            min_version: TlsVersion::V1_3,
            max_version: TlsVersion::V1_3,
            cipher_suites: None,
            protocol: if disable_http3 { Protocol::Http2 } else { Protocol::Http3 },
        },
        TlsStrategy {
            name: "TLS 1.1 Legacy",
            min_version: TlsVersion::V1_1,
            max_version: TlsVersion::V1_1,
            cipher_suites: Some(LEGACY_SUITES),
            protocol: Protocol::Http11,
        },
        TlsStrategy {
            name: "TLS 1.0 Legacy",
            min_version: TlsVersion::V1_0,
            max_version: TlsVersion::V1_0,
            cipher_suites: Some(LEGACY_SUITES),
            protocol: Protocol::Http11,
        },
    ]
}
