use std::sync::Arc;

use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{aws_lc_rs, CryptoProvider};
use tokio_rustls::rustls::{
    self, version, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};

use crate::error::{ProbeError, Result};
use crate::tls::cipher_suites::resolve_cipher_suites;
use crate::tls::strategy::{Protocol, TlsStrategy, TlsVersion};

/// Build the rustls client configuration for one strategy rung.
///
/// rustls does not implement TLS 1.0/1.1; legacy rungs clamp to the widest
/// TLS 1.2 configuration the stack offers, which keeps them as real
/// handshake attempts instead of guaranteed local failures.
pub fn build_client_config(strategy: &TlsStrategy, insecure_skip_verify: bool) -> Result<ClientConfig> {
    let provider = Arc::new(provider_for(strategy));

    let versions: &[&'static rustls::SupportedProtocolVersion] =
        if strategy.max_version >= TlsVersion::V1_3 {
            if strategy.min_version >= TlsVersion::V1_3 {
                &[&version::TLS13]
            } else {
                &[&version::TLS12, &version::TLS13]
            }
        } else {
            &[&version::TLS12]
        };

    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(versions)
        .map_err(|e| ProbeError::Connection(format!("tls: {e}")))?;

    let mut config = if insecure_skip_verify {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerification { provider }))
            .with_no_client_auth()
    } else {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder.with_root_certificates(roots).with_no_client_auth()
    };

    config.alpn_protocols = alpn_for(strategy.protocol);

    Ok(config)
}

fn provider_for(strategy: &TlsStrategy) -> CryptoProvider {
    let mut provider = aws_lc_rs::default_provider();
    if let Some(names) = strategy.cipher_suites {
        let resolved = resolve_cipher_suites(names);
        if !resolved.is_empty() {
            provider.cipher_suites = resolved;
        }
    }
    provider
}

/// ALPN advertisement per requested protocol. A requested HTTP/3 rung
/// degrades to h2 here: no QUIC client is built in, and the record reports
/// the protocol that was actually negotiated.
fn alpn_for(protocol: Protocol) -> Vec<Vec<u8>> {
    match protocol {
        Protocol::Http11 => vec![b"http/1.1".to_vec()],
        Protocol::Http2 | Protocol::Http3 => vec![b"h2".to_vec(), b"http/1.1".to_vec()],
    }
}

/// Render a rustls error the way peers on the wire describe it, so the
/// connection-level predicate and the SNI heuristic can match on it.
pub fn tls_error_string(err: &rustls::Error) -> String {
    match err {
        rustls::Error::AlertReceived(alert) => {
            format!("remote error: tls: {}", spaced_lowercase(&format!("{alert:?}")))
        }
        other => format!("tls: {other}"),
    }
}

/// `HandshakeFailure` -> `handshake failure`.
fn spaced_lowercase(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            out.push(' ');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Accept-everything verifier behind `insecure_skip_verify`.
///
/// Signature checks are skipped along with chain validation; recon targets
/// routinely present expired, self-signed, or hostname-mismatched
/// certificates that are themselves part of the result.
#[derive(Debug)]
struct NoVerification {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}
