use tokio_rustls::rustls::crypto::aws_lc_rs;
use tokio_rustls::rustls::SupportedCipherSuite;

/// Map requested suite names onto the provider's implementations, keeping
/// the requested order. rustls only implements modern suites, so the
/// CBC/3DES entries in the strategy tables resolve to nothing and are
/// dropped here.
///
/// TLS 1.3 suites are always appended so a config built from a TLS 1.2
/// selection still handshakes if the version set widens.
pub fn resolve_cipher_suites(names: &[&str]) -> Vec<SupportedCipherSuite> {
    let all = aws_lc_rs::ALL_CIPHER_SUITES;

    let mut resolved: Vec<SupportedCipherSuite> = names
        .iter()
        .filter_map(|name| {
            all.iter()
                .find(|s| format!("{:?}", s.suite()) == *name)
                .copied()
        })
        .collect();

    for suite in all {
        let is_tls13 = matches!(suite, SupportedCipherSuite::Tls13(_));
        if is_tls13 && !resolved.iter().any(|r| r.suite() == suite.suite()) {
            resolved.push(*suite);
        }
    }

    resolved
}
