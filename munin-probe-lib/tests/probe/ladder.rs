use std::sync::Arc;

use munin_probe_lib::ProbeEngine;
use tokio_rustls::rustls::version;

use super::helpers::{
    response, spawn_sni_required_server, spawn_tls_h2_server, spawn_tls_server, test_config,
    Handler,
};

#[tokio::test]
async fn tls13_only_server_is_reached_on_the_third_rung() {
    let handler: Handler = Arc::new(|_| response(200, "<title>v13</title>"));
    let addr = spawn_tls_server(&[&version::TLS13], handler).await;

    let engine = Arc::new(ProbeEngine::new(Arc::new(test_config())));
    let url = format!("https://{addr}/");
    let record = engine.probe_target(&url, &url).await;

    assert_eq!(record.error, None, "ladder should land on the TLS 1.3 rung");
    assert_eq!(record.tls_config_strategy.as_deref(), Some("TLS 1.3"));
    assert_eq!(record.tls_version.as_deref(), Some("1.3"));
    assert_eq!(record.status_code, 200);
    assert_eq!(record.title, "v13");

    let tls = record.tls.expect("tls info");
    assert_eq!(tls.version, "1.3");
    let leaf = tls.certificate.expect("leaf certificate");
    assert!(leaf.subject_alternative_names.contains(&"localhost".to_string()));
    assert!(leaf.self_signed);
}

#[tokio::test]
async fn tls12_server_is_served_by_the_first_rung() {
    let handler: Handler = Arc::new(|_| response(200, "ok"));
    let addr = spawn_tls_server(&[&version::TLS12], handler).await;

    let engine = Arc::new(ProbeEngine::new(Arc::new(test_config())));
    let url = format!("https://{addr}/");
    let record = engine.probe_target(&url, &url).await;

    assert_eq!(record.error, None);
    assert_eq!(record.tls_config_strategy.as_deref(), Some("TLS 1.2 Compatible"));
    assert_eq!(record.tls_version.as_deref(), Some("1.2"));
    assert!(record.cipher_suite.as_deref().unwrap_or_default().starts_with("TLS_"));
}

#[tokio::test]
async fn h2_only_server_falls_through_to_the_secure_rung() {
    let handler: Handler = Arc::new(|_| response(200, "over h2"));
    let addr = spawn_tls_h2_server(handler).await;

    let engine = Arc::new(ProbeEngine::new(Arc::new(test_config())));
    let url = format!("https://{addr}/");
    let record = engine.probe_target(&url, &url).await;

    // Rung 1 offers only http/1.1 and is rejected with a no-overlap
    // alert; rung 2 negotiates h2 over TLS 1.2.
    assert_eq!(record.error, None);
    assert_eq!(record.tls_config_strategy.as_deref(), Some("TLS 1.2 Secure"));
    assert_eq!(record.protocol, "HTTP/2");
    assert_eq!(record.tls_version.as_deref(), Some("1.2"));
    assert_eq!(record.status_code, 200);
}

#[tokio::test]
async fn bare_ip_handshake_failures_raise_the_sni_diagnostic() {
    let addr = spawn_sni_required_server().await;

    let engine = Arc::new(ProbeEngine::new(Arc::new(test_config())));
    // Probing the IP literal means the client sends no SNI, so every rung
    // fails with a handshake alert.
    let url = format!("https://{addr}/");
    let record = engine.probe_target(&url, &url).await;

    let error = record.error.as_deref().expect("all rungs must fail");
    assert!(error.starts_with("All TLS attempts failed: "), "got: {error}");
    assert_eq!(record.sni_required, Some(true), "diagnostic flag expected: {error}");
    // Diagnostic records reach the emitter despite the error.
    assert!(record.diagnostic());
}

#[tokio::test]
async fn plaintext_origin_exhausts_the_ladder_with_an_aggregate_error() {
    let handler: Handler = Arc::new(|_| response(200, "plain"));
    let addr = super::helpers::spawn_server(handler).await;

    let engine = Arc::new(ProbeEngine::new(Arc::new(test_config())));
    let url = format!("https://{addr}/");
    let record = engine.probe_target(&url, &url).await;

    let error = record.error.expect("every rung must fail");
    assert!(error.starts_with("All TLS attempts failed: "), "got: {error}");
    // Every rung's failure is recorded with its strategy prefix.
    assert!(error.contains("TLS 1.2 Compatible (HTTP/1.1):"));
    assert!(error.contains("TLS 1.0 Legacy (HTTP/1.1):"));
    // Plaintext chatter is not a handshake alert, so no SNI diagnostic.
    assert_eq!(record.sni_required, None);
}
