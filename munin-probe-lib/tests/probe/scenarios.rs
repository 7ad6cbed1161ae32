use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Response};
use http_body_util::Full;
use munin_probe_lib::{ProbeConfig, ProbeEngine, TechDetector};

use super::helpers::{response, spawn_server, test_config, Handler};

async fn probe(config: ProbeConfig, url: &str) -> munin_probe_lib::ProbeResult {
    let engine = Arc::new(ProbeEngine::new(Arc::new(config)));
    engine.probe_target(url, url).await
}

#[tokio::test]
async fn response_metadata_lands_in_the_record() {
    let body = "<html><head><title>  Munin   Test  </title></head>\n<body>alpha beta gamma</body>\n</html>";
    let handler: Handler = Arc::new(move |_| {
        Response::builder()
            .status(200)
            .header("server", "nginx/1.25.4")
            .header("content-type", "text/html; charset=utf-8")
            .header(
                "content-security-policy",
                "default-src 'self' cdn.assets.example.net; script-src https://js.example.org",
            )
            .header("cf-ray", "8d1f2abc-TEST")
            .body(Full::new(Bytes::from(body)))
            .expect("response")
    });
    let addr = spawn_server(handler).await;

    let record = probe(test_config(), &format!("http://{addr}/")).await;

    assert_eq!(record.error, None);
    assert_eq!(record.method, "GET");
    assert_eq!(record.webserver, "nginx/1.25.4");
    assert_eq!(record.content_type, "text/html");
    assert_eq!(record.title, "Munin Test");
    assert!(record.words > 0);
    assert!(record.lines > 0);
    assert!(!record.hash.body_mmh3.is_empty());
    assert!(!record.hash.header_mmh3.is_empty());
    assert_eq!(record.cdn, Some(true));
    assert_eq!(record.cdn_name.as_deref(), Some("cloudflare"));

    let domains = record.discovered_domains.expect("csp domains");
    assert!(domains.domains.contains(&"cdn.assets.example.net".to_string()));
    assert!(domains.domains.contains(&"js.example.org".to_string()));
    assert_eq!(domains.domain_sources["js.example.org"], "csp");

    let stamp = chrono::DateTime::parse_from_rfc3339(&record.timestamp);
    assert!(stamp.is_ok(), "timestamp must be RFC3339: {}", record.timestamp);
}

#[tokio::test]
async fn authoritative_4xx_is_a_clean_record() {
    let handler: Handler = Arc::new(|_| response(404, "nothing here"));
    let addr = spawn_server(handler).await;

    let record = probe(test_config(), &format!("http://{addr}/missing")).await;

    assert_eq!(record.error, None, "a completed 404 is a result, not a failure");
    assert_eq!(record.status_code, 404);
    assert_eq!(record.chain_status_codes, vec![404]);
}

#[tokio::test]
async fn truncated_bodies_are_capped_at_the_limit() {
    let big = "x".repeat(64 * 1024);
    let handler: Handler = Arc::new(move |_| response(200, &big));
    let addr = spawn_server(handler).await;

    let config = ProbeConfig { max_body_size: 1024, ..test_config() };
    let record = probe(config, &format!("http://{addr}/")).await;

    assert_eq!(record.error, None);
    // words/lines reflect only what was read under the cap.
    assert_eq!(record.words, 1);
    assert_eq!(record.lines, 1);
    // Content-Length still reports what the server declared.
    assert_eq!(record.content_length, 64 * 1024);
}

#[tokio::test]
async fn connection_refused_surfaces_as_a_dial_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let record = probe(test_config(), &format!("http://{addr}/")).await;

    let error = record.error.expect("refused connection must fail");
    assert!(
        error.to_ascii_lowercase().contains("connection refused"),
        "got: {error}"
    );
    assert!(munin_probe_lib::is_connection_error(&error));
}

#[tokio::test]
async fn compressed_bodies_are_decoded_before_extraction() {
    use async_compression::tokio::bufread::GzipEncoder;
    use tokio::io::AsyncReadExt;

    let page = format!(
        "<html><head><title>Zipped</title></head><body>{}</body></html>",
        "alpha beta gamma ".repeat(50)
    );
    let mut zipped = Vec::new();
    GzipEncoder::new(page.as_bytes()).read_to_end(&mut zipped).await.expect("gzip encode");
    let zipped = Bytes::from(zipped);

    let handler: Handler = Arc::new(move |_| {
        Response::builder()
            .status(200)
            .header("content-type", "text/html")
            .header("content-encoding", "gzip")
            .body(Full::new(zipped.clone()))
            .expect("response")
    });
    let addr = spawn_server(handler).await;

    let record = probe(test_config(), &format!("http://{addr}/")).await;

    assert_eq!(record.error, None);
    assert_eq!(record.title, "Zipped");
    assert!(record.words >= 3, "counters must see the decoded body");
    // The wire-level declared length is the compressed one.
    assert!(record.content_length < page.len());
}

#[tokio::test]
async fn requests_advertise_compression_support() {
    let handler: Handler = Arc::new(|req| {
        let encodings = req
            .headers()
            .get("accept-encoding")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none")
            .to_string();
        response(200, &encodings)
    });
    let addr = spawn_server(handler).await;

    let record = probe(test_config(), &format!("http://{addr}/")).await;

    assert_eq!(record.error, None);
    // The body is the echoed Accept-Encoding header.
    assert_eq!(
        record.hash.body_mmh3,
        munin_probe_lib::extract::body_hash(b"gzip, deflate, br")
    );
}

struct ServerHeaderDetector;

impl TechDetector for ServerHeaderDetector {
    fn detect(&self, headers: &HeaderMap, _body: &[u8]) -> Vec<String> {
        headers
            .get("server")
            .and_then(|v| v.to_str().ok())
            .map(|s| vec![s.split('/').next().unwrap_or(s).to_string()])
            .unwrap_or_default()
    }
}

#[tokio::test]
async fn tech_detector_labels_land_in_the_record() {
    let handler: Handler = Arc::new(|_| {
        Response::builder()
            .status(200)
            .header("server", "caddy/2.8")
            .body(Full::new(Bytes::from_static(b"hi")))
            .expect("response")
    });
    let addr = spawn_server(handler).await;

    let engine = Arc::new(
        ProbeEngine::new(Arc::new(test_config())).with_tech_detector(Arc::new(ServerHeaderDetector)),
    );
    let url = format!("http://{addr}/");
    let record = engine.probe_target(&url, &url).await;

    assert_eq!(record.technologies, vec!["caddy"]);
}

#[tokio::test]
async fn url_fields_describe_the_final_location() {
    let handler: Handler = Arc::new(|req| match req.uri().path() {
        "/" => response(200, "root"),
        _ => response(404, ""),
    });
    let addr = spawn_server(handler).await;

    let record = probe(test_config(), &format!("http://{addr}")).await;

    assert_eq!(record.scheme, "http");
    assert_eq!(record.host, "127.0.0.1");
    assert_eq!(record.port, addr.port().to_string());
    assert_eq!(record.path, "/");
    assert_eq!(record.final_url, format!("http://{addr}/"));
}
