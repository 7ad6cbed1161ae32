use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_compression::tokio::bufread::{BrotliDecoder, DeflateDecoder, GzipDecoder};
use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_ENCODING, HOST};
use http::{HeaderMap, HeaderValue, Method, Request, StatusCode, Version};
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo};
use rustls_pki_types::ServerName;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::{self, ClientConfig, ProtocolVersion};
use tokio_rustls::TlsConnector;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::client::dns::DnsCache;
use crate::error::{ProbeError, Result};
use crate::tls::tls_error_string;

pub type PlainClient = Client<HttpConnector, Empty<Bytes>>;

/// TLS parameters observed on a completed handshake.
#[derive(Debug, Clone)]
pub struct TlsSession {
    /// Canonical version string: "1.0" | "1.1" | "1.2" | "1.3".
    pub version: String,
    pub cipher_suite: String,
    pub alpn: Option<String>,
    /// DER certificates as presented by the peer, leaf first.
    pub peer_certificates: Vec<Vec<u8>>,
}

/// One completed request/response, body already drained (up to the cap).
#[derive(Debug)]
pub struct Exchange {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub truncated: bool,
    pub version: Version,
    pub tls: Option<TlsSession>,
}

impl Exchange {
    /// Protocol label derived from what was actually negotiated.
    pub fn protocol_label(&self) -> &'static str {
        match self.version {
            Version::HTTP_2 => "HTTP/2",
            Version::HTTP_3 => "HTTP/3",
            _ => "HTTP/1.1",
        }
    }
}

/// Executes single GET exchanges against arbitrary http/https URLs.
///
/// Plain HTTP goes through a shared pooled client; HTTPS dials manually so
/// the rustls session can be introspected for version, cipher suite, ALPN,
/// and the peer chain before the HTTP exchange starts.
pub struct ProbeClient {
    pub(crate) plain: PlainClient,
    pub(crate) tls_config: Arc<ClientConfig>,
    pub(crate) dns: Arc<DnsCache>,
    pub(crate) dial_timeout: Duration,
    pub(crate) max_body_size: usize,
}

impl ProbeClient {
    pub async fn execute(
        &self,
        url: &Url,
        headers: &HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<Exchange> {
        match url.scheme() {
            "https" => self.execute_tls(url, headers, cancel).await,
            _ => self.execute_plain(url, headers, cancel).await,
        }
    }

    async fn execute_plain(
        &self,
        url: &Url,
        headers: &HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<Exchange> {
        let mut req = Request::builder()
            .method(Method::GET)
            .uri(url.as_str())
            .body(Empty::<Bytes>::new())
            .map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;
        *req.headers_mut() = headers.clone();

        trace!(%url, "plain http exchange");
        let response = checked(cancel, async {
            self.plain
                .request(req)
                .await
                .map_err(|e| ProbeError::Connection(innermost_message(&e)))
        })
        .await?;

        self.drain(response, None, cancel).await
    }

    async fn execute_tls(
        &self,
        url: &Url,
        headers: &HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<Exchange> {
        let host = url
            .host_str()
            .ok_or_else(|| ProbeError::InvalidUrl(format!("no host in {url}")))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(443);

        let tcp = checked(cancel, self.dial(&host, port)).await?;

        let bare = host.trim_start_matches('[').trim_end_matches(']').to_string();
        let server_name = ServerName::try_from(bare)
            .map_err(|_| ProbeError::Connection(format!("tls: invalid server name {host}")))?;
        let connector = TlsConnector::from(self.tls_config.clone());

        let tls_stream = checked(cancel, async {
            match timeout(self.dial_timeout, connector.connect(server_name, tcp)).await {
                Ok(Ok(stream)) => Ok(stream),
                Ok(Err(e)) => Err(ProbeError::Connection(rustls_io_error_string(&e))),
                Err(_) => Err(ProbeError::Connection("tls: handshake i/o timeout".into())),
            }
        })
        .await?;

        let session = {
            let (_, conn) = tls_stream.get_ref();
            TlsSession {
                version: protocol_version_label(conn.protocol_version()),
                cipher_suite: conn
                    .negotiated_cipher_suite()
                    .map(|s| format!("{:?}", s.suite()))
                    .unwrap_or_default(),
                alpn: conn
                    .alpn_protocol()
                    .map(|p| String::from_utf8_lossy(p).into_owned()),
                peer_certificates: conn
                    .peer_certificates()
                    .map(|certs| certs.iter().map(|c| c.as_ref().to_vec()).collect())
                    .unwrap_or_default(),
            }
        };
        debug!(%url, version = %session.version, alpn = ?session.alpn, "tls session established");

        let response = if session.alpn.as_deref() == Some("h2") {
            let (mut sender, conn) =
                hyper::client::conn::http2::handshake(TokioExecutor::new(), TokioIo::new(tls_stream))
                    .await
                    .map_err(|e| ProbeError::Connection(innermost_message(&e)))?;
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    trace!(error = %e, "h2 connection task ended");
                }
            });

            let mut req = Request::builder()
                .method(Method::GET)
                .uri(url.as_str())
                .body(Empty::<Bytes>::new())
                .map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;
            *req.headers_mut() = headers.clone();
            // :authority carries the target; a Host header is redundant on h2.
            req.headers_mut().remove(HOST);

            checked(cancel, async {
                sender
                    .send_request(req)
                    .await
                    .map_err(|e| ProbeError::Connection(innermost_message(&e)))
            })
            .await?
        } else {
            let (mut sender, conn) =
                hyper::client::conn::http1::handshake(TokioIo::new(tls_stream))
                    .await
                    .map_err(|e| ProbeError::Connection(innermost_message(&e)))?;
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    trace!(error = %e, "h1 connection task ended");
                }
            });

            let path = match url.query() {
                Some(q) => format!("{}?{}", url.path(), q),
                None => url.path().to_string(),
            };
            let mut req = Request::builder()
                .method(Method::GET)
                .uri(path)
                .body(Empty::<Bytes>::new())
                .map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;
            *req.headers_mut() = headers.clone();
            req.headers_mut().insert(
                HOST,
                HeaderValue::from_str(&host_header_value(url))
                    .map_err(|e| ProbeError::InvalidUrl(e.to_string()))?,
            );

            checked(cancel, async {
                sender
                    .send_request(req)
                    .await
                    .map_err(|e| ProbeError::Connection(innermost_message(&e)))
            })
            .await?
        };

        self.drain(response, Some(session), cancel).await
    }

    async fn dial(&self, host: &str, port: u16) -> Result<TcpStream> {
        let addrs = self.dns.resolve(host, port).await?;
        let mut last_err =
            ProbeError::Connection(format!("dial tcp {host}:{port}: no addresses"));
        for addr in addrs {
            match timeout(self.dial_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => return Ok(stream),
                Ok(Err(e)) => last_err = ProbeError::Connection(format!("dial tcp {addr}: {e}")),
                Err(_) => {
                    last_err = ProbeError::Connection(format!("dial tcp {addr}: i/o timeout"))
                }
            }
        }
        Err(last_err)
    }

    async fn drain(
        &self,
        response: http::Response<Incoming>,
        tls: Option<TlsSession>,
        cancel: &CancellationToken,
    ) -> Result<Exchange> {
        let version = response.version();
        let (parts, body) = response.into_parts();
        let (body, truncated) =
            checked(cancel, read_body_limited(body, self.max_body_size)).await?;

        let encoding = parts
            .headers
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        let (body, truncated) = decode_body(&encoding, body, self.max_body_size, truncated).await;

        Ok(Exchange {
            status: parts.status,
            headers: parts.headers,
            body,
            truncated,
            version,
            tls,
        })
    }
}

/// Decode a gzip/deflate/brotli body back to its identity form so the
/// title, counters, and fingerprint hashes see the real bytes. The size
/// cap applies to the decoded output; a stream cut short by the raw cap
/// decodes as far as it goes.
async fn decode_body(encoding: &str, raw: Bytes, cap: usize, raw_truncated: bool) -> (Bytes, bool) {
    let (decoded, decode_truncated, failed) = match encoding {
        "gzip" | "x-gzip" => decode_stream(GzipDecoder::new(raw.as_ref()), cap).await,
        "deflate" => decode_stream(DeflateDecoder::new(raw.as_ref()), cap).await,
        "br" => decode_stream(BrotliDecoder::new(raw.as_ref()), cap).await,
        // Identity, unknown, or stacked encodings pass through untouched.
        _ => return (raw, raw_truncated),
    };

    if failed && decoded.is_empty() && !raw.is_empty() {
        // The Content-Encoding header lied; keep the bytes as received.
        trace!(encoding, "body did not decode, keeping raw bytes");
        return (raw, raw_truncated);
    }

    (Bytes::from(decoded), raw_truncated || decode_truncated)
}

/// Drain a decoder up to `cap` bytes, keeping whatever decoded cleanly
/// when the stream is corrupt or was cut short by the raw read cap.
async fn decode_stream<R>(mut reader: R, cap: usize) -> (Vec<u8>, bool, bool)
where
    R: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;

    let mut decoded = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut truncated = false;
    let mut failed = false;

    loop {
        if decoded.len() >= cap {
            truncated = true;
            break;
        }
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let keep = n.min(cap - decoded.len());
                decoded.extend_from_slice(&chunk[..keep]);
                if keep < n {
                    truncated = true;
                    break;
                }
            }
            Err(_) => {
                failed = true;
                break;
            }
        }
    }

    (decoded, truncated, failed)
}

/// Read up to `cap` body bytes; a body that still has data at the cap is
/// cut there and flagged truncated rather than failed.
async fn read_body_limited(mut body: Incoming, cap: usize) -> Result<(Bytes, bool)> {
    let mut buf = BytesMut::new();
    let mut truncated = false;

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| ProbeError::BodyRead(innermost_message(&e)))?;
        let Ok(data) = frame.into_data() else {
            continue;
        };
        let remaining = cap.saturating_sub(buf.len());
        if data.len() >= remaining {
            buf.extend_from_slice(&data[..remaining]);
            truncated = true;
            break;
        }
        buf.extend_from_slice(&data);
    }

    Ok((buf.freeze(), truncated))
}

/// Host header value: hostname plus the port only when the URL spells a
/// non-default one. Some origins reject `Host: example.com:443`.
fn host_header_value(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(h), Some(p)) => format!("{h}:{p}"),
        (Some(h), None) => h.to_string(),
        _ => String::new(),
    }
}

fn protocol_version_label(version: Option<ProtocolVersion>) -> String {
    match version {
        Some(ProtocolVersion::TLSv1_3) => "1.3".to_string(),
        Some(ProtocolVersion::TLSv1_2) => "1.2".to_string(),
        Some(ProtocolVersion::TLSv1_1) => "1.1".to_string(),
        Some(ProtocolVersion::TLSv1_0) => "1.0".to_string(),
        _ => String::new(),
    }
}

/// tokio-rustls surfaces handshake failures as io::Error wrapping the
/// rustls error; unwrap it so alerts keep their wire wording.
fn rustls_io_error_string(err: &std::io::Error) -> String {
    if let Some(inner) = err.get_ref() {
        if let Some(tls) = inner.downcast_ref::<rustls::Error>() {
            return tls_error_string(tls);
        }
    }
    format!("tls: {err}")
}

/// Innermost source in an error chain; hyper wraps the io error that
/// carries the wording ("connection refused", "connection reset") the
/// connection-level predicate matches on.
fn innermost_message(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(source) = current {
        message = source.to_string();
        current = source.source();
    }
    if message.contains("failed to lookup address") || message.contains("Name or service not known")
    {
        return "no such host".to_string();
    }
    message
}

/// Run `fut` unless the shared token fires first.
async fn checked<F, T>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(ProbeError::Cancelled),
        res = fut => res,
    }
}
