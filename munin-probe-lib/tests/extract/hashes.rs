use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use munin_probe_lib::extract::{body_hash, canonical_headers, header_hash};

#[test]
fn known_murmur3_vectors() {
    assert_eq!(body_hash(b""), "0");
    // murmur3_x86_32("hello", seed 0) = 0x248bfa47
    assert_eq!(body_hash(b"hello"), "613153351");
}

#[test]
fn identical_responses_with_permuted_headers_fingerprint_identically() {
    let body = b"<html><body>same body</body></html>";

    let mut first = HeaderMap::new();
    first.insert(HeaderName::from_static("a"), HeaderValue::from_static("1"));
    first.insert(HeaderName::from_static("b"), HeaderValue::from_static("2"));
    first.insert(HeaderName::from_static("server"), HeaderValue::from_static("nginx"));

    let mut second = HeaderMap::new();
    second.insert(HeaderName::from_static("server"), HeaderValue::from_static("nginx"));
    second.insert(HeaderName::from_static("b"), HeaderValue::from_static("2"));
    second.insert(HeaderName::from_static("a"), HeaderValue::from_static("1"));

    assert_eq!(body_hash(body), body_hash(body));
    assert_eq!(header_hash(&first), header_hash(&second));
}

#[test]
fn multi_valued_headers_keep_every_value() {
    let mut headers = HeaderMap::new();
    headers.append(HeaderName::from_static("set-cookie"), HeaderValue::from_static("a=1"));
    headers.append(HeaderName::from_static("set-cookie"), HeaderValue::from_static("b=2"));

    assert_eq!(canonical_headers(&headers), "set-cookie: a=1\nset-cookie: b=2\n");
}

#[test]
fn different_headers_fingerprint_differently() {
    let mut first = HeaderMap::new();
    first.insert(HeaderName::from_static("server"), HeaderValue::from_static("nginx"));

    let mut second = HeaderMap::new();
    second.insert(HeaderName::from_static("server"), HeaderValue::from_static("apache"));

    assert_ne!(header_hash(&first), header_hash(&second));
}
