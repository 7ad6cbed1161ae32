use std::io::Cursor;

use http::HeaderMap;

/// MurmurHash3 32-bit of the raw bytes, as the signed decimal string the
/// mmh3 ecosystem emits.
pub fn body_hash(body: &[u8]) -> String {
    let hash = murmur3::murmur3_32(&mut Cursor::new(body), 0).unwrap_or_default();
    (hash as i32).to_string()
}

/// Hash of the canonical header serialization; insertion order of the
/// response headers does not affect the result.
pub fn header_hash(headers: &HeaderMap) -> String {
    body_hash(canonical_headers(headers).as_bytes())
}

/// Stable serialization: names sorted ASCII-ascending, one `name: value`
/// line per value.
pub fn canonical_headers(headers: &HeaderMap) -> String {
    let mut names: Vec<&str> = headers.keys().map(|n| n.as_str()).collect();
    names.sort_unstable();
    names.dedup();

    let mut out = String::new();
    for name in names {
        for value in headers.get_all(name) {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(&String::from_utf8_lossy(value.as_bytes()));
            out.push('\n');
        }
    }
    out
}
