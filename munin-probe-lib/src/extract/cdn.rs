use http::HeaderMap;

/// One row of the CDN detection table.
enum Rule {
    /// Header is present at all.
    Present(&'static str, &'static str),
    /// Header value contains the needle, case-insensitively.
    Contains(&'static str, &'static str, &'static str),
}

/// Ordered detection rules; first match wins.
const RULES: &[Rule] = &[
    Rule::Present("cf-ray", "cloudflare"),
    Rule::Contains("server", "cloudflare", "cloudflare"),
    Rule::Present("x-amz-cf-id", "cloudfront"),
    Rule::Contains("via", "cloudfront", "cloudfront"),
    Rule::Present("x-akamai-transformed", "akamai"),
    Rule::Present("akamai-origin-hop", "akamai"),
    Rule::Contains("via", "akamai", "akamai"),
    Rule::Present("x-fastly-request-id", "fastly"),
    Rule::Contains("x-served-by", "cache-", "fastly"),
    Rule::Contains("via", "1.1 google", "google"),
    Rule::Present("x-azure-ref", "azurefrontdoor"),
    Rule::Present("x-sucuri-id", "sucuri"),
    Rule::Present("x-iinfo", "incapsula"),
    Rule::Contains("x-cdn", "incapsula", "incapsula"),
    Rule::Present("x-vercel-id", "vercel"),
    Rule::Contains("server", "vercel", "vercel"),
    Rule::Present("x-nf-request-id", "netlify"),
    Rule::Contains("server", "bunnycdn", "bunny"),
];

/// Scan response headers against the rule table; falls back to a generic
/// `X-CDN` header whose value becomes the name.
pub fn detect_cdn(headers: &HeaderMap) -> Option<String> {
    for rule in RULES {
        match rule {
            Rule::Present(header, name) => {
                if headers.contains_key(*header) {
                    return Some((*name).to_string());
                }
            }
            Rule::Contains(header, needle, name) => {
                let found = headers.get_all(*header).iter().any(|v| {
                    String::from_utf8_lossy(v.as_bytes())
                        .to_ascii_lowercase()
                        .contains(needle)
                });
                if found {
                    return Some((*name).to_string());
                }
            }
        }
    }

    headers.get("x-cdn").map(|v| {
        String::from_utf8_lossy(v.as_bytes())
            .trim()
            .to_ascii_lowercase()
    })
}
