use url::Url;

/// Directives whose source lists can name external hosts.
const SOURCE_DIRECTIVES: &[&str] = &[
    "default-src",
    "script-src",
    "style-src",
    "img-src",
    "connect-src",
    "font-src",
    "frame-src",
    "media-src",
    "object-src",
    "form-action",
    "frame-ancestors",
    "child-src",
    "worker-src",
    "manifest-src",
];

/// Pull host names out of a `Content-Security-Policy` header value.
///
/// Keyword sources, scheme literals, wildcards, nonces, and hashes are
/// skipped; what remains must look like a domain (`.` somewhere, or a
/// `*.` wildcard prefix) to count.
pub fn extract_csp_domains(header: &str) -> Vec<String> {
    let mut domains = Vec::new();

    for directive in header.split(';') {
        let mut tokens = directive.split_whitespace();
        let Some(name) = tokens.next() else {
            continue;
        };
        if !SOURCE_DIRECTIVES.contains(&name.to_ascii_lowercase().as_str()) {
            continue;
        }
        for token in tokens {
            if let Some(domain) = source_to_domain(token) {
                if !domains.contains(&domain) {
                    domains.push(domain);
                }
            }
        }
    }

    domains
}

fn source_to_domain(token: &str) -> Option<String> {
    // Quoted keywords ('self', 'none', 'unsafe-*', 'strict-dynamic',
    // 'report-sample', 'wasm-unsafe-eval'), nonces, and hashes.
    if token.starts_with('\'') {
        return None;
    }
    if token == "*" {
        return None;
    }
    // Scheme literals such as data:, blob:, https:.
    if token.ends_with(':') && !token.contains("//") {
        return None;
    }

    let host = if token.contains("://") {
        let url = Url::parse(token).ok()?;
        url.host_str()?.to_string()
    } else {
        strip_port_and_path(token)
    };

    let host = host.to_ascii_lowercase();
    if host.contains('.') || host.starts_with("*.") {
        Some(host)
    } else {
        None
    }
}

/// Reduce a host-source pattern to its host part, preserving bracketed
/// IPv6 literals.
fn strip_port_and_path(token: &str) -> String {
    let no_path = token.split('/').next().unwrap_or(token);
    if let Some(rest) = no_path.strip_prefix('[') {
        match rest.find(']') {
            Some(end) => return format!("[{}]", &rest[..end]),
            None => return no_path.to_string(),
        }
    }
    match no_path.split_once(':') {
        Some((host, _port)) => host.to_string(),
        None => no_path.to_string(),
    }
}
