use std::fmt;

/// URL scheme a probe speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of splitting a loose host expression.
///
/// The parser is total: any input yields a `ParsedInput`. Garbage inputs
/// surface later through the validator, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    /// The input exactly as given.
    pub original: String,
    /// Present only when the input carried an `http://`/`https://` prefix.
    pub scheme: Option<Scheme>,
    /// Lower-cased host part. An ambiguous `host:token` suffix that is not
    /// a valid port number stays inside the host, colon included.
    pub host: String,
    /// Explicit port, including a scheme-default one (`http://h:80` keeps 80).
    pub port: Option<u16>,
    /// Path plus query plus fragment, never empty, `/` when absent.
    pub path: String,
}

/// Split a loose input into (scheme?, host, port?, path+query+fragment).
///
/// The authority is scanned by hand for both schemed and scheme-less inputs
/// so that explicit default ports survive; stock URL parsers drop `:80` and
/// `:443`, which the target expander needs to see.
pub fn parse_input(input: &str) -> ParsedInput {
    let trimmed = input.trim();

    let (scheme, rest) = if let Some(r) = trimmed.strip_prefix("https://") {
        (Some(Scheme::Https), r)
    } else if let Some(r) = trimmed.strip_prefix("http://") {
        (Some(Scheme::Http), r)
    } else {
        (None, trimmed)
    };

    let split_at = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(split_at);

    let path = match tail.chars().next() {
        None => "/".to_string(),
        Some('/') => tail.to_string(),
        // Query or fragment without a path component hangs off the root.
        Some(_) => format!("/{tail}"),
    };

    let (host, port) = split_host_port(authority);

    ParsedInput {
        original: input.to_string(),
        scheme,
        host: host.to_ascii_lowercase(),
        port,
        path,
    }
}

/// Split `authority` on the first colon; a suffix that is not a decimal
/// port in 1..=65535 keeps the colon inside the host. Bracketed IPv6
/// literals keep their brackets and split after `]`.
fn split_host_port(authority: &str) -> (String, Option<u16>) {
    if authority.starts_with('[') {
        if let Some(close) = authority.find(']') {
            let host = &authority[..=close];
            let rest = &authority[close + 1..];
            if let Some(candidate) = rest.strip_prefix(':') {
                if let Some(port) = parse_port(candidate) {
                    return (host.to_string(), Some(port));
                }
            }
            if rest.is_empty() {
                return (host.to_string(), None);
            }
        }
        return (authority.to_string(), None);
    }

    match authority.split_once(':') {
        Some((host, candidate)) => match parse_port(candidate) {
            Some(port) => (host.to_string(), Some(port)),
            None => (authority.to_string(), None),
        },
        None => (authority.to_string(), None),
    }
}

fn parse_port(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match s.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(p) => Some(p),
    }
}
