use std::collections::BTreeSet;
use thiserror::Error;

/// A port list item that failed to parse, with the reason.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid port item {item:?}: {reason}")]
pub struct PortParseError {
    pub item: String,
    pub reason: String,
}

impl PortParseError {
    fn new(item: &str, reason: impl Into<String>) -> Self {
        Self { item: item.to_string(), reason: reason.into() }
    }
}

/// Parse a comma-separated list of ports and inclusive ranges
/// (`"80,443,8000-8010"`) into a sorted, deduplicated sequence.
///
/// Whitespace around items is trimmed and empty items are skipped; every
/// endpoint must fall in 1..=65535 and ranges must not be inverted.
pub fn parse_port_list(list: &str) -> Result<Vec<String>, PortParseError> {
    let mut set = BTreeSet::new();

    for raw in list.split(',') {
        let item = raw.trim();
        if item.is_empty() {
            continue;
        }

        match item.split_once('-') {
            Some((start, end)) => {
                let start = parse_one(item, start.trim())?;
                let end = parse_one(item, end.trim())?;
                if start > end {
                    return Err(PortParseError::new(item, "range start exceeds end"));
                }
                set.extend(start..=end);
            }
            None => {
                set.insert(parse_one(item, item)?);
            }
        }
    }

    Ok(set.into_iter().map(|p| p.to_string()).collect())
}

fn parse_one(item: &str, s: &str) -> Result<u16, PortParseError> {
    if s.is_empty() {
        return Err(PortParseError::new(item, "missing port number"));
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PortParseError::new(item, "not a decimal number"));
    }
    match s.parse::<u32>() {
        Ok(n) if (1..=65535).contains(&n) => Ok(n as u16),
        Ok(_) => Err(PortParseError::new(item, "port outside 1..65535")),
        Err(e) => Err(PortParseError::new(item, e.to_string())),
    }
}
