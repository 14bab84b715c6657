//! Rule-based extraction of HTTP request fields from a log line

use serde::{Deserialize, Serialize};

/// Transport protocol reported in a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "HTTPS")]
    Https,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "HTTP"),
            Protocol::Https => write!(f, "HTTPS"),
            Protocol::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// Request fields extracted from a single valid log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRequest {
    pub method: String,
    pub path: String,
    pub status: u32,
    pub protocol: Protocol,
}

impl ParsedRequest {
    /// Sentinel substituted as a whole when extraction fails. Partial
    /// successes are discarded, never mixed with sentinel fields.
    pub fn sentinel() -> Self {
        Self {
            method: "UNKNOWN".to_string(),
            path: "/".to_string(),
            status: 0,
            protocol: Protocol::NotApplicable,
        }
    }
}

/// Attempts to extract {method, path, status, protocol} from a log line.
///
/// The quoted request line is the second `"`-delimited segment and must split
/// into exactly three whitespace tokens; the status code is the last
/// whitespace token of the whole line. Returns `None` on any failure so the
/// caller substitutes [`ParsedRequest::sentinel`] as a single unit.
pub fn try_parse(line: &str) -> Option<ParsedRequest> {
    let request_part = line.split('"').nth(1)?;

    let mut tokens = request_part.split_whitespace();
    let method = tokens.next()?;
    let path = tokens.next()?;
    let _version = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }

    let status: u32 = line.split_whitespace().next_back()?.parse().ok()?;

    let protocol = if line.contains("HTTPS") {
        Protocol::Https
    } else {
        Protocol::Http
    };

    Some(ParsedRequest {
        method: method.to_string(),
        path: path.to_string(),
        status,
        protocol,
    })
}

/// Total variant of [`try_parse`]: degrades to the sentinel instead of failing.
pub fn parse(line: &str) -> ParsedRequest {
    try_parse(line).unwrap_or_else(ParsedRequest::sentinel)
}
