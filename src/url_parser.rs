//! URL helpers: path and query extraction for outgoing request URLs.

use serde_json::{Map, Value};
use url::Url;

/// Base used to resolve relative URLs.
pub const DEFAULT_BASE: &str = "http://localhost";

/// Path and decoded query parameters of a URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedUrl {
    pub path: String,
    pub query: Map<String, Value>,
}

/// Parse `url` relative to `base` (default `http://localhost`).
///
/// Repeated query keys keep their last value. If either the base or the
/// URL cannot be parsed, the input is returned as the path with no query.
pub fn parse_url(url: &str, base: Option<&str>) -> ParsedUrl {
    let parsed = Url::parse(base.unwrap_or(DEFAULT_BASE)).and_then(|base| base.join(url));

    match parsed {
        Ok(parsed) => {
            let mut query = Map::new();
            for (key, value) in parsed.query_pairs() {
                query.insert(key.into_owned(), Value::String(value.into_owned()));
            }
            ParsedUrl {
                path: parsed.path().to_string(),
                query,
            }
        }
        Err(_) => ParsedUrl {
            path: url.to_string(),
            query: Map::new(),
        },
    }
}

/// Resolve the path used for route matching.
///
/// When `url` starts with `base_url`, the prefix is stripped before
/// parsing so the matched path excludes it.
pub fn resolve_request_path(url: &str, base_url: Option<&str>) -> ParsedUrl {
    match base_url {
        Some(base) if !base.is_empty() && url.starts_with(base) => {
            parse_url(&url[base.len()..], None)
        }
        _ => parse_url(url, None),
    }
}
