//! Request and response types flowing through the mock pipeline.

use crate::config::{MockOptions, MockOverride};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Descriptor of the request the HTTP client is about to send.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutgoingRequest {
    /// HTTP method (defaults to GET when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Request URL, absolute or relative to `base_url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Explicit query parameters
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,

    /// Request payload. A JSON-encoded string payload is `Value::String`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Per-request mock override
    #[serde(skip)]
    pub mock: Option<MockOverride>,
}

impl OutgoingRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new("POST", url)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_mock(mut self, mock: impl Into<MockOverride>) -> Self {
        self.mock = Some(mock.into());
        self
    }

    pub fn with_mock_options(self, options: MockOptions) -> Self {
        self.with_mock(MockOverride::Options(options))
    }

    /// Uppercased method, `GET` when unset.
    pub fn method_or_default(&self) -> String {
        self.method
            .as_deref()
            .unwrap_or("GET")
            .to_ascii_uppercase()
    }

    pub fn url_or_empty(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }
}

/// Structured request handed to hooks and handlers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MockRequest {
    /// Path parameters extracted by the matcher
    pub params: HashMap<String, String>,
    /// Explicit query parameters overlaid with the URL query
    pub query: Map<String, Value>,
    /// Parsed payload
    pub body: Value,
}

impl MockRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Synthesized response.
#[derive(Debug, Clone, Serialize)]
pub struct MockResponse {
    pub data: Value,
    pub status: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    /// The outgoing request this response answers
    pub config: OutgoingRequest,
}

impl MockResponse {
    pub fn ok(data: Value, headers: HashMap<String, String>, config: OutgoingRequest) -> Self {
        Self {
            data,
            status: 200,
            status_text: "OK".to_string(),
            headers,
            config,
        }
    }
}

/// Merge the explicit query object with the URL query. URL values win.
pub(crate) fn merge_query(explicit: &Map<String, Value>, from_url: Map<String, Value>) -> Map<String, Value> {
    let mut query = explicit.clone();
    query.extend(from_url);
    query
}

/// Parse a JSON-encoded string payload; anything else passes through.
pub(crate) fn parse_body(data: Option<&Value>) -> Value {
    match data {
        Some(Value::String(raw)) => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
        }
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_defaults_to_get() {
        let request = OutgoingRequest::default();
        assert_eq!(request.method_or_default(), "GET");

        let request = OutgoingRequest::new("post", "/users");
        assert_eq!(request.method_or_default(), "POST");
    }

    #[test]
    fn test_parse_json_string_body() {
        let data = json!(r#"{"name":"John Doe"}"#);
        assert_eq!(parse_body(Some(&data)), json!({"name": "John Doe"}));
    }

    #[test]
    fn test_non_string_body_passes_through() {
        let data = json!({"name": "John Doe"});
        assert_eq!(parse_body(Some(&data)), data);
        assert_eq!(parse_body(None), Value::Null);
        assert_eq!(parse_body(Some(&json!("plain text"))), json!("plain text"));
    }

    #[test]
    fn test_url_query_overlays_explicit() {
        let mut explicit = Map::new();
        explicit.insert("page".to_string(), json!(1));
        explicit.insert("sort".to_string(), json!("asc"));

        let mut from_url = Map::new();
        from_url.insert("page".to_string(), json!("3"));

        let merged = merge_query(&explicit, from_url);
        assert_eq!(Value::Object(merged), json!({"page": "3", "sort": "asc"}));
    }
}
