//! Configuration for the mock adapter.
//!
//! Defines the global/per-request mock options, the normalizer that turns
//! partial options into a fully populated [`MockConfig`], and the
//! declarative mock file loaded by the CLI.

use crate::matcher::PathPattern;
use crate::request::OutgoingRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Environment variable consulted by [`Mode::from_env`].
pub const MODE_ENV_VAR: &str = "HTTP_MOCK_ENV";

/// Whether development diagnostics (duplicate routes, invalid route
/// sources) are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    /// Read the mode from `HTTP_MOCK_ENV`. Anything other than
    /// `production`/`prod` is development.
    pub fn from_env() -> Self {
        match std::env::var(MODE_ENV_VAR) {
            Ok(value) => Self::parse(&value),
            Err(_) => Mode::Development,
        }
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Mode::Production,
            _ => Mode::Development,
        }
    }

    pub fn is_development(self) -> bool {
        self == Mode::Development
    }
}

/// Computes a delay in milliseconds from the matched route key and the
/// outgoing request.
///
/// Shared by reference: cloning a config never clones the callback.
#[derive(Clone)]
pub struct DelayFn(Arc<dyn Fn(&str, &OutgoingRequest) -> u64 + Send + Sync>);

impl DelayFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &OutgoingRequest) -> u64 + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, key: &str, request: &OutgoingRequest) -> u64 {
        (self.0)(key, request)
    }
}

impl fmt::Debug for DelayFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DelayFn(..)")
    }
}

/// Forced failure descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorDescriptor {
    /// HTTP status code
    #[serde(default = "default_error_status")]
    pub status: u16,

    /// Error message
    #[serde(default)]
    pub message: String,

    /// Arbitrary extra details
    #[serde(default)]
    pub details: Vec<serde_json::Value>,
}

fn default_error_status() -> u16 {
    500
}

impl ErrorDescriptor {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: Vec::new(),
        }
    }
}

/// Partial mock options, used both for the global configuration and for
/// per-request overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockOptions {
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Static delay in milliseconds
    #[serde(default)]
    pub delay: Option<u64>,

    /// Probability in [0, 1] of a random failure
    #[serde(default)]
    pub error_rate: Option<f64>,

    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    #[serde(default)]
    pub error: Option<ErrorDescriptor>,

    #[serde(skip)]
    pub get_delay: Option<DelayFn>,

    #[serde(default)]
    pub enable_logging: Option<bool>,
}

impl MockOptions {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn delay(mut self, delay_ms: u64) -> Self {
        self.delay = Some(delay_ms);
        self
    }

    pub fn error_rate(mut self, rate: f64) -> Self {
        self.error_rate = Some(rate);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn error(mut self, error: ErrorDescriptor) -> Self {
        self.error = Some(error);
        self
    }

    pub fn get_delay<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &OutgoingRequest) -> u64 + Send + Sync + 'static,
    {
        self.get_delay = Some(DelayFn::new(f));
        self
    }

    pub fn enable_logging(mut self, enable: bool) -> Self {
        self.enable_logging = Some(enable);
        self
    }

    /// Check value ranges. Programmatic options are not validated; this is
    /// used for file-loaded settings.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(rate) = self.error_rate {
            if !(0.0..=1.0).contains(&rate) {
                anyhow::bail!("error_rate must be within [0, 1], got {}", rate);
            }
        }
        if let Some(error) = &self.error {
            validate_status(error.status)?;
        }
        Ok(())
    }
}

/// Per-request override attached to an outgoing request.
#[derive(Debug, Clone)]
pub enum MockOverride {
    /// Boolean shorthand for `{ enabled: <value> }`.
    Enabled(bool),
    /// Partial options layered onto the global configuration.
    Options(MockOptions),
}

impl From<bool> for MockOverride {
    fn from(value: bool) -> Self {
        MockOverride::Enabled(value)
    }
}

impl From<MockOptions> for MockOverride {
    fn from(value: MockOptions) -> Self {
        MockOverride::Options(value)
    }
}

/// Fully populated mock configuration.
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub enabled: bool,
    pub delay: u64,
    pub error_rate: f64,
    pub headers: HashMap<String, String>,
    pub error: Option<ErrorDescriptor>,
    pub get_delay: Option<DelayFn>,
    pub enable_logging: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: 0,
            error_rate: 0.0,
            headers: HashMap::new(),
            error: None,
            get_delay: None,
            enable_logging: false,
        }
    }
}

/// Fill every field of `options` from the defaults.
pub fn normalize(options: Option<&MockOptions>) -> MockConfig {
    match options {
        Some(options) => layer(&MockConfig::default(), options),
        None => MockConfig::default(),
    }
}

/// Resolve the effective configuration for one request.
///
/// `Enabled(b)` forces `enabled = b` on top of `defaults`; `Options` layers
/// every present field, merging `headers` key-wise; `None` leaves the
/// defaults unchanged.
pub fn merge(defaults: &MockConfig, override_: Option<&MockOverride>) -> MockConfig {
    match override_ {
        Some(MockOverride::Enabled(enabled)) => MockConfig {
            enabled: *enabled,
            ..defaults.clone()
        },
        Some(MockOverride::Options(options)) => layer(defaults, options),
        None => defaults.clone(),
    }
}

fn layer(base: &MockConfig, options: &MockOptions) -> MockConfig {
    let mut headers = base.headers.clone();
    if let Some(extra) = &options.headers {
        headers.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    MockConfig {
        enabled: options.enabled.unwrap_or(base.enabled),
        delay: options.delay.unwrap_or(base.delay),
        error_rate: options.error_rate.unwrap_or(base.error_rate),
        headers,
        error: options.error.clone().or_else(|| base.error.clone()),
        get_delay: options.get_delay.clone().or_else(|| base.get_delay.clone()),
        enable_logging: options.enable_logging.unwrap_or(base.enable_logging),
    }
}

fn validate_status(status: u16) -> anyhow::Result<()> {
    if !(100..=599).contains(&status) {
        anyhow::bail!("Invalid status code: {}", status);
    }
    Ok(())
}

/// Declarative mock file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockFile {
    /// Global mock options
    #[serde(default)]
    pub settings: MockOptions,

    /// Diagnostics mode (overrides `HTTP_MOCK_ENV` when set)
    #[serde(default)]
    pub mode: Option<Mode>,

    /// Route definitions: a mapping of route key to definition, or a
    /// sequence of definitions carrying their own `key`.
    #[serde(default)]
    pub routes: serde_yaml::Value,
}

impl MockFile {
    /// Load a mock file from YAML on disk.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file = Self::from_yaml(&content)?;
        file.validate()?;
        Ok(file)
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validate settings and every route definition.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.settings.validate()?;
        let routes = self
            .route_definitions()
            .ok_or_else(|| anyhow::anyhow!("routes must be a mapping or a sequence"))??;
        for (key, route) in &routes {
            route
                .validate(key)
                .map_err(|e| anyhow::anyhow!("Route {}: {}", key, e))?;
        }
        Ok(())
    }

    /// Parse the `routes` value.
    ///
    /// `None` when it is neither a mapping nor a sequence. Otherwise the
    /// first malformed entry is an error naming that entry.
    pub fn route_definitions(&self) -> Option<anyhow::Result<Vec<(String, RouteDefinition)>>> {
        match &self.routes {
            serde_yaml::Value::Null => Some(Ok(Vec::new())),
            serde_yaml::Value::Mapping(map) => Some(
                map.iter()
                    .map(|(k, v)| -> anyhow::Result<(String, RouteDefinition)> {
                        let key = k
                            .as_str()
                            .ok_or_else(|| anyhow::anyhow!("Route key must be a string: {:?}", k))?
                            .to_string();
                        let route = parse_route(&key, v.clone())?;
                        Ok((key, route))
                    })
                    .collect(),
            ),
            serde_yaml::Value::Sequence(entries) => Some(
                entries
                    .iter()
                    .enumerate()
                    .map(|(index, entry)| -> anyhow::Result<(String, RouteDefinition)> {
                        let mut entry = entry
                            .as_mapping()
                            .ok_or_else(|| anyhow::anyhow!("Route entry {} must be a mapping", index))?
                            .clone();
                        let key = entry
                            .remove("key")
                            .and_then(|k| k.as_str().map(str::to_string))
                            .ok_or_else(|| anyhow::anyhow!("Route entry {} is missing a string `key`", index))?;
                        let route = parse_route(&key, serde_yaml::Value::Mapping(entry))?;
                        Ok((key, route))
                    })
                    .collect(),
            ),
            _ => None,
        }
    }
}

fn parse_route(key: &str, value: serde_yaml::Value) -> anyhow::Result<RouteDefinition> {
    serde_yaml::from_value(value).map_err(|e| anyhow::anyhow!("Route {}: {}", key, e))
}

/// A file-defined route: a static (optionally templated) response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDefinition {
    /// Response data
    #[serde(default)]
    pub body: serde_json::Value,

    /// Render Handlebars expressions in string leaves of `body`
    #[serde(default)]
    pub template: bool,

    /// Route-specific delay, served through `get_delay`
    #[serde(default)]
    pub delay_ms: Option<u64>,

    /// Make the handler fail
    #[serde(default)]
    pub error: Option<ErrorDescriptor>,
}

impl RouteDefinition {
    pub fn validate(&self, key: &str) -> anyhow::Result<()> {
        PathPattern::from_route_key(key)?;
        if let Some(error) = &self.error {
            validate_status(error.status)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults() {
        let config = normalize(None);
        assert!(config.enabled);
        assert_eq!(config.delay, 0);
        assert_eq!(config.error_rate, 0.0);
        assert!(config.headers.is_empty());
        assert!(config.error.is_none());
        assert!(config.get_delay.is_none());
        assert!(!config.enable_logging);
    }

    #[test]
    fn test_normalize_custom_values() {
        let options = MockOptions::default()
            .enabled(false)
            .delay(1000)
            .error_rate(0.5)
            .header("X-Custom-Header", "custom")
            .error(ErrorDescriptor::new(500, "Internal Server Error"))
            .get_delay(|_, _| 1000)
            .enable_logging(true);

        let config = normalize(Some(&options));
        assert!(!config.enabled);
        assert_eq!(config.delay, 1000);
        assert_eq!(config.error_rate, 0.5);
        assert_eq!(config.headers.get("X-Custom-Header").map(String::as_str), Some("custom"));
        assert_eq!(config.error.as_ref().unwrap().message, "Internal Server Error");
        assert!(config.get_delay.is_some());
        assert!(config.enable_logging);
    }

    #[test]
    fn test_merge_none_keeps_defaults() {
        let defaults = normalize(Some(&MockOptions::default().delay(50)));
        let merged = merge(&defaults, None);
        assert!(merged.enabled);
        assert_eq!(merged.delay, 50);
    }

    #[test]
    fn test_merge_boolean_shorthand() {
        let defaults = normalize(Some(&MockOptions::default().enabled(false).delay(10)));

        let merged = merge(&defaults, Some(&MockOverride::Enabled(true)));
        assert!(merged.enabled);
        assert_eq!(merged.delay, 10);

        let defaults = normalize(None);
        let merged = merge(&defaults, Some(&MockOverride::Enabled(false)));
        assert!(!merged.enabled);
    }

    #[test]
    fn test_merge_options_overlays_fields() {
        let defaults = normalize(Some(&MockOptions::default().header("X-Global", "1").header("X-Shared", "global")));
        let override_ = MockOverride::Options(
            MockOptions::default()
                .delay(100)
                .error_rate(0.5)
                .header("X-Shared", "request")
                .get_delay(|_, _| 200)
                .enable_logging(true),
        );

        let merged = merge(&defaults, Some(&override_));
        assert!(merged.enabled);
        assert_eq!(merged.delay, 100);
        assert_eq!(merged.error_rate, 0.5);
        assert_eq!(merged.headers.get("X-Global").map(String::as_str), Some("1"));
        assert_eq!(merged.headers.get("X-Shared").map(String::as_str), Some("request"));
        assert_eq!(merged.get_delay.unwrap().call("GET /", &OutgoingRequest::default()), 200);
        assert!(merged.enable_logging);
    }

    #[test]
    fn test_merge_keeps_global_get_delay() {
        let defaults = normalize(Some(&MockOptions::default().get_delay(|_, _| 7)));
        let merged = merge(&defaults, Some(&MockOverride::Options(MockOptions::default().delay(1))));
        assert_eq!(merged.get_delay.unwrap().call("GET /", &OutgoingRequest::default()), 7);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("production"), Mode::Production);
        assert_eq!(Mode::parse(" PROD "), Mode::Production);
        assert_eq!(Mode::parse("development"), Mode::Development);
        assert_eq!(Mode::parse("test"), Mode::Development);
        assert!(Mode::default().is_development());
    }

    #[test]
    fn test_parse_mock_file_mapping() {
        let yaml = r#"
settings:
  delay: 20
  headers:
    X-Mock: "true"
mode: production
routes:
  "GET /users/:id":
    template: true
    body:
      id: "{{params.id}}"
  "POST /users":
    body:
      created: true
    delay_ms: 5
"#;
        let file = MockFile::from_yaml(yaml).unwrap();
        file.validate().unwrap();
        assert_eq!(file.settings.delay, Some(20));
        assert_eq!(file.mode, Some(Mode::Production));

        let routes = file.route_definitions().unwrap().unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].0, "GET /users/:id");
        assert!(routes[0].1.template);
        assert_eq!(routes[1].0, "POST /users");
        assert_eq!(routes[1].1.delay_ms, Some(5));
    }

    #[test]
    fn test_parse_mock_file_sequence() {
        let yaml = r#"
routes:
  - key: "GET /health"
    body: ok
  - key: "DELETE /users/:id"
    error:
      status: 403
      message: Forbidden
"#;
        let file = MockFile::from_yaml(yaml).unwrap();
        let routes = file.route_definitions().unwrap().unwrap();
        assert_eq!(routes[0].0, "GET /health");
        assert_eq!(routes[1].1.error.as_ref().unwrap().status, 403);
    }

    #[test]
    fn test_invalid_routes_value() {
        let file = MockFile::from_yaml("routes: not-a-map").unwrap();
        assert!(file.route_definitions().is_none());
        assert!(file.validate().is_err());
    }

    #[test]
    fn test_malformed_route_entry_is_an_error() {
        let yaml = r#"
routes:
  "GET /api/users":
    body: ok
  "GET /api/posts":
    delay: 5
    body: []
"#;
        let file = MockFile::from_yaml(yaml).unwrap();
        let err = file.route_definitions().unwrap().unwrap_err();
        assert!(err.to_string().contains("GET /api/posts"));
        assert!(file.validate().is_err());

        let file = MockFile::from_yaml("routes:\n  - body: ok\n").unwrap();
        let err = file.route_definitions().unwrap().unwrap_err();
        assert!(err.to_string().contains("missing a string `key`"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let file = MockFile::from_yaml("settings:\n  error_rate: 1.5\n").unwrap();
        assert!(file.validate().is_err());

        let file = MockFile::from_yaml("routes:\n  \"GET /posts/?id\":\n    body: 1\n").unwrap();
        let err = file.validate().unwrap_err();
        assert!(err.to_string().contains("GET /posts/?id"));
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "routes:\n  \"GET /ping\":\n    body: pong").unwrap();

        let loaded = MockFile::from_file(file.path()).unwrap();
        assert_eq!(loaded.route_definitions().unwrap().unwrap().len(), 1);
    }
}
