//! Request matching logic.
//!
//! Compiles route patterns (`/users/:id`, `/files/*path`, `/posts{/:slug}`)
//! and finds the first registered route matching a method and path.
//! Registration order is the only precedence: there is no specificity
//! ranking.

use crate::error::{MockError, PatternError};
use crate::handler::SharedHandler;
use crate::registry::RouteEntry;
use regex::Regex;
use std::collections::HashMap;

/// Characters with reserved meaning that must be escaped to be literal.
const RESERVED: &[char] = &['(', ')', '[', ']', '+', '?', '!'];

/// Result of matching a request against the registry.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Matched route key, e.g. `GET /users/:id`
    pub key: String,
    /// Decoded path parameters
    pub params: HashMap<String, String>,
    pub handler: SharedHandler,
}

/// Compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    /// Parameter names in capture-group order
    names: Vec<String>,
}

/// Split a route key into method and path pattern on the first space.
pub fn split_route_key(key: &str) -> (&str, Option<&str>) {
    match key.split_once(' ') {
        Some((method, pattern)) => (method, Some(pattern)),
        None => (key, None),
    }
}

impl PathPattern {
    /// Compile the pattern half of a route key.
    pub fn from_route_key(key: &str) -> Result<Self, PatternError> {
        match split_route_key(key) {
            (_, Some(pattern)) => Self::compile(pattern),
            (_, None) => Err(PatternError::MissingPattern(key.to_string())),
        }
    }

    /// Compile a path pattern.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let mut parser = PatternParser {
            chars: pattern.chars().collect(),
            pos: 0,
            source: pattern,
            names: Vec::new(),
        };
        let body = parser.parse_sequence(false)?;
        let trailing = if body.ends_with('/') { "" } else { "(?:/)?" };
        let regex = Regex::new(&format!("(?i)^{}{}$", body, trailing))
            .map_err(|e| PatternError::Regex(e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            names: parser.names,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn param_names(&self) -> &[String] {
        &self.names
    }

    /// Match `path`, returning decoded parameters.
    ///
    /// A parameter value that does not percent-decode to UTF-8 is an error.
    pub fn matches(&self, path: &str) -> Result<Option<HashMap<String, String>>, String> {
        let Some(captures) = self.regex.captures(path) else {
            return Ok(None);
        };

        let mut params = HashMap::new();
        for (i, name) in self.names.iter().enumerate() {
            if let Some(m) = captures.get(i + 1) {
                let value = urlencoding::decode(m.as_str()).map_err(|e| {
                    format!("Failed to decode param \"{}\" ({}): {}", name, m.as_str(), e)
                })?;
                params.insert(name.clone(), value.into_owned());
            }
        }
        Ok(Some(params))
    }
}

struct PatternParser<'a> {
    chars: Vec<char>,
    pos: usize,
    source: &'a str,
    names: Vec<String>,
}

impl PatternParser<'_> {
    fn parse_sequence(&mut self, in_group: bool) -> Result<String, PatternError> {
        let expected = if in_group { "}" } else { "END" };
        let mut out = String::new();

        loop {
            let Some(ch) = self.chars.get(self.pos).copied() else {
                if in_group {
                    return Err(self.unexpected("END", expected));
                }
                return Ok(out);
            };

            match ch {
                '}' if in_group => {
                    self.pos += 1;
                    return Ok(out);
                }
                '}' => return Err(self.unexpected("}", expected)),
                '{' => {
                    self.pos += 1;
                    let inner = self.parse_sequence(true)?;
                    out.push_str(&format!("(?:{})?", inner));
                }
                ':' => {
                    let name = self.parse_name()?;
                    self.names.push(name);
                    out.push_str("([^/]+?)");
                }
                '*' => {
                    let name = self.parse_name()?;
                    self.names.push(name);
                    out.push_str("(.+)");
                }
                '\\' => {
                    self.pos += 1;
                    let Some(escaped) = self.chars.get(self.pos).copied() else {
                        return Err(self.unexpected("END", "escaped character"));
                    };
                    self.pos += 1;
                    out.push_str(&regex::escape(&escaped.to_string()));
                }
                c if RESERVED.contains(&c) => {
                    return Err(self.unexpected(&c.to_string(), expected));
                }
                c => {
                    self.pos += 1;
                    out.push_str(&regex::escape(&c.to_string()));
                }
            }
        }
    }

    /// Parse the identifier after a `:` or `*` sigil.
    fn parse_name(&mut self) -> Result<String, PatternError> {
        let sigil_index = self.pos;
        self.pos += 1;

        let mut name = String::new();
        while let Some(ch) = self.chars.get(self.pos).copied() {
            let valid = if name.is_empty() {
                ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
            } else {
                ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
            };
            if !valid {
                break;
            }
            name.push(ch);
            self.pos += 1;
        }

        if name.is_empty() {
            return Err(PatternError::MissingName {
                index: sigil_index,
                pattern: self.source.to_string(),
            });
        }
        Ok(name)
    }

    fn unexpected(&self, found: &str, expected: &'static str) -> PatternError {
        PatternError::Unexpected {
            found: found.to_string(),
            index: self.pos,
            expected,
            pattern: self.source.to_string(),
        }
    }
}

/// Find the first route, in registration order, whose method and pattern
/// match.
///
/// A route whose pattern failed to compile aborts the whole search as soon
/// as it is reached with a matching method.
pub fn find_match(routes: &[RouteEntry], method: &str, path: &str) -> Result<Option<RouteMatch>, MockError> {
    for route in routes {
        if !route.method.eq_ignore_ascii_case(method) {
            continue;
        }

        let pattern = route
            .pattern
            .as_ref()
            .map_err(|e| MockError::RouteMatch(e.to_string()))?;

        if let Some(params) = pattern.matches(path).map_err(MockError::RouteMatch)? {
            return Ok(Some(RouteMatch {
                key: route.key.clone(),
                params,
                handler: route.handler.clone(),
            }));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::static_handler;
    use serde_json::json;

    fn routes(keys: &[&str]) -> Vec<RouteEntry> {
        keys.iter()
            .enumerate()
            .map(|(i, key)| RouteEntry::new(key.to_string(), static_handler(json!(i))))
            .collect()
    }

    #[test]
    fn test_static_path_matching() {
        let routes = routes(&["GET /api/users"]);

        let result = find_match(&routes, "GET", "/api/users").unwrap();
        assert_eq!(result.unwrap().key, "GET /api/users");

        assert!(find_match(&routes, "GET", "/api/posts").unwrap().is_none());
        assert!(find_match(&routes, "GET", "/api/users/1").unwrap().is_none());
    }

    #[test]
    fn test_param_extraction() {
        let routes = routes(&["GET /users/:id"]);

        let result = find_match(&routes, "GET", "/users/1").unwrap().unwrap();
        assert_eq!(result.params.get("id"), Some(&"1".to_string()));

        assert!(find_match(&routes, "GET", "/users/").unwrap().is_none());
        assert!(find_match(&routes, "GET", "/users/1/posts").unwrap().is_none());
    }

    #[test]
    fn test_multiple_params_and_decoding() {
        let routes = routes(&["GET /users/:userId/posts/:post_id"]);

        let result = find_match(&routes, "GET", "/users/John%20Doe/posts/42")
            .unwrap()
            .unwrap();
        assert_eq!(result.params.get("userId"), Some(&"John Doe".to_string()));
        assert_eq!(result.params.get("post_id"), Some(&"42".to_string()));
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let routes = routes(&["get /api/users", "POST /api/users"]);

        let result = find_match(&routes, "GET", "/api/users").unwrap().unwrap();
        assert_eq!(result.key, "get /api/users");

        let result = find_match(&routes, "post", "/api/users").unwrap().unwrap();
        assert_eq!(result.key, "POST /api/users");

        assert!(find_match(&routes, "DELETE", "/api/users").unwrap().is_none());
    }

    #[test]
    fn test_trailing_slash_and_case() {
        let routes = routes(&["GET /api/users"]);
        assert!(find_match(&routes, "GET", "/api/users/").unwrap().is_some());
        assert!(find_match(&routes, "GET", "/API/Users").unwrap().is_some());
    }

    #[test]
    fn test_trailing_slash_not_doubled() {
        let routes = routes(&["GET /api/"]);
        assert!(find_match(&routes, "GET", "/api/").unwrap().is_some());
        assert!(find_match(&routes, "GET", "/api//").unwrap().is_none());
    }

    #[test]
    fn test_params_in_one_segment_are_lazy() {
        let routes = routes(&["GET /:a-:b"]);

        let result = find_match(&routes, "GET", "/x-y-z").unwrap().unwrap();
        assert_eq!(result.params.get("a"), Some(&"x".to_string()));
        assert_eq!(result.params.get("b"), Some(&"y-z".to_string()));
    }

    #[test]
    fn test_registration_order_wins() {
        let general_first = routes(&["GET /users/:id", "GET /users/me"]);
        let result = find_match(&general_first, "GET", "/users/me").unwrap().unwrap();
        assert_eq!(result.key, "GET /users/:id");

        let specific_first = routes(&["GET /users/me", "GET /users/:id"]);
        let result = find_match(&specific_first, "GET", "/users/me").unwrap().unwrap();
        assert_eq!(result.key, "GET /users/me");
    }

    #[test]
    fn test_optional_group() {
        let routes = routes(&["GET /posts{/:slug}"]);

        let result = find_match(&routes, "GET", "/posts").unwrap().unwrap();
        assert!(result.params.is_empty());

        let result = find_match(&routes, "GET", "/posts/hello").unwrap().unwrap();
        assert_eq!(result.params.get("slug"), Some(&"hello".to_string()));
    }

    #[test]
    fn test_wildcard() {
        let routes = routes(&["GET /files/*path"]);

        let result = find_match(&routes, "GET", "/files/a/b/c.txt").unwrap().unwrap();
        assert_eq!(result.params.get("path"), Some(&"a/b/c.txt".to_string()));

        assert!(find_match(&routes, "GET", "/files").unwrap().is_none());
    }

    #[test]
    fn test_escaped_reserved_character() {
        let routes = routes(&["GET /search\\?"]);
        assert!(find_match(&routes, "GET", "/search?").unwrap().is_some());
    }

    #[test]
    fn test_malformed_pattern_fails_loud() {
        let routes = routes(&["GET /api/posts/?id", "GET /api/users/:id"]);

        let err = find_match(&routes, "GET", "/api/users/1").unwrap_err();
        assert!(matches!(err, MockError::RouteMatch(_)));
        assert!(err.to_string().starts_with("Path matching failed:"));
        assert!(err.to_string().contains("Unexpected ? at index 11"));
    }

    #[test]
    fn test_malformed_pattern_skipped_for_other_methods() {
        let routes = routes(&["POST /api/posts/?id", "GET /api/users/:id"]);
        assert!(find_match(&routes, "GET", "/api/users/1").unwrap().is_some());
    }

    #[test]
    fn test_compile_errors() {
        assert!(matches!(
            PathPattern::compile("/users/:"),
            Err(PatternError::MissingName { index: 7, .. })
        ));
        assert!(matches!(
            PathPattern::compile("/users{/:id"),
            Err(PatternError::Unexpected { .. })
        ));
        assert!(matches!(
            PathPattern::compile("/users}"),
            Err(PatternError::Unexpected { .. })
        ));
        assert!(PathPattern::compile("/users/(\\d+)").is_err());
        assert!(matches!(
            PathPattern::from_route_key("GET"),
            Err(PatternError::MissingPattern(_))
        ));
    }

    #[test]
    fn test_missing_pattern_surfaces_as_match_failure() {
        let routes = routes(&["GET"]);
        let err = find_match(&routes, "GET", "/").unwrap_err();
        assert!(err.to_string().starts_with("Path matching failed:"));
    }

    #[test]
    fn test_undecodable_param_is_match_failure() {
        let routes = routes(&["GET /users/:id"]);
        let err = find_match(&routes, "GET", "/users/%FF").unwrap_err();
        assert!(matches!(err, MockError::RouteMatch(_)));
    }

    #[test]
    fn test_param_names() {
        let pattern = PathPattern::compile("/a/:first/b/*rest").unwrap();
        assert_eq!(pattern.param_names(), &["first".to_string(), "rest".to_string()]);
        assert_eq!(pattern.as_str(), "/a/:first/b/*rest");
    }
}
