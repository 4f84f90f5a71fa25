//! Route registry.
//!
//! Stores mock handlers keyed by `"METHOD /pattern"` in insertion order.
//! Keys are unique; re-registering a key replaces its handler in place.

use crate::config::Mode;
use crate::error::PatternError;
use crate::handler::SharedHandler;
use crate::matcher::{split_route_key, PathPattern};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// A registered route with its compiled pattern.
///
/// The compile result is kept as-is: a malformed pattern is reported when
/// the matcher reaches it, not at registration.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub key: String,
    pub method: String,
    pub pattern: Result<PathPattern, PatternError>,
    pub handler: SharedHandler,
}

impl RouteEntry {
    pub fn new(key: String, handler: SharedHandler) -> Self {
        let method = split_route_key(&key).0.to_string();
        let pattern = PathPattern::from_route_key(&key);
        Self {
            key,
            method,
            pattern,
            handler,
        }
    }
}

/// Bulk source of routes.
pub enum EndpointSource {
    /// Ordered key/handler pairs, registered in sequence order.
    Ordered(Vec<(String, SharedHandler)>),
    /// Plain mapping, registered in key order.
    Mapping(BTreeMap<String, SharedHandler>),
}

impl EndpointSource {
    fn into_pairs(self) -> Vec<(String, SharedHandler)> {
        match self {
            EndpointSource::Ordered(pairs) => pairs,
            EndpointSource::Mapping(map) => map.into_iter().collect(),
        }
    }
}

impl<K: Into<String>> From<Vec<(K, SharedHandler)>> for EndpointSource {
    fn from(pairs: Vec<(K, SharedHandler)>) -> Self {
        EndpointSource::Ordered(pairs.into_iter().map(|(k, h)| (k.into(), h)).collect())
    }
}

impl From<BTreeMap<String, SharedHandler>> for EndpointSource {
    fn from(map: BTreeMap<String, SharedHandler>) -> Self {
        EndpointSource::Mapping(map)
    }
}

impl From<HashMap<String, SharedHandler>> for EndpointSource {
    fn from(map: HashMap<String, SharedHandler>) -> Self {
        EndpointSource::Mapping(map.into_iter().collect())
    }
}

/// Ordered route registry.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    routes: Vec<RouteEntry>,
    mode: Mode,
}

impl Registry {
    pub fn new(mode: Mode) -> Self {
        Self {
            routes: Vec::new(),
            mode,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Register `handler` under `key`, returning the handler it replaced.
    pub fn add(&mut self, key: impl Into<String>, handler: SharedHandler) -> Option<SharedHandler> {
        let key = key.into();

        if let Some(existing) = self.routes.iter_mut().find(|r| r.key == key) {
            if self.mode.is_development() {
                warn!(endpoint = %key, "Duplicate endpoint: {}", key);
            }
            return Some(std::mem::replace(&mut existing.handler, handler));
        }

        self.routes.push(RouteEntry::new(key, handler));
        None
    }

    /// Register every route from `source`.
    pub fn load(&mut self, source: EndpointSource) {
        for (key, handler) in source.into_pairs() {
            self.add(key, handler);
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.routes.len();
        self.routes.retain(|r| r.key != key);
        self.routes.len() != before
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// Route keys in insertion order.
    pub fn list(&self) -> Vec<String> {
        self.routes.iter().map(|r| r.key.clone()).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.routes.iter().any(|r| r.key == key)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }
}
