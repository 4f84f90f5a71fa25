//! File-defined routes.
//!
//! Turns a [`MockFile`] into a ready [`Mocker`]: each route definition
//! becomes a [`StubHandler`] returning its (optionally templated) body.

use crate::config::{ErrorDescriptor, MockFile, MockOverride, Mode, RouteDefinition};
use crate::error::BoxError;
use crate::handler::MockHandler;
use crate::mocker::{Mocker, MockerOptions};
use crate::request::{MockRequest, OutgoingRequest};
use crate::template::{TemplateContext, TemplateEngine};
use crate::url_parser::resolve_request_path;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Handler serving one file-defined route.
pub struct StubHandler {
    body: Value,
    template: bool,
    error: Option<ErrorDescriptor>,
    engine: Arc<TemplateEngine>,
}

impl StubHandler {
    pub fn new(route: RouteDefinition, engine: Arc<TemplateEngine>) -> Self {
        Self {
            body: route.body,
            template: route.template,
            error: route.error,
            engine,
        }
    }
}

#[async_trait]
impl MockHandler for StubHandler {
    async fn handle(&self, request: &MockRequest, outgoing: &OutgoingRequest) -> Result<Value, BoxError> {
        if let Some(error) = &self.error {
            return Err(format!("{} (status: {})", error.message, error.status).into());
        }

        if !self.template {
            return Ok(self.body.clone());
        }

        let method = outgoing.method_or_default();
        let path = resolve_request_path(outgoing.url_or_empty(), outgoing.base_url.as_deref()).path;
        let ctx = TemplateContext::new(request, &method, &path);
        Ok(self.engine.render_json(&self.body, &ctx)?)
    }
}

fn request_delay(request: &OutgoingRequest) -> Option<u64> {
    match &request.mock {
        Some(MockOverride::Options(options)) => options.delay,
        _ => None,
    }
}

impl MockFile {
    /// Build a mocker serving every route in this file.
    ///
    /// A `mode` in the file wins over the one passed in. A `routes` value
    /// that is neither a mapping nor a sequence registers nothing; a
    /// malformed entry inside either is an error.
    pub fn into_mocker(self, mode: Mode) -> anyhow::Result<Mocker> {
        let mode = self.mode.unwrap_or(mode);
        let mut settings = self.settings.clone();

        let routes = match self.route_definitions() {
            Some(routes) => routes?,
            None => {
                if mode.is_development() {
                    warn!("Invalid routes definition. Expected a mapping or a sequence of routes.");
                }
                Vec::new()
            }
        };

        let delays: HashMap<String, u64> = routes
            .iter()
            .filter_map(|(key, route)| route.delay_ms.map(|d| (key.clone(), d)))
            .collect();

        if !delays.is_empty() && settings.get_delay.is_none() {
            let static_delay = settings.delay.unwrap_or(0);
            settings = settings.get_delay(move |key, request| {
                delays
                    .get(key)
                    .copied()
                    .or_else(|| request_delay(request))
                    .unwrap_or(static_delay)
            });
        }

        let mocker = Mocker::new(MockerOptions::new().config(settings).mode(mode));
        let engine = Arc::new(TemplateEngine::new());
        for (key, route) in routes {
            mocker.add_endpoint(key, Arc::new(StubHandler::new(route, engine.clone())));
        }

        info!(routes = mocker.list_endpoints().len(), "Loaded mock file");
        Ok(mocker)
    }
}
