//! Request and response hooks.
//!
//! Hooks run sequentially in registration order. The first failing hook
//! aborts the dispatch; hooks after it do not run.

use crate::error::{BoxError, HookPhase, MockError};
use crate::request::{MockRequest, MockResponse, OutgoingRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Runs before the matched handler and may mutate the structured request.
#[async_trait]
pub trait RequestHook: Send + Sync {
    async fn on_request(&self, request: &mut MockRequest, outgoing: &OutgoingRequest) -> Result<(), BoxError>;
}

/// Runs after the response is built and may mutate it.
#[async_trait]
pub trait ResponseHook: Send + Sync {
    async fn on_response(&self, response: &mut MockResponse, outgoing: &OutgoingRequest) -> Result<(), BoxError>;
}

/// Wrap a closure as a request hook.
pub fn request_hook_fn<F>(f: F) -> Arc<dyn RequestHook>
where
    F: Fn(&mut MockRequest, &OutgoingRequest) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(RequestHookFn(f))
}

/// Wrap a closure as a response hook.
pub fn response_hook_fn<F>(f: F) -> Arc<dyn ResponseHook>
where
    F: Fn(&mut MockResponse, &OutgoingRequest) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(ResponseHookFn(f))
}

struct RequestHookFn<F>(F);

#[async_trait]
impl<F> RequestHook for RequestHookFn<F>
where
    F: Fn(&mut MockRequest, &OutgoingRequest) -> Result<(), BoxError> + Send + Sync + 'static,
{
    async fn on_request(&self, request: &mut MockRequest, outgoing: &OutgoingRequest) -> Result<(), BoxError> {
        (self.0)(request, outgoing)
    }
}

struct ResponseHookFn<F>(F);

#[async_trait]
impl<F> ResponseHook for ResponseHookFn<F>
where
    F: Fn(&mut MockResponse, &OutgoingRequest) -> Result<(), BoxError> + Send + Sync + 'static,
{
    async fn on_response(&self, response: &mut MockResponse, outgoing: &OutgoingRequest) -> Result<(), BoxError> {
        (self.0)(response, outgoing)
    }
}

/// Ordered request and response hooks.
#[derive(Clone, Default)]
pub struct HookPipeline {
    request_hooks: Vec<Arc<dyn RequestHook>>,
    response_hooks: Vec<Arc<dyn ResponseHook>>,
}

impl HookPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request_hook(&mut self, hook: Arc<dyn RequestHook>) {
        self.request_hooks.push(hook);
    }

    pub fn add_response_hook(&mut self, hook: Arc<dyn ResponseHook>) {
        self.response_hooks.push(hook);
    }

    pub fn request_hook_count(&self) -> usize {
        self.request_hooks.len()
    }

    pub fn response_hook_count(&self) -> usize {
        self.response_hooks.len()
    }

    pub async fn run_request(&self, request: &mut MockRequest, outgoing: &OutgoingRequest) -> Result<(), MockError> {
        debug!(hooks = self.request_hooks.len(), "Running request hooks");
        for hook in &self.request_hooks {
            hook.on_request(request, outgoing)
                .await
                .map_err(|source| MockError::Hook {
                    phase: HookPhase::Request,
                    source,
                })?;
        }
        Ok(())
    }

    pub async fn run_response(&self, response: &mut MockResponse, outgoing: &OutgoingRequest) -> Result<(), MockError> {
        debug!(hooks = self.response_hooks.len(), "Running response hooks");
        for hook in &self.response_hooks {
            hook.on_response(response, outgoing)
                .await
                .map_err(|source| MockError::Hook {
                    phase: HookPhase::Response,
                    source,
                })?;
        }
        Ok(())
    }
}
