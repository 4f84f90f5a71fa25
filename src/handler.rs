//! Mock handlers: user code producing response data for a matched route.

use crate::error::BoxError;
use crate::request::{MockRequest, OutgoingRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Produces response data for a matched route.
///
/// Returning `Err` fails the dispatch with a handler error tagged with the
/// matched route key.
#[async_trait]
pub trait MockHandler: Send + Sync {
    async fn handle(&self, request: &MockRequest, outgoing: &OutgoingRequest) -> Result<Value, BoxError>;
}

/// Shared handler reference as stored in the registry.
pub type SharedHandler = Arc<dyn MockHandler>;

/// Wrap an async closure as a handler. The closure receives owned copies of
/// the structured and outgoing requests.
pub fn handler_fn<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(MockRequest, OutgoingRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Wrap a synchronous closure as a handler. Its result is treated as
/// already resolved.
pub fn sync_handler<F>(f: F) -> SharedHandler
where
    F: Fn(&MockRequest, &OutgoingRequest) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    Arc::new(SyncFnHandler(f))
}

/// Handler that always returns the same data.
pub fn static_handler(data: Value) -> SharedHandler {
    Arc::new(StaticHandler(data))
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> MockHandler for FnHandler<F>
where
    F: Fn(MockRequest, OutgoingRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
{
    async fn handle(&self, request: &MockRequest, outgoing: &OutgoingRequest) -> Result<Value, BoxError> {
        (self.0)(request.clone(), outgoing.clone()).await
    }
}

struct SyncFnHandler<F>(F);

#[async_trait]
impl<F> MockHandler for SyncFnHandler<F>
where
    F: Fn(&MockRequest, &OutgoingRequest) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    async fn handle(&self, request: &MockRequest, outgoing: &OutgoingRequest) -> Result<Value, BoxError> {
        (self.0)(request, outgoing)
    }
}

struct StaticHandler(Value);

#[async_trait]
impl MockHandler for StaticHandler {
    async fn handle(&self, _request: &MockRequest, _outgoing: &OutgoingRequest) -> Result<Value, BoxError> {
        Ok(self.0.clone())
    }
}

impl fmt::Debug for dyn MockHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MockHandler")
    }
}
