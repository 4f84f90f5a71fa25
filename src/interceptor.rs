//! Client integration seam.
//!
//! A host client sends requests through a [`Transport`]. Attaching a
//! [`MockInterceptor`] wraps the client's real transport so that requests
//! opting in to mocking are answered by the [`Mocker`] and everything else
//! goes out unchanged.

use crate::config::MockOverride;
use crate::error::BoxError;
use crate::mocker::Mocker;
use crate::request::{MockResponse, OutgoingRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Something that can carry an outgoing request to a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<MockResponse, BoxError>;
}

#[async_trait]
impl Transport for Mocker {
    async fn send(&self, request: OutgoingRequest) -> Result<MockResponse, BoxError> {
        Ok(self.handle(request).await?)
    }
}

/// Whether `request` asked to be mocked.
///
/// Only an explicit opt-in counts: `Enabled(true)`, or options with
/// `enabled: Some(true)`.
pub fn is_mock_opt_in(request: &OutgoingRequest) -> bool {
    match &request.mock {
        Some(MockOverride::Enabled(enabled)) => *enabled,
        Some(MockOverride::Options(options)) => options.enabled == Some(true),
        None => false,
    }
}

/// Installs a [`Mocker`] in front of a client transport.
#[derive(Clone)]
pub struct MockInterceptor {
    mocker: Arc<Mocker>,
}

impl MockInterceptor {
    pub fn new(mocker: Arc<Mocker>) -> Self {
        Self { mocker }
    }

    pub fn mocker(&self) -> &Arc<Mocker> {
        &self.mocker
    }

    /// Wrap `fallback`, routing opt-in requests to the mocker.
    pub fn attach<T: Transport>(&self, fallback: T) -> InterceptedTransport<T> {
        info!(endpoints = self.mocker.list_endpoints().len(), "Mock interceptor attached");
        InterceptedTransport {
            mocker: self.mocker.clone(),
            fallback,
        }
    }
}

/// A transport with the mock interceptor attached.
pub struct InterceptedTransport<T> {
    mocker: Arc<Mocker>,
    fallback: T,
}

impl<T> InterceptedTransport<T> {
    pub fn fallback(&self) -> &T {
        &self.fallback
    }

    /// Remove the interceptor and hand back the wrapped transport.
    pub fn detach(self) -> T {
        info!("Mock interceptor detached");
        self.fallback
    }
}

#[async_trait]
impl<T: Transport> Transport for InterceptedTransport<T> {
    async fn send(&self, request: OutgoingRequest) -> Result<MockResponse, BoxError> {
        if is_mock_opt_in(&request) {
            debug!(url = %request.url_or_empty(), "Routing request to mocker");
            self.mocker.send(request).await
        } else {
            self.fallback.send(request).await
        }
    }
}
