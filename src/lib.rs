//! HTTP Mock Adapter
//!
//! A request-mocking layer for HTTP clients. Outgoing requests are matched
//! against registered `"METHOD /pattern"` routes and answered with
//! synthetic responses, without any network I/O.
//!
//! # Features
//!
//! - **Route Matching**: Named parameters, wildcards and optional groups
//! - **Layered Configuration**: Global options with per-request overrides
//! - **Latency Simulation**: Static or per-route computed delays
//! - **Failure Injection**: Forced errors and random error rates
//! - **Hooks**: Request and response hooks that can mutate or abort
//! - **Mock Files**: YAML-defined routes with Handlebars templates
//!
//! # Example
//!
//! ```no_run
//! use http_mock_adapter::{static_handler, Mocker, MockerOptions, OutgoingRequest};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), http_mock_adapter::MockError> {
//! let mocker = Mocker::new(
//!     MockerOptions::new().endpoints(vec![("GET /api/users/:id", static_handler(json!({"id": 1})))]),
//! );
//!
//! let response = mocker.handle(OutgoingRequest::get("/api/users/1")).await?;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod hooks;
pub mod interceptor;
pub mod matcher;
pub mod mocker;
pub mod registry;
pub mod request;
pub mod stub;
pub mod template;
pub mod url_parser;

#[cfg(test)]
mod test_util;

pub use config::{ErrorDescriptor, MockConfig, MockFile, MockOptions, MockOverride, Mode};
pub use error::{BoxError, MockError, PatternError};
pub use handler::{handler_fn, static_handler, sync_handler, MockHandler, SharedHandler};
pub use hooks::{request_hook_fn, response_hook_fn, RequestHook, ResponseHook};
pub use interceptor::{is_mock_opt_in, InterceptedTransport, MockInterceptor, Transport};
pub use mocker::{FixedRandom, Mocker, MockerOptions, RandomSource, ThreadRandom};
pub use registry::EndpointSource;
pub use request::{MockRequest, MockResponse, OutgoingRequest};
