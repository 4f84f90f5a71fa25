//! Error types for mock dispatch.
//!
//! Every [`MockError`] is fatal to the dispatch that produced it and is
//! surfaced to the caller of [`Mocker::handle`](crate::Mocker::handle).
//! Nothing here is retried or swallowed.

use thiserror::Error;

/// Error type returned by user callbacks (handlers, hooks, transports).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which side of the handler a hook runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// Runs before the matched handler.
    Request,
    /// Runs after the response has been built.
    Response,
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookPhase::Request => f.write_str("request"),
            HookPhase::Response => f.write_str("response"),
        }
    }
}

/// Failure of a single mock dispatch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MockError {
    /// Mocking is turned off for this request.
    #[error("Mocking is disabled for this request: {url}")]
    Disabled { url: String },

    /// The effective configuration demands a simulated failure.
    #[error("{message} (status: {status})")]
    Forced {
        status: u16,
        message: String,
        details: Vec<serde_json::Value>,
    },

    /// Probabilistic simulated failure.
    #[error("Random mock error (status: {status})")]
    Random { status: u16 },

    /// A registered pattern could not be compiled or applied.
    #[error("Path matching failed: {0}")]
    RouteMatch(String),

    /// No registered route matched method and path.
    #[error("No mock endpoint found for \"{method} {path}\"")]
    NotFound { method: String, path: String },

    /// The matched handler failed.
    #[error("Handler for {key} failed: {message}")]
    Handler { key: String, message: String },

    /// A request or response hook failed. The hook's message is kept verbatim.
    #[error("{source}")]
    Hook {
        phase: HookPhase,
        #[source]
        source: BoxError,
    },
}

impl MockError {
    /// Status code carried by simulated failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            MockError::Forced { status, .. } | MockError::Random { status } => Some(*status),
            _ => None,
        }
    }
}

/// A route pattern that failed to compile.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("Missing path pattern in route key \"{0}\"")]
    MissingPattern(String),

    #[error("Unexpected {found} at index {index}, expected {expected}: {pattern}")]
    Unexpected {
        found: String,
        index: usize,
        expected: &'static str,
        pattern: String,
    },

    #[error("Missing parameter name at index {index}: {pattern}")]
    MissingName { index: usize, pattern: String },

    #[error("Invalid compiled pattern: {0}")]
    Regex(String),
}
