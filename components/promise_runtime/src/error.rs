//! Error types for the promise runtime.
//!
//! Promise failures never surface as `Err` to callers: they become
//! rejection reasons. Only the event loop driver and configuration loading
//! return errors.

use core_types::{JsError, Value};
use thiserror::Error;

/// Failures detected by the resolution procedure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromiseError {
    /// A promise was resolved with itself.
    #[error("Chaining cycle detected for promise")]
    CyclicResolution,
}

impl From<PromiseError> for JsError {
    fn from(err: PromiseError) -> Self {
        JsError::type_error(err.to_string())
    }
}

impl From<PromiseError> for Value {
    fn from(err: PromiseError) -> Self {
        Value::Error(err.into())
    }
}

/// Errors returned while driving the event loop.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A task threw and nothing caught it.
    #[error("uncaught exception: {0}")]
    UncaughtException(Value),

    /// A single microtask drain ran more jobs than allowed.
    #[error("microtask drain exceeded its budget of {limit} jobs")]
    JobBudgetExceeded {
        /// The configured budget
        limit: usize,
    },
}

/// Errors loading an [`EventLoopConfig`](crate::EventLoopConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document was malformed or had unknown fields.
    #[error("invalid event loop config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for event loop operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;
