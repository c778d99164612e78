//! Error types for flow execution
//!
//! Task bodies report failures as [`TaskError`], an opaque `anyhow::Error`
//! supplied by the caller. The library never inspects it. Failures that the
//! library itself detects are described by [`FlowError`] and travel through
//! the same error slot, so callers can recover them with
//! `error.downcast_ref::<FlowError>()`.

use thiserror::Error;

/// The opaque error value carried by a failed completion.
pub type TaskError = anyhow::Error;

/// The completion signal of a task: a value on success, an error otherwise.
pub type TaskResult<T> = Result<T, TaskError>;

/// Failures detected by the runners rather than reported by task bodies
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("task {} dropped its continuation without completing", label_or_unnamed(.label))]
    Abandoned { label: Option<String> },

    #[error("task {} panicked: {message}", label_or_unnamed(.label))]
    Panicked {
        label: Option<String>,
        message: String,
    },

    #[error("invalid flow configuration for `{field}`: {reason}")]
    InvalidConfig { field: String, reason: String },
}

impl FlowError {
    /// Create an abandoned-continuation error
    pub fn abandoned(label: Option<String>) -> Self {
        Self::Abandoned { label }
    }

    /// Create a panic error from a join or unwind payload
    pub fn panicked(label: Option<String>, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { label, message }
    }

    /// Create a configuration validation error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error was produced by a panicking task body
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }
}

fn label_or_unnamed(label: &Option<String>) -> String {
    match label {
        Some(label) => format!("'{label}'"),
        None => "<unnamed>".to_string(),
    }
}
