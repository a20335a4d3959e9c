//! Deployment error types

use stackflow_core::RenderError;
use thiserror::Error;

/// Errors raised by the provisioning client or the orchestrator
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Stack not found: {0}")]
    StackNotFound(String),

    /// The service rejected the template or parameters
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Another operation is already running against the stack
    #[error("Concurrent operation in progress: {0}")]
    Conflict(String),

    /// Network or throttling failure; safe to retry
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Missing values for required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Whether the failed call may be retried as-is
    pub fn is_transient(&self) -> bool {
        matches!(self, CloudError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
