//! Error types for the Para client.

/// Core error type for the Para client.
#[derive(Debug, thiserror::Error)]
pub enum ParaError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required argument was blank or missing.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A payload could not be converted to or from JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for Para client operations.
pub type ParaResult<T> = Result<T, ParaError>;
