//! Error types for the CellHub server.

use crate::companion::CompanionError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] cellhub_core::Error),

    /// Companion backend error.
    #[error("Companion error: {0}")]
    Companion(#[from] CompanionError),

    /// Bind address could not be parsed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
