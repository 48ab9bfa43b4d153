//! Error types for cellhub-core.

use thiserror::Error;

/// Result type for cellhub-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cellhub-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Cell not found in the registry.
    #[error("cell not found: {0}")]
    CellNotFound(String),

    /// A discovery candidate or a single module failed to load.
    ///
    /// Never surfaced to callers of the registry; logged and absorbed.
    #[error("discovery error{}: {message}", module.as_ref().map(|m| format!(" for module {}", m)).unwrap_or_default())]
    Discovery {
        module: Option<String>,
        message: String,
    },

    /// A cell config violates the schema invariants.
    #[error("invalid schema for cell {cell_id}: {message}")]
    InvalidSchema { cell_id: String, message: String },

    /// The interactive session cannot perform the requested transition.
    #[error("invalid transition: cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error while fetching a discovery candidate.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Build a discovery error that is not tied to a single module.
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            module: None,
            message: message.into(),
        }
    }

    /// Build a discovery error for one module file.
    pub fn module_load(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Discovery {
            module: Some(module.into()),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_error_display() {
        let err = Error::discovery("no candidates");
        assert_eq!(err.to_string(), "discovery error: no candidates");

        let err = Error::module_load("fast_math.json", "bad manifest");
        assert_eq!(
            err.to_string(),
            "discovery error for module fast_math.json: bad manifest"
        );
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = Error::InvalidTransition {
            action: "submit",
            state: "idle",
        };
        assert_eq!(err.to_string(), "invalid transition: cannot submit while idle");
    }
}
