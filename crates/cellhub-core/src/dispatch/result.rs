//! The normalized result envelope.
//!
//! Serialized as
//!
//! ```json
//! { "ok": true, "payload": { "sin": 0.707, "cos": 0.707 } }
//! { "ok": false, "kind": "ValidationError", "message": "invalid number", "detail": "field 'angle': 'abc' is not a number" }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::ValidationError;

/// Failure classes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Input rejected before execution.
    #[serde(rename = "ValidationError")]
    Validation,
    /// The cell itself failed.
    #[serde(rename = "ExecutionError")]
    Execution,
    /// Unknown cell id.
    #[serde(rename = "NotFoundError")]
    NotFound,
}

impl ErrorKind {
    /// Name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Execution => "ExecutionError",
            ErrorKind::NotFound => "NotFoundError",
        }
    }
}

/// Failure half of an [`ExecutionResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Envelope", try_from = "Envelope")]
pub enum ExecutionResult {
    /// The cell returned a value.
    Success { payload: Value },
    /// Validation, lookup or execution failed.
    Failure(ExecutionFailure),
}

impl ExecutionResult {
    /// Wrap a payload.
    pub fn success(payload: Value) -> Self {
        ExecutionResult::Success { payload }
    }

    /// Build a failure.
    pub fn failure(kind: ErrorKind, message: impl Into<String>, detail: Option<String>) -> Self {
        ExecutionResult::Failure(ExecutionFailure {
            kind,
            message: message.into(),
            detail,
        })
    }

    /// Failure for an unknown cell id.
    pub fn not_found(cell_id: &str) -> Self {
        Self::failure(
            ErrorKind::NotFound,
            format!("cell not found: {}", cell_id),
            None,
        )
    }

    /// Whether this is the success variant.
    pub fn is_ok(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    /// Payload, if successful.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            ExecutionResult::Success { payload } => Some(payload),
            ExecutionResult::Failure(_) => None,
        }
    }

    /// Failure details, if failed.
    pub fn failure_info(&self) -> Option<&ExecutionFailure> {
        match self {
            ExecutionResult::Success { .. } => None,
            ExecutionResult::Failure(failure) => Some(failure),
        }
    }
}

impl From<ValidationError> for ExecutionResult {
    fn from(err: ValidationError) -> Self {
        let detail = err.detail();
        Self::failure(ErrorKind::Validation, err.to_string(), Some(detail))
    }
}

/// Flat wire form with the `ok` discriminator.
#[derive(Serialize, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl From<ExecutionResult> for Envelope {
    fn from(result: ExecutionResult) -> Self {
        match result {
            ExecutionResult::Success { payload } => Envelope {
                ok: true,
                payload: Some(payload),
                kind: None,
                message: None,
                detail: None,
            },
            ExecutionResult::Failure(f) => Envelope {
                ok: false,
                payload: None,
                kind: Some(f.kind),
                message: Some(f.message),
                detail: f.detail,
            },
        }
    }
}

impl TryFrom<Envelope> for ExecutionResult {
    type Error = String;

    fn try_from(env: Envelope) -> Result<Self, Self::Error> {
        if env.ok {
            return Ok(ExecutionResult::Success {
                payload: env.payload.unwrap_or(Value::Null),
            });
        }
        let kind = env.kind.ok_or("failure envelope without kind")?;
        Ok(ExecutionResult::Failure(ExecutionFailure {
            kind,
            message: env.message.unwrap_or_default(),
            detail: env.detail,
        }))
    }
}
