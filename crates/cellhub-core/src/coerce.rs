//! Conversion of raw textual input into typed values.
//!
//! Raw values arrive as strings: form control contents in interactive mode,
//! query parameters in headless mode. Each is coerced according to its
//! [`InputSpec`]:
//!
//! | type            | rule |
//! |-----------------|------|
//! | `number`        | trimmed, parsed as `f64`; unparsable, NaN or infinite input is rejected |
//! | `text`/`select` | passed through verbatim |
//! | `json`          | blank input is `null` (unless required); otherwise parsed |
//!
//! Required inputs are checked before coercion, in headless mode only.
//! Headless defaults go through the same rules as supplied values.
//! Bounds and option sets are presentation metadata and not enforced here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::cell::InputMap;
use crate::schema::{InputKind, InputSpec};

/// Raw input values keyed by input id.
pub type RawValues = HashMap<String, String>;

/// Where the raw values of a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Bound form controls; every input has a value.
    Interactive,
    /// Query parameters; inputs may be absent.
    Headless,
}

/// A raw value failed its input's rules.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required input was not supplied.
    #[error("missing required parameter: {field}")]
    MissingRequired { field: String },

    /// A number input did not parse to a finite number.
    #[error("invalid number")]
    InvalidNumber { field: String, raw: String },

    /// A JSON input did not parse.
    #[error("invalid JSON")]
    InvalidJson {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ValidationError {
    /// Id of the offending input.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingRequired { field }
            | ValidationError::InvalidNumber { field, .. }
            | ValidationError::InvalidJson { field, .. } => field,
        }
    }

    /// Human-readable context beyond the message.
    pub fn detail(&self) -> String {
        match self {
            ValidationError::MissingRequired { field } => format!("field '{}'", field),
            ValidationError::InvalidNumber { field, raw } => {
                format!("field '{}': '{}' is not a number", field, raw)
            }
            ValidationError::InvalidJson { field, source } => {
                format!("field '{}': {}", field, source)
            }
        }
    }
}

/// Coerce one raw value.
///
/// `raw` is `None` when the input was not supplied at all. In interactive
/// mode that is treated as an empty control.
pub fn coerce(spec: &InputSpec, raw: Option<&str>, mode: SourceMode) -> Result<Value, ValidationError> {
    let default;
    let raw = match (raw, mode) {
        (Some(raw), _) => raw,
        (None, SourceMode::Interactive) => "",
        (None, SourceMode::Headless) => {
            if spec.required {
                return Err(ValidationError::MissingRequired {
                    field: spec.id.clone(),
                });
            }
            default = spec.default_as_raw().unwrap_or_default();
            default.as_str()
        }
    };

    match &spec.kind {
        InputKind::Number { .. } => parse_number(&spec.id, raw.trim()),
        InputKind::Text | InputKind::Select { .. } => Ok(Value::String(raw.to_string())),
        InputKind::Json => {
            if raw.trim().is_empty() {
                if spec.required {
                    return Err(ValidationError::MissingRequired {
                        field: spec.id.clone(),
                    });
                }
                return Ok(Value::Null);
            }
            serde_json::from_str(raw).map_err(|source| ValidationError::InvalidJson {
                field: spec.id.clone(),
                source,
            })
        }
    }
}

fn parse_number(field: &str, raw: &str) -> Result<Value, ValidationError> {
    let invalid = || ValidationError::InvalidNumber {
        field: field.to_string(),
        raw: raw.to_string(),
    };

    let number: f64 = raw.parse().map_err(|_| invalid())?;
    // Rejects NaN and infinities, which JSON cannot carry.
    serde_json::Number::from_f64(number)
        .filter(|_| number.is_finite())
        .map(Value::Number)
        .ok_or_else(invalid)
}

/// Coerce every declared input in one pass, in schema order.
///
/// Stops at the first failing input. Raw values without a matching input
/// are ignored.
pub fn coerce_all(
    inputs: &[InputSpec],
    raw: &RawValues,
    mode: SourceMode,
) -> Result<InputMap, ValidationError> {
    let mut values = InputMap::new();
    for spec in inputs {
        let value = coerce(spec, raw.get(&spec.id).map(String::as_str), mode)?;
        values.insert(spec.id.clone(), value);
    }
    Ok(values)
}
