//! Declarative input schema for cells.
//!
//! A cell declares its inputs as a list of [`InputSpec`]s. The schema is
//! read from a module manifest at discovery time and drives both coercion
//! (see [`crate::coerce`]) and form rendering (see [`crate::form`]).
//!
//! The manifest format keeps the type discriminator and the default value
//! inline with the spec:
//!
//! ```json
//! { "id": "month", "label": "Month (1-12)", "type": "number", "min": 1, "max": 12, "value": 7 }
//! ```

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Type-specific part of an input declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputKind {
    /// Floating point number. Bounds are advisory.
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Free text, passed through verbatim.
    Text,
    /// One of an ordered set of options.
    Select { options: Vec<String> },
    /// Arbitrary JSON document.
    Json,
}

impl InputKind {
    /// Name of the type as it appears in manifests.
    pub fn type_name(&self) -> &'static str {
        match self {
            InputKind::Number { .. } => "number",
            InputKind::Text => "text",
            InputKind::Select { .. } => "select",
            InputKind::Json => "json",
        }
    }
}

/// A single declared input of a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    /// Identifier, unique within the cell. Also the query parameter name.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Declared type and its type-specific metadata.
    #[serde(flatten)]
    pub kind: InputKind,
    /// Default value.
    #[serde(default, rename = "value", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Whether a headless invocation must supply this input.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

impl InputSpec {
    fn new(id: &str, label: &str, kind: InputKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind,
            default_value: None,
            required: false,
        }
    }

    /// Declare a number input.
    pub fn number(id: &str, label: &str) -> Self {
        Self::new(id, label, InputKind::Number { min: None, max: None })
    }

    /// Declare a text input.
    pub fn text(id: &str, label: &str) -> Self {
        Self::new(id, label, InputKind::Text)
    }

    /// Declare a select input over the given options.
    pub fn select(id: &str, label: &str, options: &[&str]) -> Self {
        Self::new(
            id,
            label,
            InputKind::Select {
                options: options.iter().map(|s| s.to_string()).collect(),
            },
        )
    }

    /// Declare a JSON input.
    pub fn json(id: &str, label: &str) -> Self {
        Self::new(id, label, InputKind::Json)
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set advisory bounds. Has no effect on non-number inputs.
    pub fn with_range(mut self, lo: f64, hi: f64) -> Self {
        if let InputKind::Number { min, max } = &mut self.kind {
            *min = Some(lo);
            *max = Some(hi);
        }
        self
    }

    /// Mark the input as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Default value rendered as raw text, the way a form control or a
    /// query parameter would carry it.
    pub fn default_as_raw(&self) -> Option<String> {
        self.default_value.as_ref().map(value_to_raw)
    }
}

/// Render a JSON value as raw input text.
///
/// Strings are taken verbatim, everything else is serialized.
pub fn value_to_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Cell metadata: everything a module declares except its process function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellConfig {
    /// Unique cell identifier, the registry key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Grouping used by the presentation layer.
    #[serde(default)]
    pub category: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Declared inputs, in display order.
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
}

impl CellConfig {
    /// Look up an input by id.
    pub fn input(&self, id: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.id == id)
    }

    /// Check the schema invariants.
    ///
    /// - the cell id is non-empty
    /// - input ids are unique
    /// - selects have at least one option
    /// - `min <= max` when both bounds are present
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Error::InvalidSchema {
            cell_id: self.id.clone(),
            message,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("cell id is empty".to_string()));
        }

        let mut seen = FxHashSet::default();
        for input in &self.inputs {
            if !seen.insert(input.id.as_str()) {
                return Err(invalid(format!("duplicate input id '{}'", input.id)));
            }

            match &input.kind {
                InputKind::Select { options } if options.is_empty() => {
                    return Err(invalid(format!("select input '{}' has no options", input.id)));
                }
                InputKind::Number {
                    min: Some(lo),
                    max: Some(hi),
                } if lo > hi => {
                    return Err(invalid(format!(
                        "number input '{}' has min {} greater than max {}",
                        input.id, lo, hi
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }
}
