//! Interactive input form.
//!
//! A [`Form`] is the rendered view of a cell's input schema: one
//! [`FormField`] per declared input, carrying the control's current raw text.
//! Submitting a form hands those raw values to coercion unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::RawValues;
use crate::schema::{CellConfig, InputKind, InputSpec, value_to_raw};

/// Field definition sent to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormField {
    /// Numeric input.
    Number {
        /// Input id.
        id: String,
        /// Human-readable label.
        label: String,
        /// Advisory lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        /// Advisory upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        /// Current raw text.
        value: String,
    },
    /// Free text input.
    Text {
        id: String,
        label: String,
        value: String,
    },
    /// Dropdown.
    Select {
        id: String,
        label: String,
        /// Available options.
        options: Vec<String>,
        /// Currently selected option.
        value: String,
    },
    /// Multi-line JSON editor.
    Json {
        id: String,
        label: String,
        /// Current raw text; defaults are pretty-printed.
        value: String,
    },
}

impl FormField {
    /// Build the field for an input, pre-filled with its default.
    pub fn from_spec(spec: &InputSpec) -> Self {
        let id = spec.id.clone();
        let label = spec.label.clone();
        match &spec.kind {
            InputKind::Number { min, max } => FormField::Number {
                id,
                label,
                min: *min,
                max: *max,
                value: spec.default_as_raw().unwrap_or_default(),
            },
            InputKind::Text => FormField::Text {
                id,
                label,
                value: spec.default_as_raw().unwrap_or_default(),
            },
            InputKind::Select { options } => FormField::Select {
                id,
                label,
                value: spec
                    .default_as_raw()
                    .or_else(|| options.first().cloned())
                    .unwrap_or_default(),
                options: options.clone(),
            },
            InputKind::Json => FormField::Json {
                id,
                label,
                value: spec.default_value.as_ref().map(pretty).unwrap_or_default(),
            },
        }
    }

    /// Get the field id.
    pub fn id(&self) -> &str {
        match self {
            FormField::Number { id, .. }
            | FormField::Text { id, .. }
            | FormField::Select { id, .. }
            | FormField::Json { id, .. } => id,
        }
    }

    /// Current raw text.
    pub fn value(&self) -> &str {
        match self {
            FormField::Number { value, .. }
            | FormField::Text { value, .. }
            | FormField::Select { value, .. }
            | FormField::Json { value, .. } => value,
        }
    }

    fn set_value(&mut self, raw: String) {
        match self {
            FormField::Number { value, .. }
            | FormField::Text { value, .. }
            | FormField::Select { value, .. }
            | FormField::Json { value, .. } => *value = raw,
        }
    }
}

fn pretty(value: &Value) -> String {
    match value {
        Value::String(_) | Value::Null => value_to_raw(value),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// A cell's input form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    /// Cell the form belongs to.
    pub cell_id: String,
    /// Display name.
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// One field per input, in schema order.
    pub fields: Vec<FormField>,
}

impl Form {
    /// Render a cell's schema with default values.
    pub fn from_config(config: &CellConfig) -> Self {
        Self {
            cell_id: config.id.clone(),
            title: config.name.clone(),
            description: config.description.clone(),
            fields: config.inputs.iter().map(FormField::from_spec).collect(),
        }
    }

    /// Overwrite field values from raw input. Unknown keys are ignored.
    pub fn with_values(mut self, values: &RawValues) -> Self {
        for field in &mut self.fields {
            if let Some(raw) = values.get(field.id()) {
                field.set_value(raw.clone());
            }
        }
        self
    }

    /// Look up a field.
    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id() == id)
    }

    /// Current raw values of every field; what a submit sends.
    pub fn raw_values(&self) -> RawValues {
        self.fields
            .iter()
            .map(|f| (f.id().to_string(), f.value().to_string()))
            .collect()
    }
}
