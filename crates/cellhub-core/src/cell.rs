//! The cell plugin interface.
//!
//! A cell is a [`CellConfig`] paired with a pure [`CellProcess`]. Configs
//! come from module manifests; processes are compiled in and bound by id
//! through the [`CellCatalog`](crate::cells::CellCatalog).

use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use serde_json::{Map, Value};

use crate::schema::CellConfig;

/// Coerced inputs handed to a cell, keyed by input id.
pub type InputMap = Map<String, Value>;

/// The computation behind a cell.
///
/// Implementations must be pure: the same inputs always produce the same
/// output, and no state is shared between calls.
pub trait CellProcess: Send + Sync {
    /// Run the computation.
    fn process(&self, inputs: &InputMap) -> anyhow::Result<Value>;
}

impl<F> CellProcess for F
where
    F: Fn(&InputMap) -> anyhow::Result<Value> + Send + Sync,
{
    fn process(&self, inputs: &InputMap) -> anyhow::Result<Value> {
        self(inputs)
    }
}

/// A loaded cell. Immutable once built.
#[derive(Clone)]
pub struct CellModule {
    config: CellConfig,
    process: Arc<dyn CellProcess>,
}

impl CellModule {
    /// Pair a config with its process.
    pub fn new(config: CellConfig, process: Arc<dyn CellProcess>) -> Self {
        Self { config, process }
    }

    /// Cell identifier.
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Cell metadata.
    pub fn config(&self) -> &CellConfig {
        &self.config
    }

    /// Invoke the process function directly, without any failure boundary.
    ///
    /// Callers outside the dispatcher should go through
    /// [`Dispatcher::execute`](crate::dispatch::Dispatcher::execute).
    pub fn process(&self, inputs: &InputMap) -> anyhow::Result<Value> {
        self.process.process(inputs)
    }
}

impl fmt::Debug for CellModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellModule")
            .field("id", &self.config.id)
            .field("inputs", &self.config.inputs.len())
            .finish()
    }
}

// =============================================================================
// Input accessors for cell implementations
// =============================================================================

/// Read a numeric input.
pub fn input_f64(inputs: &InputMap, id: &str) -> anyhow::Result<f64> {
    inputs
        .get(id)
        .with_context(|| format!("missing input '{}'", id))?
        .as_f64()
        .with_context(|| format!("input '{}' is not a number", id))
}

/// Read a numeric input, falling back to `default` when absent or null.
pub fn input_f64_or(inputs: &InputMap, id: &str, default: f64) -> anyhow::Result<f64> {
    match inputs.get(id) {
        None | Some(Value::Null) => Ok(default),
        Some(_) => input_f64(inputs, id),
    }
}

/// Read a string input.
pub fn input_str<'a>(inputs: &'a InputMap, id: &str) -> anyhow::Result<&'a str> {
    inputs
        .get(id)
        .with_context(|| format!("missing input '{}'", id))?
        .as_str()
        .with_context(|| format!("input '{}' is not a string", id))
}

/// Read a JSON input as an array of numbers.
pub fn input_f64_array(inputs: &InputMap, id: &str) -> anyhow::Result<Vec<f64>> {
    let value = inputs
        .get(id)
        .with_context(|| format!("missing input '{}'", id))?;
    let items = value
        .as_array()
        .with_context(|| format!("input '{}' is not an array", id))?;

    items
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64()
                .with_context(|| format!("input '{}'[{}] is not a number", id, i))
        })
        .collect()
}
