//! Execution dispatcher.
//!
//! Runs a cell's process function inside a failure boundary and wraps the
//! outcome in an [`ExecutionResult`]. Nothing a cell does, returning an
//! error or panicking, propagates past [`Dispatcher::execute`].
//!
//! # Pipeline
//!
//! ```text
//! ExecutionRequest
//!     │
//!     ├── Registry::get ─────────────► NotFoundError
//!     │
//!     ├── coerce_all ────────────────► ValidationError
//!     │
//!     └── Dispatcher::execute
//!             ├── Ok(payload) ───────► { ok: true, payload }
//!             ├── Err(e) ────────────► ExecutionError (detail: error chain)
//!             └── panic ─────────────► ExecutionError (detail: "cell panicked")
//! ```
//!
//! Each request gets a single attempt; there are no retries.

mod observer;
mod result;

pub use observer::DispatchObserver;
pub use result::{ErrorKind, ExecutionFailure, ExecutionResult};

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::cell::{CellModule, InputMap};
use crate::coerce::{RawValues, SourceMode, coerce_all};
use crate::registry::Registry;

/// One invocation of one cell, before coercion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Target cell.
    pub cell_id: String,
    /// Raw values keyed by input id.
    #[serde(default)]
    pub raw_values: RawValues,
    /// Where the raw values came from.
    pub source_mode: SourceMode,
}

impl ExecutionRequest {
    /// Create a request.
    pub fn new(cell_id: impl Into<String>, raw_values: RawValues, source_mode: SourceMode) -> Self {
        Self {
            cell_id: cell_id.into(),
            raw_values,
            source_mode,
        }
    }
}

/// Dispatches requests against a registry.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    observer: Option<Arc<dyn DispatchObserver>>,
}

impl Dispatcher {
    /// Create a dispatcher over a populated registry.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            observer: None,
        }
    }

    /// Attach a progress observer.
    pub fn with_observer(mut self, observer: impl DispatchObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// The registry requests are resolved against.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve, coerce and execute a request.
    pub async fn dispatch(&self, request: ExecutionRequest) -> ExecutionResult {
        let ExecutionRequest {
            cell_id,
            raw_values,
            source_mode,
        } = request;

        let Ok(cell) = self.registry.get(&cell_id) else {
            tracing::debug!("Dispatch of unknown cell {}", cell_id);
            return self.report(&cell_id, ExecutionResult::not_found(&cell_id));
        };

        let inputs = match coerce_all(&cell.config().inputs, &raw_values, source_mode) {
            Ok(inputs) => inputs,
            Err(e) => {
                tracing::debug!("Validation failed for {}: {}", cell_id, e.detail());
                return self.report(&cell_id, e.into());
            }
        };

        if let Some(observer) = &self.observer {
            observer.on_started(&cell_id, source_mode);
        }
        self.execute(&cell, inputs).await
    }

    /// Execute a cell with already-coerced inputs.
    pub async fn execute(&self, cell: &CellModule, inputs: InputMap) -> ExecutionResult {
        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| cell.process(&inputs)));

        let result = match outcome {
            Ok(Ok(payload)) => {
                let elapsed = start.elapsed();
                tracing::debug!("Cell {} completed in {:?}", cell.id(), elapsed);
                if let Some(observer) = &self.observer {
                    observer.on_completed(cell.id(), elapsed);
                }
                return ExecutionResult::success(payload);
            }
            Ok(Err(e)) => ExecutionResult::failure(
                ErrorKind::Execution,
                e.to_string(),
                Some(format!("{:?}", e)),
            ),
            Err(panic) => ExecutionResult::failure(
                ErrorKind::Execution,
                panic_message(panic.as_ref()),
                Some("cell panicked".to_string()),
            ),
        };

        tracing::debug!("Cell {} failed", cell.id());
        self.report(cell.id(), result)
    }

    fn report(&self, cell_id: &str, result: ExecutionResult) -> ExecutionResult {
        if let (Some(observer), Some(failure)) = (&self.observer, result.failure_info()) {
            observer.on_failed(cell_id, failure);
        }
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "cell panicked".to_string()
    }
}
