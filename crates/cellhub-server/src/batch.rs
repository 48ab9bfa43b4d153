//! Batch execution for the `/ai-api` endpoint.
//!
//! A batch names several cells and carries a JSON input object per cell.
//! Inputs are rendered back to raw text and go through headless coercion,
//! so a batch call and a query-string call for the same values agree.

use std::collections::HashMap;

use cellhub_core::schema::value_to_raw;
use cellhub_core::{Dispatcher, ExecutionRequest, ExecutionResult, RawValues, SourceMode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Cells to run, in order.
    #[serde(default)]
    pub cells: Vec<String>,
    /// Input object per cell id.
    #[serde(default)]
    pub data: HashMap<String, Map<String, Value>>,
}

/// Response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchResponse {
    Success {
        success: bool,
        results: Map<String, Value>,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl BatchResponse {
    fn success(results: Map<String, Value>) -> Self {
        BatchResponse::Success {
            success: true,
            results,
        }
    }

    fn failure(error: String) -> Self {
        BatchResponse::Failure {
            success: false,
            error,
        }
    }

    /// Whether every cell succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, BatchResponse::Success { .. })
    }
}

/// Run every known cell of a batch in order.
///
/// Unknown ids are skipped. The first failing cell aborts the batch.
pub async fn run_batch(dispatcher: &Dispatcher, request: BatchRequest) -> BatchResponse {
    let mut results = Map::new();

    for cell_id in &request.cells {
        if !dispatcher.registry().contains(cell_id) {
            tracing::debug!("Batch skips unknown cell {}", cell_id);
            continue;
        }

        let raw: RawValues = request
            .data
            .get(cell_id)
            .map(|inputs| {
                inputs
                    .iter()
                    .map(|(k, v)| (k.clone(), value_to_raw(v)))
                    .collect()
            })
            .unwrap_or_default();

        let result = dispatcher
            .dispatch(ExecutionRequest::new(cell_id.as_str(), raw, SourceMode::Headless))
            .await;
        match result {
            ExecutionResult::Success { payload } => {
                results.insert(cell_id.clone(), payload);
            }
            ExecutionResult::Failure(failure) => {
                tracing::warn!("Batch cell {} failed: {}", cell_id, failure.message);
                return BatchResponse::failure(format!("{}: {}", cell_id, failure.message));
            }
        }
    }

    BatchResponse::success(results)
}
