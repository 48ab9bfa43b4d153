//! Per-cell dispatch counters.
//!
//! Attached to the server's dispatcher as its observer, so headless
//! requests, WebSocket submissions and batch runs are all counted.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use cellhub_core::{DispatchObserver, ErrorKind, ExecutionFailure, SourceMode};
use serde::{Deserialize, Serialize};

/// Counters for one cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellStats {
    /// Form submissions that passed validation.
    pub interactive: u64,
    /// Query and batch invocations that passed validation.
    pub headless: u64,
    /// Runs that returned a payload.
    pub completed: u64,
    /// Validation and execution failures.
    pub failed: u64,
    /// Wall time of the most recent completed run.
    pub last_elapsed_ms: Option<f64>,
}

/// Dispatch observer that counts outcomes per registered cell.
#[derive(Debug, Default)]
pub struct DispatchStats {
    cells: Mutex<BTreeMap<String, CellStats>>,
}

impl DispatchStats {
    fn cells(&self) -> MutexGuard<'_, BTreeMap<String, CellStats>> {
        // Counters stay usable even if a holder panicked.
        self.cells.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current counters, keyed by cell id.
    pub fn snapshot(&self) -> BTreeMap<String, CellStats> {
        self.cells().clone()
    }
}

impl DispatchObserver for DispatchStats {
    fn on_started(&self, cell_id: &str, mode: SourceMode) {
        let mut cells = self.cells();
        let stats = cells.entry(cell_id.to_string()).or_default();
        match mode {
            SourceMode::Interactive => stats.interactive += 1,
            SourceMode::Headless => stats.headless += 1,
        }
    }

    fn on_completed(&self, cell_id: &str, elapsed: Duration) {
        let mut cells = self.cells();
        let stats = cells.entry(cell_id.to_string()).or_default();
        stats.completed += 1;
        stats.last_elapsed_ms = Some(elapsed.as_secs_f64() * 1000.0);
    }

    fn on_failed(&self, cell_id: &str, failure: &ExecutionFailure) {
        // Unknown ids come straight from callers; don't grow the table for them.
        if failure.kind == ErrorKind::NotFound {
            tracing::debug!("Request for unknown cell {}", cell_id);
            return;
        }
        tracing::info!("Cell {} failed: {}: {}", cell_id, failure.kind.as_str(), failure.message);
        self.cells().entry(cell_id.to_string()).or_default().failed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cellhub_core::{CellCatalog, Dispatcher, ExecutionRequest, RawValues, Registry};

    fn dispatcher(stats: Arc<DispatchStats>) -> Dispatcher {
        let catalog = CellCatalog::builtin();
        let registry = Registry::from_modules([catalog.default_module("fast_math").unwrap()]);
        Dispatcher::new(Arc::new(registry)).with_observer(stats)
    }

    fn angle(value: &str) -> RawValues {
        let mut raw = RawValues::new();
        raw.insert("angle".to_string(), value.to_string());
        raw
    }

    #[tokio::test]
    async fn test_counts_by_source_and_outcome() {
        let stats = Arc::new(DispatchStats::default());
        let d = dispatcher(stats.clone());

        d.dispatch(ExecutionRequest::new("fast_math", angle("45"), SourceMode::Headless))
            .await;
        d.dispatch(ExecutionRequest::new("fast_math", angle("30"), SourceMode::Interactive))
            .await;
        d.dispatch(ExecutionRequest::new("fast_math", angle("north"), SourceMode::Headless))
            .await;

        let snapshot = stats.snapshot();
        let fast_math = &snapshot["fast_math"];
        assert_eq!(fast_math.headless, 1);
        assert_eq!(fast_math.interactive, 1);
        assert_eq!(fast_math.completed, 2);
        assert_eq!(fast_math.failed, 1);
        assert!(fast_math.last_elapsed_ms.is_some());
    }

    #[tokio::test]
    async fn test_unknown_cells_are_not_tracked() {
        let stats = Arc::new(DispatchStats::default());
        dispatcher(stats.clone())
            .dispatch(ExecutionRequest::new("warp_drive", RawValues::new(), SourceMode::Headless))
            .await;
        assert!(stats.snapshot().is_empty());
    }
}
