//! Dispatch progress callbacks.

use std::sync::Arc;
use std::time::Duration;

use crate::coerce::SourceMode;

use super::result::ExecutionFailure;

/// Callback trait for dispatch progress reporting.
pub trait DispatchObserver: Send + Sync {
    /// Called right before a cell's process function runs.
    fn on_started(&self, cell_id: &str, mode: SourceMode);

    /// Called when a cell returned a payload.
    fn on_completed(&self, cell_id: &str, elapsed: Duration);

    /// Called for any failure: lookup, validation or execution.
    fn on_failed(&self, cell_id: &str, failure: &ExecutionFailure);
}

/// Lets a caller keep a handle on the observer it attaches.
impl<T: DispatchObserver + ?Sized> DispatchObserver for Arc<T> {
    fn on_started(&self, cell_id: &str, mode: SourceMode) {
        (**self).on_started(cell_id, mode)
    }

    fn on_completed(&self, cell_id: &str, elapsed: Duration) {
        (**self).on_completed(cell_id, elapsed)
    }

    fn on_failed(&self, cell_id: &str, failure: &ExecutionFailure) {
        (**self).on_failed(cell_id, failure)
    }
}
