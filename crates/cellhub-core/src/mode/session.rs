//! Interactive session state machine.
//!
//! ```text
//!            select(known)             submit
//!   Idle ─────────────────► FormReady ────────► Executing ──► ResultShown
//!    ▲                        ▲   │                               │
//!    └── select(unknown) ─────┘   └───────────── back ◄───────────┘
//! ```
//!
//! `select` is accepted in every state except `Executing`.

use crate::coerce::{RawValues, SourceMode};
use crate::dispatch::{Dispatcher, ExecutionRequest, ExecutionResult};
use crate::error::{Error, Result};
use crate::form::Form;
use crate::format::{ResultPanel, format_interactive};

/// Current state of an interactive session.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractiveState {
    /// No cell selected; execute disabled.
    Idle,
    /// A cell's form is shown and can be submitted.
    FormReady { form: Form },
    /// A submission is in flight.
    Executing { cell_id: String },
    /// The last execution's result is shown.
    ResultShown {
        cell_id: String,
        result: ExecutionResult,
        panel: ResultPanel,
    },
}

impl InteractiveState {
    /// State name as used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            InteractiveState::Idle => "idle",
            InteractiveState::FormReady { .. } => "form_ready",
            InteractiveState::Executing { .. } => "executing",
            InteractiveState::ResultShown { .. } => "result_shown",
        }
    }
}

/// One user's interactive session.
pub struct InteractiveSession {
    dispatcher: Dispatcher,
    state: InteractiveState,
    /// Form as last submitted, restored by `back`.
    submitted: Option<Form>,
}

impl InteractiveSession {
    /// Start a session in `Idle`.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            state: InteractiveState::Idle,
            submitted: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> &InteractiveState {
        &self.state
    }

    /// Whether the execute control is enabled.
    pub fn can_execute(&self) -> bool {
        matches!(self.state, InteractiveState::FormReady { .. })
    }

    /// Select a cell. Unknown or empty ids clear the view.
    pub fn select(&mut self, cell_id: &str) -> Result<&InteractiveState> {
        if let InteractiveState::Executing { .. } = self.state {
            return Err(self.invalid("select a cell"));
        }

        self.submitted = None;
        self.state = match self.dispatcher.registry().get(cell_id.trim()) {
            Ok(cell) => InteractiveState::FormReady {
                form: Form::from_config(cell.config()),
            },
            Err(_) => {
                if !cell_id.trim().is_empty() {
                    tracing::debug!("Selected unknown cell {}; clearing form", cell_id);
                }
                InteractiveState::Idle
            }
        };
        Ok(&self.state)
    }

    /// Enter `Executing` and build the request for the bound form values.
    ///
    /// The caller must follow with [`finish`](Self::finish).
    pub fn begin_submit(&mut self, values: &RawValues) -> Result<ExecutionRequest> {
        let InteractiveState::FormReady { form } = &self.state else {
            return Err(self.invalid("submit"));
        };

        let form = form.clone().with_values(values);
        let request = ExecutionRequest::new(form.cell_id.clone(), form.raw_values(), SourceMode::Interactive);
        self.state = InteractiveState::Executing {
            cell_id: form.cell_id.clone(),
        };
        self.submitted = Some(form);
        Ok(request)
    }

    /// Leave `Executing` with the dispatch result.
    pub fn finish(&mut self, result: ExecutionResult) -> Result<&InteractiveState> {
        let InteractiveState::Executing { cell_id } = &self.state else {
            return Err(self.invalid("show a result"));
        };

        self.state = InteractiveState::ResultShown {
            cell_id: cell_id.clone(),
            panel: format_interactive(&result),
            result,
        };
        Ok(&self.state)
    }

    /// Submit the form and wait for the result.
    pub async fn submit(&mut self, values: &RawValues) -> Result<&InteractiveState> {
        let request = self.begin_submit(values)?;
        let result = self.dispatcher.dispatch(request).await;
        self.finish(result)
    }

    /// Return from a result to the form, keeping the submitted values.
    pub fn back(&mut self) -> Result<&InteractiveState> {
        if !matches!(self.state, InteractiveState::ResultShown { .. }) {
            return Err(self.invalid("go back"));
        }
        let form = self.submitted.clone().ok_or_else(|| self.invalid("go back"))?;
        self.state = InteractiveState::FormReady { form };
        Ok(&self.state)
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::cells::CellCatalog;
    use crate::dispatch::ErrorKind;
    use crate::format::Tone;
    use crate::registry::Registry;

    fn session() -> InteractiveSession {
        let catalog = CellCatalog::builtin();
        let registry = Registry::from_modules([
            catalog.default_module("fast_math").unwrap(),
            catalog.default_module("error_handler").unwrap(),
        ]);
        InteractiveSession::new(Dispatcher::new(Arc::new(registry)))
    }

    fn values(pairs: &[(&str, &str)]) -> RawValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_starts_idle() {
        let s = session();
        assert_eq!(s.state(), &InteractiveState::Idle);
        assert!(!s.can_execute());
    }

    #[test]
    fn test_select_known_renders_form() {
        let mut s = session();
        let state = s.select("fast_math").unwrap();
        let InteractiveState::FormReady { form } = state else {
            panic!("expected form, got {:?}", state);
        };
        assert_eq!(form.field("angle").unwrap().value(), "45");
        assert!(s.can_execute());
    }

    #[test]
    fn test_select_unknown_clears() {
        let mut s = session();
        s.select("fast_math").unwrap();
        assert_eq!(s.select("warp_drive").unwrap(), &InteractiveState::Idle);
        assert_eq!(s.select("").unwrap(), &InteractiveState::Idle);
        assert!(!s.can_execute());
    }

    #[tokio::test]
    async fn test_submit_from_idle_is_rejected() {
        let mut s = session();
        let err = s.submit(&RawValues::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid transition: cannot submit while idle");
    }

    #[tokio::test]
    async fn test_submit_shows_result() {
        let mut s = session();
        s.select("fast_math").unwrap();
        let state = s.submit(&values(&[("angle", "90")])).await.unwrap();
        let InteractiveState::ResultShown { cell_id, result, panel } = state else {
            panic!("expected result, got {:?}", state);
        };
        assert_eq!(cell_id, "fast_math");
        assert_eq!(result.payload(), Some(&json!({ "sin": 1.0, "cos": 0.0 })));
        assert_eq!(panel.tone, Tone::Success);
    }

    #[tokio::test]
    async fn test_validation_failure_is_shown_inline() {
        let mut s = session();
        s.select("fast_math").unwrap();
        let state = s.submit(&values(&[("angle", "north")])).await.unwrap();
        let InteractiveState::ResultShown { result, panel, .. } = state else {
            panic!("expected result, got {:?}", state);
        };
        assert_eq!(result.failure_info().unwrap().kind, ErrorKind::Validation);
        assert_eq!(panel.tone, Tone::Failure);
    }

    #[tokio::test]
    async fn test_submit_twice_is_rejected() {
        let mut s = session();
        s.select("fast_math").unwrap();
        s.submit(&RawValues::new()).await.unwrap();
        assert!(matches!(
            s.submit(&RawValues::new()).await,
            Err(Error::InvalidTransition { action: "submit", state: "result_shown" })
        ));
    }

    #[tokio::test]
    async fn test_back_keeps_values() {
        let mut s = session();
        s.select("error_handler").unwrap();
        s.submit(&values(&[("error_code", "0x41")])).await.unwrap();

        let InteractiveState::FormReady { form } = s.back().unwrap() else {
            panic!("expected form");
        };
        assert_eq!(form.field("error_code").unwrap().value(), "0x41");
        assert!(s.can_execute());
    }

    #[test]
    fn test_back_outside_result_is_rejected() {
        let mut s = session();
        s.select("fast_math").unwrap();
        assert!(s.back().is_err());
    }

    #[test]
    fn test_executing_blocks_select() {
        let mut s = session();
        s.select("fast_math").unwrap();
        s.begin_submit(&RawValues::new()).unwrap();
        assert_eq!(s.state().name(), "executing");
        assert!(s.select("error_handler").is_err());

        s.finish(ExecutionResult::success(json!(null))).unwrap();
        assert_eq!(s.state().name(), "result_shown");
    }
}
