//! Invocation mode selection.
//!
//! A request is headless when its query carries both a truthy `headless`
//! marker and a non-empty `cell` parameter; everything else drives the
//! interactive view.

mod session;

pub use session::{InteractiveSession, InteractiveState};

use crate::coerce::{RawValues, SourceMode};
use crate::dispatch::{Dispatcher, ExecutionRequest};
use crate::format::{HeadlessResponse, ResponseFormat, format_headless};

/// Query parameter naming the target cell.
pub const CELL_PARAM: &str = "cell";
/// Query parameter marking a headless request.
pub const HEADLESS_PARAM: &str = "headless";
/// Query parameter selecting the response format.
pub const FORMAT_PARAM: &str = "format";

/// Parsed query parameters of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    params: RawValues,
}

impl InvocationContext {
    /// Parse a URL query string, with or without the leading `?`.
    ///
    /// Repeated keys keep the last value.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(
            url::form_urlencoded::parse(query.as_bytes()).map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// Build from already-decoded pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Value of one parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Whether the headless marker is set.
    pub fn headless_requested(&self) -> bool {
        match self.get(HEADLESS_PARAM) {
            Some(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false"),
            None => false,
        }
    }

    /// All parameters.
    pub fn params(&self) -> &RawValues {
        &self.params
    }
}

/// A headless invocation, ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessInvocation {
    pub cell_id: String,
    pub format: ResponseFormat,
    /// Every query parameter; inputs are picked out by id during coercion.
    pub raw_values: RawValues,
}

/// Which mode a request runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationMode {
    Interactive,
    Headless(HeadlessInvocation),
}

/// Decide the mode of a request.
pub fn select_mode(ctx: &InvocationContext) -> InvocationMode {
    let cell_id = ctx.get(CELL_PARAM).map(str::trim).unwrap_or_default();
    if !ctx.headless_requested() || cell_id.is_empty() {
        return InvocationMode::Interactive;
    }

    InvocationMode::Headless(HeadlessInvocation {
        cell_id: cell_id.to_string(),
        format: ResponseFormat::parse(ctx.get(FORMAT_PARAM)),
        raw_values: ctx.params().clone(),
    })
}

/// Run one headless invocation end to end.
pub async fn run_headless(dispatcher: &Dispatcher, invocation: HeadlessInvocation) -> HeadlessResponse {
    let HeadlessInvocation {
        cell_id,
        format,
        raw_values,
    } = invocation;

    tracing::debug!("Headless invocation of {} ({:?})", cell_id, format);
    let result = dispatcher
        .dispatch(ExecutionRequest::new(cell_id, raw_values, SourceMode::Headless))
        .await;
    format_headless(&result, format)
}
