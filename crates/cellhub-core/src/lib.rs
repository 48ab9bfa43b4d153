//! Core engine for the CellHub cell runner.
//!
//! This crate provides:
//! - Module discovery and the cell registry
//! - Input coercion from raw text to typed values
//! - The execution dispatcher and its result envelope
//! - Invocation mode selection and the interactive session
//! - Response formatting for both modes
//! - The built-in cell catalog

pub mod cell;
pub mod cells;
pub mod coerce;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod format;
pub mod mode;
pub mod registry;
pub mod schema;

pub use cell::{CellModule, CellProcess, InputMap};
pub use cells::{CellCatalog, FALLBACK_CELL_IDS};
pub use coerce::{RawValues, SourceMode, ValidationError, coerce, coerce_all};
pub use config::HubConfig;
pub use dispatch::{
    DispatchObserver, Dispatcher, ErrorKind, ExecutionFailure, ExecutionRequest, ExecutionResult,
};
pub use error::{Error, Result};
pub use form::{Form, FormField};
pub use format::{
    HeadlessResponse, ResponseFormat, ResultPanel, Tone, format_headless, format_interactive,
};
pub use mode::{
    HeadlessInvocation, InteractiveSession, InteractiveState, InvocationContext, InvocationMode,
    run_headless, select_mode,
};
pub use registry::{DiscoveryConfig, ModuleLocation, Registry, RegistrySource};
pub use schema::{CellConfig, InputKind, InputSpec};
