//! WebSocket protocol messages for the interactive view.
//!
//! Every message is a JSON object tagged by `type`.

use cellhub_core::{CellConfig, ExecutionResult, Form, RawValues, ResultPanel};
use serde::{Deserialize, Serialize};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request the cell catalog.
    ListCells,

    /// Select a cell from the catalog.
    SelectCell {
        /// Cell identifier; empty clears the selection.
        #[serde(default)]
        cell_id: String,
    },

    /// Submit the form with the current control values.
    Submit {
        /// Raw control values keyed by input id.
        #[serde(default)]
        values: RawValues,
    },

    /// Return from the result to the form.
    Back,
}

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
}

impl From<&CellConfig> for CellSummary {
    fn from(config: &CellConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            category: config.category.clone(),
            description: config.description.clone(),
        }
    }
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Registered cells, sorted by id.
    Catalog {
        /// Connection's session id.
        session_id: String,
        cells: Vec<CellSummary>,
    },

    /// A cell was selected; its form is ready.
    FormReady {
        form: Form,
    },

    /// The selection was cleared; execute is disabled.
    Cleared,

    /// A submission is running.
    Executing {
        cell_id: String,
    },

    /// Execution finished.
    ResultShown {
        cell_id: String,
        result: ExecutionResult,
        panel: ResultPanel,
    },

    /// The request could not be handled in the current state.
    Error {
        message: String,
    },
}
