//! Per-connection interactive session.
//!
//! Wraps the core state machine and translates client messages into
//! server messages. One session lives exactly as long as its WebSocket.

use cellhub_core::{Dispatcher, InteractiveSession, InteractiveState};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::{CellSummary, ClientMessage, ServerMessage};

/// Sender half for messages bound to one client.
pub type MessageSender = mpsc::UnboundedSender<ServerMessage>;

/// An interactive session bound to one client connection.
pub struct ClientSession {
    /// Unique id, reported in the catalog message.
    id: Uuid,

    /// The state machine.
    session: InteractiveSession,

    /// Dispatcher, for catalog listings.
    dispatcher: Dispatcher,

    /// Outgoing messages.
    tx: MessageSender,
}

impl ClientSession {
    /// Create a session in the idle state.
    pub fn new(dispatcher: Dispatcher, tx: MessageSender) -> Self {
        Self {
            id: Uuid::new_v4(),
            session: InteractiveSession::new(dispatcher.clone()),
            dispatcher,
            tx,
        }
    }

    /// Session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state.
    pub fn state(&self) -> &InteractiveState {
        self.session.state()
    }

    fn send(&self, msg: ServerMessage) {
        // The receiver only goes away when the connection closes.
        let _ = self.tx.send(msg);
    }

    fn catalog(&self) -> ServerMessage {
        ServerMessage::Catalog {
            session_id: self.id.to_string(),
            cells: self
                .dispatcher
                .registry()
                .configs()
                .into_iter()
                .map(CellSummary::from)
                .collect(),
        }
    }

    /// Handle one client message.
    pub async fn handle(&mut self, msg: ClientMessage) {
        match msg {
            ClientMessage::ListCells => self.send(self.catalog()),

            ClientMessage::SelectCell { cell_id } => match self.session.select(&cell_id) {
                Ok(state) => {
                    let msg = state_message(state);
                    self.send(msg);
                }
                Err(e) => self.send(ServerMessage::Error {
                    message: e.to_string(),
                }),
            },

            ClientMessage::Submit { values } => {
                let request = match self.session.begin_submit(&values) {
                    Ok(request) => request,
                    Err(e) => {
                        self.send(ServerMessage::Error {
                            message: e.to_string(),
                        });
                        return;
                    }
                };

                self.send(ServerMessage::Executing {
                    cell_id: request.cell_id.clone(),
                });
                tracing::debug!("Session {} executing {}", self.id, request.cell_id);

                let result = self.dispatcher.dispatch(request).await;
                match self.session.finish(result) {
                    Ok(state) => {
                        let msg = state_message(state);
                        self.send(msg);
                    }
                    Err(e) => tracing::error!("Session {} lost its execution: {}", self.id, e),
                }
            }

            ClientMessage::Back => match self.session.back() {
                Ok(state) => {
                    let msg = state_message(state);
                    self.send(msg);
                }
                Err(e) => self.send(ServerMessage::Error {
                    message: e.to_string(),
                }),
            },
        }
    }
}

/// The message announcing a state.
fn state_message(state: &InteractiveState) -> ServerMessage {
    match state {
        InteractiveState::Idle => ServerMessage::Cleared,
        InteractiveState::FormReady { form } => ServerMessage::FormReady { form: form.clone() },
        InteractiveState::Executing { cell_id } => ServerMessage::Executing {
            cell_id: cell_id.clone(),
        },
        InteractiveState::ResultShown {
            cell_id,
            result,
            panel,
        } => ServerMessage::ResultShown {
            cell_id: cell_id.clone(),
            result: result.clone(),
            panel: panel.clone(),
        },
    }
}
