//! Integration tests for the WebSocket wire format.
//!
//! Drives a session through a full select, submit and back cycle and checks
//! the JSON the browser client reads.

use std::sync::Arc;

use cellhub_core::{CellCatalog, Dispatcher, Registry};
use cellhub_server::{ClientMessage, ClientSession, ServerMessage};
use serde_json::{Value, json};
use tokio::sync::mpsc;

fn session() -> (ClientSession, mpsc::UnboundedReceiver<ServerMessage>) {
    let catalog = CellCatalog::builtin();
    let registry = Registry::from_modules([
        catalog.default_module("motor_model").unwrap(),
        catalog.default_module("pid_controller").unwrap(),
    ]);
    let (tx, rx) = mpsc::unbounded_channel();
    (ClientSession::new(Dispatcher::new(Arc::new(registry)), tx), rx)
}

fn wire(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<Value> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(serde_json::to_value(&msg).unwrap());
    }
    out
}

fn send(raw: Value) -> ClientMessage {
    serde_json::from_value(raw).unwrap()
}

#[tokio::test]
async fn test_catalog_wire_shape() {
    let (mut s, mut rx) = session();
    s.handle(send(json!({ "type": "list_cells" }))).await;

    let msgs = wire(&mut rx);
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0]["type"], "catalog");
    assert_eq!(msgs[0]["session_id"], s.id().to_string());
    let ids: Vec<&str> = msgs[0]["cells"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["motor_model", "pid_controller"]);
}

#[tokio::test]
async fn test_form_fields_are_tagged() {
    let (mut s, mut rx) = session();
    s.handle(send(json!({ "type": "select_cell", "cell_id": "motor_model" })))
        .await;

    let msgs = wire(&mut rx);
    assert_eq!(msgs[0]["type"], "form_ready");
    let fields = msgs[0]["form"]["fields"].as_array().unwrap();
    assert!(!fields.is_empty());
    for field in fields {
        let tag = field["type"].as_str().unwrap();
        assert!(matches!(tag, "number" | "text" | "select" | "json"), "unexpected tag {}", tag);
        assert!(field["id"].is_string());
    }
    assert!(fields.iter().any(|f| f["type"] == "select"));
}

#[tokio::test]
async fn test_submit_cycle_wire_shape() {
    let (mut s, mut rx) = session();
    s.handle(send(json!({ "type": "select_cell", "cell_id": "pid_controller" })))
        .await;
    s.handle(send(json!({ "type": "submit", "values": {} }))).await;
    s.handle(send(json!({ "type": "back" }))).await;

    let msgs = wire(&mut rx);
    let tags: Vec<&str> = msgs.iter().map(|m| m["type"].as_str().unwrap()).collect();
    assert_eq!(tags, vec!["form_ready", "executing", "result_shown", "form_ready"]);

    let shown = &msgs[2];
    assert_eq!(shown["cell_id"], "pid_controller");
    assert_eq!(shown["result"]["ok"], true);
    assert!(shown["result"]["payload"]["output"].is_number());
    assert_eq!(shown["panel"]["tone"], "success");
}

#[tokio::test]
async fn test_invalid_transition_reports_error() {
    let (mut s, mut rx) = session();
    s.handle(send(json!({ "type": "back" }))).await;

    let msgs = wire(&mut rx);
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0]["type"], "error");
    assert!(msgs[0]["message"].as_str().unwrap().contains("invalid transition"));
}
