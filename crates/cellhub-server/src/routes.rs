//! HTTP and WebSocket routes for the CellHub server.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{
        RawQuery, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::{Response, StatusCode, header},
    response::{IntoResponse, Json},
    routing::{get, post},
};

#[cfg(feature = "embedded-frontend")]
use axum::extract::Path as AxumPath;

#[cfg(not(feature = "embedded-frontend"))]
use axum::response::Html;
use cellhub_core::{
    Dispatcher, HeadlessResponse, InvocationContext, InvocationMode, run_headless, select_mode,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tower_http::cors::CorsLayer;

use crate::batch::{BatchRequest, BatchResponse, run_batch};
use crate::probe::ProbeStatus;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::ClientSession;
use crate::stats::DispatchStats;

#[cfg(feature = "embedded-frontend")]
use crate::embedded_frontend;

/// Application state shared across handlers.
pub struct AppState {
    /// Dispatcher over the discovered registry, observed by `stats`.
    pub dispatcher: Dispatcher,
    /// Per-cell dispatch counters.
    pub stats: Arc<DispatchStats>,
    /// Companion backend, if configured.
    pub companion_url: Option<String>,
    /// Companion probe status, if probing.
    pub probe: Option<watch::Receiver<ProbeStatus>>,
}

impl AppState {
    /// State without a companion backend. Attaches the stats observer.
    pub fn new(dispatcher: Dispatcher) -> Self {
        let stats = Arc::new(DispatchStats::default());
        Self {
            dispatcher: dispatcher.with_observer(stats.clone()),
            stats,
            companion_url: None,
            probe: None,
        }
    }
}

/// Create the router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ping", get(ping_handler))
        .route("/ws", get(ws_handler))
        .route("/api/cells", get(cells_handler))
        .route("/api/status", get(status_handler))
        .route("/api/stats", get(stats_handler))
        .route("/ai-api", post(batch_handler));

    #[cfg(feature = "embedded-frontend")]
    let router = router.route("/static/{*path}", get(static_handler));

    router.layer(CorsLayer::permissive()).with_state(state)
}

/// Root: headless invocation when the query asks for it, else the UI.
async fn index_handler(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> Response<Body> {
    let ctx = InvocationContext::from_query(query.as_deref().unwrap_or_default());
    match select_mode(&ctx) {
        InvocationMode::Headless(invocation) => {
            let response = run_headless(&state.dispatcher, invocation).await;
            headless_response(response)
        }
        InvocationMode::Interactive => interactive_page(),
    }
}

fn headless_response(response: HeadlessResponse) -> Response<Body> {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
        .into_response()
}

#[cfg(feature = "embedded-frontend")]
fn interactive_page() -> Response<Body> {
    embedded_frontend::serve_index()
}

/// Minimal page when the embedded frontend is disabled.
#[cfg(not(feature = "embedded-frontend"))]
fn interactive_page() -> Response<Body> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>CellHub</title>
    <style>
        body { font-family: system-ui, sans-serif; margin: 2rem; }
        h1 { color: #0f766e; }
    </style>
</head>
<body>
    <h1>CellHub Server</h1>
    <p>WebSocket endpoint: <code>/ws</code></p>
    <p>API endpoints:</p>
    <ul>
        <li><code>GET /?cell=&lt;id&gt;&amp;headless=1</code> - Headless invocation</li>
        <li><code>GET /api/cells</code> - Registered cells</li>
        <li><code>POST /ai-api</code> - Batch execution</li>
    </ul>
    <p><em>Note: The full UI is available with the <code>embedded-frontend</code> feature.</em></p>
</body>
</html>"#,
    )
    .into_response()
}

/// Serve static assets from the embedded frontend.
#[cfg(feature = "embedded-frontend")]
async fn static_handler(AxumPath(path): AxumPath<String>) -> impl IntoResponse {
    embedded_frontend::serve_static(&path)
}

/// Health check handler.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness with the registered cell ids.
async fn ping_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "cells": state.dispatcher.registry().ids(),
    }))
}

/// Registered cell configs.
async fn cells_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.dispatcher.registry().configs().into_iter().cloned().collect::<Vec<_>>())
}

/// Companion probe status.
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let status = state
        .probe
        .as_ref()
        .map(|rx| *rx.borrow())
        .unwrap_or_default();
    Json(serde_json::json!({
        "companion_url": state.companion_url,
        "status": status,
    }))
}

/// Dispatch counters per cell.
async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.stats.snapshot())
}

/// Batch execution.
async fn batch_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> impl IntoResponse {
    let response = run_batch(&state.dispatcher, request).await;
    let status = match response {
        BatchResponse::Success { .. } => StatusCode::OK,
        BatchResponse::Failure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(response))
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

/// Handle WebSocket connection.
async fn handle_websocket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut session = ClientSession::new(state.dispatcher.clone(), tx.clone());
    tracing::debug!("Session {} connected", session.id());

    // Forward session messages to the client
    let forward_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!("Failed to serialize server message: {}", e),
            }
        }
    });

    // Messages are handled in order; a submission blocks until its result.
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => session.handle(msg).await,
                Err(e) => {
                    tracing::warn!("Failed to parse client message: {} (input: {})", e, text);
                    let _ = tx.send(ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    });
                }
            },
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::warn!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    tracing::debug!("Session {} disconnected", session.id());
    forward_task.abort();
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::Request;
    use cellhub_core::{CellCatalog, Registry};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn router() -> Router {
        let catalog = CellCatalog::builtin();
        let registry = Registry::from_modules([
            catalog.default_module("fast_math").unwrap(),
            catalog.default_module("error_handler").unwrap(),
        ]);
        create_router(Arc::new(AppState::new(Dispatcher::new(Arc::new(registry)))))
    }

    async fn get(uri: &str) -> (StatusCode, String, String) {
        let response = router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _, body) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_ping_lists_cells() {
        let (_, _, body) = get("/ping").await;
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({ "status": "alive", "cells": ["error_handler", "fast_math"] }));
    }

    #[tokio::test]
    async fn test_headless_json() {
        let (status, content_type, body) = get("/?cell=fast_math&headless=1&format=json&angle=45").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({ "sin": 0.707, "cos": 0.707 }));
    }

    #[tokio::test]
    async fn test_headless_errors_map_to_status() {
        let (status, _, body) = get("/?cell=fast_math&headless=1&angle=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "ValidationError: invalid number");

        let (status, _, _) = get("/?cell=nope&headless=1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_root_without_marker_is_interactive() {
        let (status, content_type, body) = get("/?cell=fast_math").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("text/html"));
        assert!(body.contains("CellHub"));
    }

    #[tokio::test]
    async fn test_batch_endpoint() {
        let request = Request::builder()
            .method("POST")
            .uri("/ai-api")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "cells": ["fast_math"], "data": { "fast_math": { "angle": "abc" } } }).to_string(),
            ))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_stats_count_headless_and_batch() {
        let app = router();
        for uri in ["/?cell=fast_math&headless=1&angle=45", "/?cell=fast_math&headless=1&angle=abc"] {
            app.clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
        }
        let batch = Request::builder()
            .method("POST")
            .uri("/ai-api")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "cells": ["error_handler"], "data": {} }).to_string()))
            .unwrap();
        app.clone().oneshot(batch).await.unwrap();

        let response = app
            .oneshot(Request::builder().uri("/api/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["fast_math"]["headless"], json!(1));
        assert_eq!(body["fast_math"]["completed"], json!(1));
        assert_eq!(body["fast_math"]["failed"], json!(1));
        assert_eq!(body["error_handler"]["completed"], json!(1));
    }

    #[tokio::test]
    async fn test_status_without_companion() {
        let (_, _, body) = get("/api/status").await;
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({ "companion_url": null, "status": "unknown" }));
    }
}
