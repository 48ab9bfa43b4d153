//! Discovery against an HTTP directory listing.

use axum::Router;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use cellhub_core::{CellCatalog, DiscoveryConfig, ModuleLocation, Registry, RegistrySource};

const LISTING: &str = r#"<html><body>
<h1>Index of /cells/</h1>
<a href="../">../</a>
<a href="fast_math.json">fast_math.json</a>
<a href='/cells/motor_model.json?v=2'>motor_model.json</a>
<a href="_template.json">_template.json</a>
<a href="broken.json">broken.json</a>
<a href="readme.txt">readme.txt</a>
<a href="fast_math.json#top">fast_math.json</a>
</body></html>"#;

const FAST_MATH: &str = r#"{ "config": { "id": "fast_math", "name": "Served Trig",
    "inputs": [{ "id": "angle", "label": "Angle", "type": "number", "value": 45 }] } }"#;

const MOTOR_MODEL: &str = r#"{ "id": "motor_model", "name": "Served Motor", "inputs": [
    { "id": "motor_type", "label": "Motor", "type": "select", "options": ["maxon_ec45"] },
    { "id": "voltage", "label": "Voltage", "type": "number", "value": 12 },
    { "id": "rpm", "label": "RPM", "type": "number", "value": 0 } ] }"#;

async fn spawn_listing_server() -> String {
    let app = Router::new()
        .route("/cells/", get(|| async { Html(LISTING) }))
        .route("/cells/fast_math.json", get(|| async { FAST_MATH }))
        .route("/cells/motor_model.json", get(|| async { MOTOR_MODEL }))
        .route(
            "/cells/broken.json",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "nope") }),
        )
        .route("/empty/", get(|| async { Html("<html><body>nothing here</body></html>") }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_http_listing_populates_registry() {
    let base = spawn_listing_server().await;
    let config = DiscoveryConfig {
        candidates: vec![
            ModuleLocation::Http(format!("{}/missing", base)),
            ModuleLocation::Http(format!("{}/empty", base)),
            ModuleLocation::Http(format!("{}/cells", base)),
        ],
        ..DiscoveryConfig::default()
    };

    let registry = Registry::discover(&config, &CellCatalog::builtin()).await;

    assert_eq!(registry.ids(), vec!["fast_math", "motor_model"]);
    assert_eq!(registry.get("fast_math").unwrap().config().name, "Served Trig");
    assert_eq!(
        registry.source(),
        &RegistrySource::Candidate(ModuleLocation::Http(format!("{}/cells", base)))
    );
}

#[tokio::test]
async fn test_unreachable_http_falls_back() {
    let config = DiscoveryConfig {
        candidates: vec![ModuleLocation::Http("http://127.0.0.1:9/cells".to_string())],
        ..DiscoveryConfig::default()
    };

    let registry = Registry::discover(&config, &CellCatalog::builtin()).await;

    assert_eq!(registry.source(), &RegistrySource::Fallback);
    assert_eq!(registry.ids(), vec!["error_handler", "fast_math", "pid_controller"]);
}
