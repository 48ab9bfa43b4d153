//! Embedded frontend assets for the interactive view.
//!
//! Only available when the `embedded-frontend` feature is enabled.

use axum::{
    body::Body,
    http::{Response, StatusCode, header},
};
use rust_embed::Embed;

/// Embedded frontend assets.
#[derive(Embed)]
#[folder = "src/frontend/"]
pub struct FrontendAssets;

fn not_found() -> Response<Body> {
    let mut response = Response::new(Body::from("Not Found"));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

/// Serve an embedded frontend file.
pub fn serve_static(path: &str) -> Response<Body> {
    let path = path.strip_prefix('/').unwrap_or(path);

    let Some(content) = FrontendAssets::get(path) else {
        return not_found();
    };
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(content.data.into_owned()))
        .unwrap_or_else(|_| not_found())
}

/// Serve the main index.html file.
pub fn serve_index() -> Response<Body> {
    serve_static("index.html")
}
