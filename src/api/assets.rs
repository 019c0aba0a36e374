//! Embedded static assets for the chat display
//!
//! Debug builds read `ui/dist` from disk through rust-embed; release builds
//! carry the files in the binary.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use std::path::{Component, Path};

#[derive(Embed)]
#[folder = "ui/dist"]
struct Assets;

/// Serve embedded static files
pub async fn serve_static(req: Request<Body>) -> Response {
    let path = req.uri().path().trim_start_matches('/');

    if !is_contained(path) {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    match Assets::get(path) {
        Some(content) => file_response(path, content.data.to_vec()),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Only plain relative paths below the asset root
fn is_contained(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

fn file_response(path: &str, content: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime.as_ref().to_string())],
        Body::from(content),
    )
        .into_response()
}

/// Get the embedded index.html content
pub fn get_index_html() -> Option<String> {
    let content = Assets::get("index.html")?;
    String::from_utf8(content.data.to_vec()).ok()
}
