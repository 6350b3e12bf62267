//! HTTP handlers for static asset serving.

use axum::{
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::static_assets;

/// Serve a file embedded from `static/`.
#[instrument]
pub async fn serve_embedded_asset(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    let Some(content) = static_assets::Assets::get(path) else {
        debug!("No embedded asset at {}", path);
        return StatusCode::NOT_FOUND.into_response();
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();

    // Asset names are not content-hashed, so let caches revalidate
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, "public, max-age=3600, must-revalidate".to_string()),
        ],
        content.data.into_owned(),
    )
        .into_response()
}
