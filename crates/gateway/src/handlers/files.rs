//! Image file serving
//!
//! Each configured image folder is mounted at `/<folder>/{file}`. Lookups
//! are case-insensitive and only use the final path component.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::Path as FsPath;

use crate::AppState;
use portal_common::errors::{AppError, Result};

/// Add one route per servable folder.
pub fn mount(mut router: Router<AppState>, folders: &[String]) -> Router<AppState> {
    for folder in folders {
        let folder = folder.trim().trim_matches('/').to_string();
        if folder.is_empty() || folder.contains('/') || folder.contains('{') {
            tracing::warn!(folder = %folder, "Skipping unusable image folder");
            continue;
        }

        let route = format!("/{}/{{file}}", folder);
        router = router.route(
            &route,
            get(move |State(state): State<AppState>, Path(file): Path<String>| {
                let folder = folder.clone();
                async move { serve(state, folder, file).await }
            }),
        );
    }
    router
}

async fn serve(state: AppState, folder: String, file: String) -> Result<Response> {
    let path = state
        .store
        .find_image(&folder, &file)
        .await
        .ok_or_else(|| AppError::FileNotFound { name: file.clone() })?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Image read failed");
        AppError::FileNotFound { name: file.clone() }
    })?;

    Ok(([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response())
}

/// MIME type from the file extension
pub fn content_type(path: &FsPath) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}
