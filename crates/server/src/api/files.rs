//! File listing and download handlers for the managed directories.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path as UrlPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio_util::io::ReaderStream;

use super::handlers::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub downloads: Vec<String>,
    pub converted: Vec<String>,
}

/// Lists regular files directly under a managed directory, sorted by
/// name. Subdirectories (multi-file torrents) are listed by their
/// directory name so they show up in the UI as well.
async fn list_dir(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(mut entries) = tokio::fs::read_dir(dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    names
}

/// GET /files
///
/// Relative names under the download and convert directories. These
/// are the values accepted by /start_convert and /download.
pub async fn list_files(State(state): State<Arc<AppState>>) -> Json<FileListResponse> {
    Json(FileListResponse {
        downloads: list_dir(state.download_dir()).await,
        converted: list_dir(state.convert_dir()).await,
    })
}

/// GET /download/{filename}
///
/// Streams a converted file as an attachment. The route only matches a
/// single path segment, and separator characters are refused anyway so
/// the filename cannot address outside the convert directory.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    UrlPath(filename): UrlPath<String>,
) -> Response {
    if filename.contains('/') || filename.contains('\\') || filename.starts_with("..") {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid filename".to_string(),
            }),
        )
            .into_response();
    }

    let path = state.convert_dir().join(&filename);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("file not found: {}", filename),
                }),
            )
                .into_response();
        }
    };

    let stream = ReaderStream::new(file);
    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    (headers, Body::from_stream(stream)).into_response()
}
