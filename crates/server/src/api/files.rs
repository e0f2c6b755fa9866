//! Artifact delivery from the output root.

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use crate::state::AppState;

const CORS_HEADERS: [(header::HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Range"),
];

/// Why a download request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRejection {
    MissingName,
    InvalidPath,
    AccessDenied,
    NotFound,
}

impl FileRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            FileRejection::MissingName | FileRejection::InvalidPath => StatusCode::BAD_REQUEST,
            FileRejection::AccessDenied => StatusCode::FORBIDDEN,
            FileRejection::NotFound => StatusCode::NOT_FOUND,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            FileRejection::MissingName => "Missing file name in path",
            FileRejection::InvalidPath => "Invalid file path",
            FileRejection::AccessDenied => "Access denied",
            FileRejection::NotFound => "File not found",
        }
    }
}

impl IntoResponse for FileRejection {
    fn into_response(self) -> Response {
        let mut response = (self.status(), self.message()).into_response();
        apply_cors(response.headers_mut());
        response
    }
}

fn apply_cors(headers: &mut HeaderMap) {
    for (name, value) in CORS_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

/// Content type announced for a served file, by extension.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = FsPath::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "flv" => "video/x-flv",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

/// Maps a requested name to an existing regular file inside `root`.
pub async fn locate(root: &FsPath, name: &str) -> Result<PathBuf, FileRejection> {
    if name.is_empty() {
        return Err(FileRejection::MissingName);
    }
    if name.contains("..") {
        return Err(FileRejection::InvalidPath);
    }

    let relative = FsPath::new(name);
    let lexically_inside = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !lexically_inside {
        return Err(FileRejection::AccessDenied);
    }

    let candidate = root.join(relative);
    let resolved = tokio::fs::canonicalize(&candidate)
        .await
        .map_err(|_| FileRejection::NotFound)?;
    let resolved_root = tokio::fs::canonicalize(root)
        .await
        .map_err(|_| FileRejection::NotFound)?;

    // Symlinks may still point outside
    if resolved == resolved_root || !resolved.starts_with(&resolved_root) {
        return Err(FileRejection::AccessDenied);
    }

    match tokio::fs::metadata(&resolved).await {
        Ok(metadata) if metadata.is_file() => Ok(resolved),
        _ => Err(FileRejection::NotFound),
    }
}

/// GET /download/{*file}
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
    request: Request,
) -> Response {
    let path = match locate(state.output_dir(), &file).await {
        Ok(path) => path,
        Err(rejection) => {
            debug!("Refused download of {:?}: {}", file, rejection.message());
            return rejection.into_response();
        }
    };

    let mut response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    if response.status().is_success() {
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type_for(&file)),
        );
    }
    apply_cors(response.headers_mut());
    response
}

/// GET /download/ with no file name.
pub async fn missing_name() -> FileRejection {
    FileRejection::MissingName
}

/// OPTIONS /download/{*file}
pub async fn preflight() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    apply_cors(response.headers_mut());
    response
}
