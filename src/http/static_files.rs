use std::path::{Component, Path, PathBuf};

use axum::{
    extract::{Extension, Request},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};

use super::{ApiError, AppState};

/// Serves files from the configured public directory for every request the
/// API routes do not handle.
pub(super) async fn serve(Extension(state): Extension<AppState>, req: Request) -> Response {
    if !matches!(*req.method(), Method::GET | Method::HEAD) {
        return ApiError::not_found("not found").into_response();
    }

    let Some(rel) = relative_path(req.uri().path()) else {
        return ApiError::not_found("not found").into_response();
    };
    let path = state.config.public_dir.join(rel);

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type(&path)),
            );
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            (StatusCode::OK, headers, bytes).into_response()
        }
        Err(_) => ApiError::not_found("not found").into_response(),
    }
}

/// Maps a request path onto a path below the public directory. `/` and
/// directory paths resolve to `index.html`; anything that could escape the
/// directory is refused.
fn relative_path(uri_path: &str) -> Option<PathBuf> {
    let trimmed = uri_path.trim_start_matches('/');
    let mut rel = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => rel.push(part),
            _ => return None,
        }
    }
    if trimmed.is_empty() || trimmed.ends_with('/') {
        rel.push("index.html");
    }
    Some(rel)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        Some("json") => "application/json; charset=utf-8",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
