//! Static routes for the built editor pages, mounted next to the host's own API.

use crate::error::BridgeResult;
use axum::Router;
use axum::extract::{Path as UrlPath, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const INDEX_PAGES: &[&str] = &["index-comfyui.html", "index.html"];
const DIRECTORY_PAGES: &[&str] = &[
    "index-comfyui.html",
    "index.html",
    "create-comfyui.html",
    "create.html",
    "retarget-comfyui.html",
    "retarget.html",
];
const RETARGET_PAGES: &[&str] = &["retarget-comfyui.html", "retarget.html"];

pub const NOT_BUILT: &str = concat!(
    "Mesh2Motion UI not found. Please build mesh2motion-app first: ",
    "cd mesh2motion-app && npm install && npm run build:comfyui"
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiLookup {
    File(PathBuf),
    Invalid,
    Missing,
}

struct UiState {
    root: PathBuf,
}

pub fn ui_router(root: PathBuf) -> Router {
    Router::new()
        .route("/mesh2motion", get(index))
        .route("/mesh2motion/", get(root_dir))
        .route("/mesh2motion/{*path}", get(static_file))
        .with_state(Arc::new(UiState { root }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(bind: &str, root: PathBuf) -> BridgeResult<()> {
    let listener = TcpListener::bind(bind).await?;
    let addr = listener.local_addr()?;
    info!(target: "mesh2motion", %addr, root = %root.display(), "serving editor ui");
    axum::serve(listener, ui_router(root)).await?;
    Ok(())
}

async fn index(State(ui): State<Arc<UiState>>) -> Response {
    match first_existing(&ui.root, INDEX_PAGES).await {
        Some(page) => file_response(&page).await,
        None => (StatusCode::NOT_FOUND, NOT_BUILT).into_response(),
    }
}

async fn root_dir(State(ui): State<Arc<UiState>>) -> Response {
    lookup_response(resolve(&ui.root, "").await).await
}

async fn static_file(State(ui): State<Arc<UiState>>, UrlPath(path): UrlPath<String>) -> Response {
    lookup_response(resolve(&ui.root, &path).await).await
}

/// Maps a request path under the UI root to the file that answers it.
pub async fn resolve(root: &Path, path: &str) -> UiLookup {
    if path.contains("..") || path.starts_with('/') {
        return UiLookup::Invalid;
    }

    let candidate = root.join(path);
    if is_dir(&candidate).await {
        if let Some(page) = first_existing(&candidate, DIRECTORY_PAGES).await {
            return UiLookup::File(page);
        }
    }

    if path == "retarget" || path == "retarget/" {
        if let Some(page) = first_existing(root, RETARGET_PAGES).await {
            return UiLookup::File(page);
        }
    }

    if is_file(&candidate).await {
        return UiLookup::File(candidate);
    }
    UiLookup::Missing
}

async fn lookup_response(lookup: UiLookup) -> Response {
    match lookup {
        UiLookup::File(path) => file_response(&path).await,
        UiLookup::Invalid => (StatusCode::BAD_REQUEST, "Invalid path").into_response(),
        UiLookup::Missing => (StatusCode::NOT_FOUND, "File not found").into_response(),
    }
}

async fn file_response(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(path))], bytes).into_response(),
        Err(e) => {
            warn!(target: "mesh2motion", path = %path.display(), error = %e, "ui file unreadable");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    for name in names {
        let page = dir.join(name);
        if is_file(&page).await {
            return Some(page);
        }
    }
    None
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",
        Some("glb") => "model/gltf-binary",
        Some("gltf") => "model/gltf+json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempdir().unwrap();
        assert_eq!(resolve(dir.path(), "../secret").await, UiLookup::Invalid);
        assert_eq!(resolve(dir.path(), "/etc/passwd").await, UiLookup::Invalid);
    }

    #[tokio::test]
    async fn directories_serve_their_first_index() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("create")).unwrap();
        fs::write(dir.path().join("create/create.html"), "c").unwrap();
        fs::write(dir.path().join("create/retarget.html"), "r").unwrap();
        assert_eq!(
            resolve(dir.path(), "create").await,
            UiLookup::File(dir.path().join("create/create.html"))
        );
    }

    #[tokio::test]
    async fn retarget_alias_maps_to_root_page() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("retarget.html"), "r").unwrap();
        assert_eq!(
            resolve(dir.path(), "retarget/").await,
            UiLookup::File(dir.path().join("retarget.html"))
        );
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let dir = tempdir().unwrap();
        assert_eq!(resolve(dir.path(), "nope.js").await, UiLookup::Missing);
    }

    #[test]
    fn model_types_are_registered() {
        assert_eq!(content_type(Path::new("a/b.GLB")), "model/gltf-binary");
        assert_eq!(content_type(Path::new("scene.gltf")), "model/gltf+json");
        assert_eq!(content_type(Path::new("app.js")), "application/javascript");
        assert_eq!(content_type(Path::new("LICENSE")), "application/octet-stream");
    }
}
