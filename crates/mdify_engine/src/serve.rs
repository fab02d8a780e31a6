//! Read-only HTTP access to a directory of produced Markdown files.
//!
//! `GET /a/b` answers with `{base}/a/b.md`, `GET /` with `{base}/index.md`.
//! Paths that would leave the base directory get 400, missing files 404 and
//! other methods 405.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use mdify_core::{relative_markdown_path, PathError};
use mdify_logging::{mdify_error, mdify_info, mdify_warn};

const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";
const CACHE_CONTROL_VALUE: &str = "public, max-age=3600";

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
struct ServeState {
    base_dir: Arc<PathBuf>,
}

/// Map a request path to a file inside `base_dir`.
pub fn resolve_request_path(base_dir: &Path, request_path: &str) -> Result<PathBuf, PathError> {
    Ok(base_dir.join(relative_markdown_path(request_path)?))
}

pub fn router(base_dir: PathBuf) -> Router {
    Router::new().fallback(serve_markdown).with_state(ServeState {
        base_dir: Arc::new(base_dir),
    })
}

/// Serve `dir` on `addr` until `shutdown` resolves.
pub async fn serve<S>(dir: &Path, addr: SocketAddr, shutdown: S) -> Result<(), ServeError>
where
    S: Future<Output = ()> + Send + 'static,
{
    let base_dir = match tokio::fs::canonicalize(dir).await {
        Ok(path) if path.is_dir() => path,
        _ => return Err(ServeError::MissingDirectory(dir.to_path_buf())),
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    mdify_info!(
        "Serving files from {} at http://{}",
        base_dir.display(),
        listener.local_addr()?
    );

    axum::serve(listener, router(base_dir))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn serve_markdown(State(state): State<ServeState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
    }

    let file_path = match resolve_request_path(&state.base_dir, uri.path()) {
        Ok(path) => path,
        Err(err) => {
            mdify_warn!("Rejected request path {}: {}", uri.path(), err);
            return (StatusCode::BAD_REQUEST, "Invalid path").into_response();
        }
    };

    match tokio::fs::read(&file_path).await {
        Ok(content) => {
            mdify_info!("Serving: {}", file_path.display());
            (
                [
                    (header::CONTENT_TYPE, MARKDOWN_CONTENT_TYPE),
                    (header::CACHE_CONTROL, CACHE_CONTROL_VALUE),
                ],
                content,
            )
                .into_response()
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            mdify_info!("File not found: {}", file_path.display());
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
        Err(err) => {
            mdify_error!("Error reading file {}: {}", file_path.display(), err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
