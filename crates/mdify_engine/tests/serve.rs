use std::fs;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use mdify_engine::{resolve_request_path, router};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tower::ServiceExt;

fn site() -> (TempDir, Router) {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("index.md"), "# Home\n").unwrap();
    fs::create_dir_all(temp.path().join("docs")).unwrap();
    fs::write(temp.path().join("docs/intro.md"), "# Intro\n").unwrap();
    let app = router(temp.path().to_path_buf());
    (temp, app)
}

async fn request(app: Router, method: Method, uri: &str) -> (StatusCode, HeaderMap, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn root_serves_index() {
    let (_temp, app) = site();
    let (status, headers, body) = request(app, Method::GET, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "# Home\n");
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "text/markdown; charset=utf-8"
    );
    assert_eq!(
        headers.get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=3600"
    );
}

#[tokio::test]
async fn path_without_extension_serves_markdown_file() {
    let (_temp, app) = site();
    let (status, _, body) = request(app.clone(), Method::GET, "/docs/intro").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "# Intro\n");

    let (status, _, body) = request(app, Method::GET, "/docs/intro.md").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "# Intro\n");
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let (_temp, app) = site();
    let (status, _, _) = request(app, Method::GET, "/docs/absent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn traversal_is_rejected() {
    let (_temp, app) = site();
    let (status, _, _) = request(app, Method::GET, "/..%2F..%2Fetc%2Fpasswd").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_get_is_allowed() {
    let (_temp, app) = site();
    let (status, _, _) = request(app, Method::POST, "/docs/intro").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn request_paths_resolve_inside_base() {
    let temp = TempDir::new().unwrap();
    assert_eq!(
        resolve_request_path(temp.path(), "/a/b").unwrap(),
        temp.path().join("a").join("b.md")
    );
    assert_eq!(
        resolve_request_path(temp.path(), "/a/").unwrap(),
        temp.path().join("a").join("index.md")
    );
    assert!(resolve_request_path(temp.path(), "/a/%2E%2E/%2E%2E/x").is_err());
}
