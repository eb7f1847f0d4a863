//! Tests for the StaticFileServer service

use crate::services::RealStaticFileServer;
use crate::traits::StaticFileServer;
use std::fs;

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("static");
    fs::create_dir_all(root.join("css")).unwrap();
    fs::write(root.join("index.html"), "<h1>shop</h1>").unwrap();
    fs::write(root.join("css").join("site.css"), "body{}").unwrap();
    fs::write(dir.path().join("secret.txt"), "nope").unwrap();
    dir
}

#[tokio::test]
async fn test_root_serves_index() {
    let dir = site();
    let server = RealStaticFileServer::new(dir.path().join("static"));

    let response = server.serve_file("/").await.unwrap();
    assert_eq!(response.content, b"<h1>shop</h1>");
    assert_eq!(response.content_type, "text/html; charset=utf-8");
    assert_eq!(response.cache_control.as_deref(), Some("no-cache"));
}

#[tokio::test]
async fn test_content_type_and_cache() {
    let dir = site();
    let server = RealStaticFileServer::new(dir.path().join("static"));

    let response = server.serve_file("css/site.css").await.unwrap();
    assert_eq!(response.content_type, "text/css");
    assert_eq!(response.cache_control.as_deref(), Some("public, max-age=3600"));
}

#[tokio::test]
async fn test_traversal_is_rejected() {
    let dir = site();
    let server = RealStaticFileServer::new(dir.path().join("static"));

    assert!(server.serve_file("../secret.txt").await.is_err());
    assert!(server.serve_file("css/../../secret.txt").await.is_err());
    assert!(!server.file_exists("../secret.txt").await);
}

#[tokio::test]
async fn test_missing_file() {
    let dir = site();
    let server = RealStaticFileServer::new(dir.path().join("static"));

    let err = server.serve_file("nope.js").await.unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    assert!(server.file_exists("css/site.css").await);
}
