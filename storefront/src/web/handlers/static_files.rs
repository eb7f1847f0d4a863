//! Static asset and uploaded image serving

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};

use crate::storefront_impl::Storefront;
use crate::traits::StaticFileResponse;

const FALLBACK_INDEX: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Storefront</title>
</head>
<body>
    <h1>Storefront</h1>
    <p>The API is running. Frontend assets are served from this endpoint once installed.</p>
</body>
</html>"#;

impl IntoResponse for StaticFileResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, [(header::CONTENT_TYPE, self.content_type)], self.content).into_response();
        if let Some(cache_control) = self.cache_control {
            if let Ok(value) = cache_control.parse() {
                response.headers_mut().insert(header::CACHE_CONTROL, value);
            }
        }
        response
    }
}

/// Serve index.html for root path, or a placeholder page
pub async fn serve_index(State(storefront): State<Storefront>) -> Response {
    if !storefront.static_files.file_exists("index.html").await {
        return Html(FALLBACK_INDEX).into_response();
    }
    match storefront.static_files.serve_file("index.html").await {
        Ok(file) => file.into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn serve_static(State(storefront): State<Storefront>, Path(path): Path<String>) -> Response {
    match storefront.static_files.serve_file(&path).await {
        Ok(file) => file.into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn serve_upload(State(storefront): State<Storefront>, Path(path): Path<String>) -> Response {
    match storefront.upload_files.serve_file(&path).await {
        Ok(file) => file.into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}
