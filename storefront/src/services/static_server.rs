//! Static file serving service
//!
//! Serves front-end assets and uploaded images with caching headers and
//! content types. One instance per root directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{StorefrontError, StorefrontResult};
use crate::traits::{StaticFileResponse, StaticFileServer};

const COMPONENT: &str = "static";

/// Real static file server implementation
#[derive(Clone)]
pub struct RealStaticFileServer {
    /// Base directory for static files
    base_dir: PathBuf,

    /// MIME type mappings
    mime_types: HashMap<&'static str, &'static str>,
}

impl RealStaticFileServer {
    /// Create new static file server
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        let mime_types = HashMap::from([
            ("html", "text/html; charset=utf-8"),
            ("css", "text/css"),
            ("js", "application/javascript"),
            ("json", "application/json"),
            ("png", "image/png"),
            ("jpg", "image/jpeg"),
            ("jpeg", "image/jpeg"),
            ("gif", "image/gif"),
            ("webp", "image/webp"),
            ("svg", "image/svg+xml"),
            ("ico", "image/x-icon"),
            ("woff", "font/woff"),
            ("woff2", "font/woff2"),
        ]);

        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            mime_types,
        }
    }

    fn extension(path: &Path) -> Option<String> {
        path.extension().and_then(|e| e.to_str()).map(str::to_lowercase)
    }

    /// Get MIME type from file extension
    fn mime_type(&self, path: &Path) -> String {
        Self::extension(path)
            .and_then(|ext| self.mime_types.get(ext.as_str()).copied())
            .unwrap_or("application/octet-stream")
            .to_string()
    }

    /// Get cache control header based on file type
    fn cache_control(path: &Path) -> Option<String> {
        let policy = match Self::extension(path)?.as_str() {
            "html" => "no-cache",
            "js" | "css" => "public, max-age=3600",
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico" => "public, max-age=86400",
            "woff" | "woff2" => "public, max-age=604800",
            _ => return None,
        };
        Some(policy.to_string())
    }

    /// Resolve file path and prevent directory traversal
    fn resolve_path(&self, request_path: &str) -> StorefrontResult<PathBuf> {
        let clean_path = request_path.trim_start_matches('/');
        let file_path = if clean_path.is_empty() { "index.html" } else { clean_path };

        let not_found = || StorefrontError::not_found("file", request_path);

        // Canonicalize to prevent directory traversal
        let canonical_path = self.base_dir.join(file_path).canonicalize().map_err(|_| not_found())?;
        let canonical_base = self.base_dir.canonicalize().map_err(|e| {
            shared::component_error!(COMPONENT, "Failed to canonicalize base directory: {}", e);
            not_found()
        })?;

        if !canonical_path.starts_with(&canonical_base) {
            shared::component_warn!(COMPONENT, "🚫 Rejected path outside {}: {}", self.base_dir.display(), request_path);
            return Err(not_found());
        }

        if canonical_path.is_dir() {
            let index = canonical_path.join("index.html");
            return if index.is_file() { Ok(index) } else { Err(not_found()) };
        }

        Ok(canonical_path)
    }
}

#[async_trait]
impl StaticFileServer for RealStaticFileServer {
    async fn serve_file(&self, path: &str) -> StorefrontResult<StaticFileResponse> {
        let file_path = self.resolve_path(path)?;

        match fs::read(&file_path).await {
            Ok(content) => {
                shared::component_debug!(COMPONENT, "📄 Served static file: {} ({} bytes)", path, content.len());

                let mut response = StaticFileResponse::new(content, self.mime_type(&file_path));
                if let Some(cache) = Self::cache_control(&file_path) {
                    response = response.with_cache_control(cache);
                }
                Ok(response)
            }
            Err(e) => {
                shared::component_warn!(COMPONENT, "❌ Failed to read static file {}: {}", path, e);
                Err(StorefrontError::not_found("file", path))
            }
        }
    }

    async fn file_exists(&self, path: &str) -> bool {
        self.resolve_path(path).is_ok_and(|p| p.is_file())
    }
}
