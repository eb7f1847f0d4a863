//! Product image uploads written to disk

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::error::{StorefrontError, StorefrontResult};
use crate::traits::UploadStore;

const COMPONENT: &str = "uploads";

/// Public URL prefix uploaded files are served under
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Real upload store implementation
#[derive(Clone)]
pub struct RealUploadStore {
    base_dir: PathBuf,
    max_bytes: usize,
}

impl RealUploadStore {
    pub fn new<P: AsRef<Path>>(base_dir: P, max_bytes: usize) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            max_bytes,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Lower-cased extension if it is an accepted image type
    pub fn image_extension(file_name: &str) -> StorefrontResult<String> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            Ok(extension)
        } else {
            Err(StorefrontError::Upload {
                details: format!("unsupported file type {file_name:?}; allowed: {}", ALLOWED_EXTENSIONS.join(", ")),
            })
        }
    }

    /// Map a public path back to a file name inside the upload directory
    fn stored_name(public_path: &str) -> Option<&str> {
        let name = public_path.strip_prefix(UPLOAD_URL_PREFIX)?;
        let plain = !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != "..";
        plain.then_some(name)
    }
}

#[async_trait]
impl UploadStore for RealUploadStore {
    async fn save_image(&self, original_name: &str, bytes: Vec<u8>) -> StorefrontResult<String> {
        let extension = Self::image_extension(original_name)?;
        if bytes.is_empty() {
            return Err(StorefrontError::Upload {
                details: "file is empty".to_string(),
            });
        }
        if bytes.len() > self.max_bytes {
            return Err(StorefrontError::Upload {
                details: format!("file is {} bytes; limit is {}", bytes.len(), self.max_bytes),
            });
        }

        fs::create_dir_all(&self.base_dir).await?;
        let name = format!("{}.{}", Uuid::new_v4(), extension);
        fs::write(self.base_dir.join(&name), &bytes).await?;

        shared::component_info!(COMPONENT, "🖼️ Stored upload {} ({} bytes)", name, bytes.len());
        Ok(format!("{UPLOAD_URL_PREFIX}{name}"))
    }

    async fn delete(&self, public_path: &str) -> StorefrontResult<()> {
        let Some(name) = Self::stored_name(public_path) else {
            shared::component_warn!(COMPONENT, "Ignoring delete of foreign path {}", public_path);
            return Ok(());
        };

        match fs::remove_file(self.base_dir.join(name)).await {
            Ok(()) => {
                shared::component_info!(COMPONENT, "🗑️ Deleted upload {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
