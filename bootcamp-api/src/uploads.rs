//! Photo storage

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};

/// Flat, name-addressed file storage
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write `bytes` under `name`, replacing any previous file
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Files in one local directory
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<()> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(Error::BadRequest(format!("Invalid file name '{name}'")));
        }

        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes).await?;

        debug!(path = %path.display(), bytes = bytes.len(), "File stored");
        Ok(())
    }
}

/// Check an uploaded photo's declared type and size
pub fn validate_photo(content_type: Option<&str>, size: usize, max_size: usize) -> Result<()> {
    if !content_type.is_some_and(|mime| mime.starts_with("image/")) {
        return Err(Error::BadRequest("Please upload an image file".into()));
    }
    if size > max_size {
        return Err(photo_too_large(max_size));
    }
    Ok(())
}

/// Rejection for a photo over `max_size` bytes
pub fn photo_too_large(max_size: usize) -> Error {
    Error::BadRequest(format!("Please upload an image less than {max_size} bytes"))
}

/// `photo_{id}{ext}`, taking the extension from the client file name or the MIME subtype
pub fn photo_file_name(bootcamp_id: &str, file_name: Option<&str>, content_type: &str) -> String {
    let extension = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .or_else(|| {
            content_type
                .strip_prefix("image/")
                .map(|subtype| subtype.split(['+', ';']).next().unwrap_or(subtype))
                .filter(|subtype| !subtype.is_empty())
                .map(|subtype| match subtype {
                    "jpeg" => "jpg".to_string(),
                    other => other.to_ascii_lowercase(),
                })
        });

    match extension {
        Some(ext) => format!("photo_{bootcamp_id}.{ext}"),
        None => format!("photo_{bootcamp_id}"),
    }
}
