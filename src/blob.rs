//! Blob storage for uploaded images.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024; // 5MB

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid blob path: {0}")]
    InvalidPath(String),

    #[error("blob write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Empty file")]
    Empty,

    #[error("File too large. Maximum size is 5MB.")]
    TooLarge,

    #[error("File content does not match an allowed image type.")]
    NotAnImage,

    #[error("Failed to store file: {0}")]
    Storage(#[from] BlobError),
}

/// A file part pulled out of a multipart submission.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `path` and return the public URL.
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str)
        -> Result<String, BlobError>;
}

/// Writes files under a local directory served at `public_prefix`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

fn is_safe_relative(path: &str) -> bool {
    !path.is_empty()
        && !path.contains('\0')
        && !path.contains('\\')
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<String, BlobError> {
        if !is_safe_relative(path) {
            return Err(BlobError::InvalidPath(path.to_string()));
        }

        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        tracing::info!(path = %path, size = bytes.len(), "blob stored");
        Ok(format!("{}/{}", self.public_prefix, path))
    }
}

/// Sniff the image type from magic bytes.
pub fn detect_image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

pub fn validate_image(file: &UploadedFile) -> Result<&'static str, UploadError> {
    if file.bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if file.bytes.len() > MAX_IMAGE_SIZE {
        return Err(UploadError::TooLarge);
    }
    detect_image_type(&file.bytes).ok_or(UploadError::NotAnImage)
}

/// `{folder}/{stem}_{millis}.{ext}`, stem reduced to a safe charset.
fn blob_path(folder: &str, file: &UploadedFile, mime: &str) -> String {
    let stem: String = file
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(64)
        .collect();
    let stem = if stem.is_empty() { "image".to_string() } else { stem };

    format!(
        "{}/{}_{}.{}",
        folder,
        stem,
        chrono::Utc::now().timestamp_millis(),
        extension_for(mime)
    )
}

/// Validate and store an image. Without a blob store the image is inlined as a data URL.
pub async fn store_image(
    blobs: Option<&dyn BlobStore>,
    folder: &str,
    file: &UploadedFile,
) -> Result<String, UploadError> {
    let mime = validate_image(file)?;

    match blobs {
        Some(store) => {
            let path = blob_path(folder, file, mime);
            Ok(store.upload(&path, &file.bytes, mime).await?)
        }
        None => Ok(format!("data:{};base64,{}", mime, STANDARD.encode(&file.bytes))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn png(name: &str) -> UploadedFile {
        UploadedFile {
            field_name: "image".to_string(),
            file_name: Some(name.to_string()),
            content_type: Some("image/png".to_string()),
            bytes: PNG_BYTES.to_vec(),
        }
    }

    #[test]
    fn test_detect_image_type() {
        assert_eq!(detect_image_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(detect_image_type(PNG_BYTES), Some("image/png"));
        assert_eq!(detect_image_type(b"GIF89a"), Some("image/gif"));
        assert_eq!(detect_image_type(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(detect_image_type(b"<html>"), None);
        assert_eq!(detect_image_type(&[0xFF]), None);
    }

    #[test]
    fn test_validate_rejects_empty_and_non_images() {
        let mut file = png("a.png");
        file.bytes.clear();
        assert!(matches!(validate_image(&file), Err(UploadError::Empty)));

        file.bytes = b"not an image".to_vec();
        assert!(matches!(validate_image(&file), Err(UploadError::NotAnImage)));
    }

    #[test]
    fn test_blob_path_sanitizes_stem() {
        let path = blob_path("blogImages", &png("../My Chart!.png"), "image/png");
        assert!(path.starts_with("blogImages/MyChart_"));
        assert!(path.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_store_image_without_blob_store_inlines_data_url() {
        let url = store_image(None, "blogImages", &png("a.png")).await.unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_local_blob_store_writes_file() {
        let root = std::env::temp_dir().join(format!("mwg-blob-{}", uuid::Uuid::new_v4()));
        let store = LocalBlobStore::new(&root, "/uploads/");

        let url = store_image(Some(&store), "footerLogo", &png("logo.png"))
            .await
            .unwrap();
        assert!(url.starts_with("/uploads/footerLogo/logo_"));

        let relative = url.trim_start_matches("/uploads/");
        let written = tokio::fs::read(root.join(relative)).await.unwrap();
        assert_eq!(written, PNG_BYTES);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_local_blob_store_rejects_traversal() {
        let store = LocalBlobStore::new(std::env::temp_dir(), "/uploads");
        let err = store.upload("../escape.png", PNG_BYTES, "image/png").await;
        assert!(matches!(err, Err(BlobError::InvalidPath(_))));
    }
}
