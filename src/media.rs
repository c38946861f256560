//! Image handling for content records: upload tolerance and rendering hints.

use serde::Serialize;

use crate::blob::{store_image, BlobStore, UploadedFile};

/// Transparent 1x1 PNG used as a blur placeholder.
pub const BLUR_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// What an editor submitted for a record's image.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// No new file; keep (or clear) the given reference.
    Keep(Option<String>),
    Upload(UploadedFile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: Option<String>,
    pub upload_failed: bool,
}

/// Turn an [`ImageInput`] into the reference to store.
///
/// A failed upload never aborts the surrounding write: the record is stored
/// with no image and the caller reports `upload_failed`.
pub async fn resolve_image(
    blobs: Option<&dyn BlobStore>,
    folder: &str,
    input: ImageInput,
) -> ResolvedImage {
    match input {
        ImageInput::Keep(url) => ResolvedImage {
            url: url.filter(|u| !u.trim().is_empty()),
            upload_failed: false,
        },
        ImageInput::Upload(file) => match store_image(blobs, folder, &file).await {
            Ok(url) => ResolvedImage {
                url: Some(url),
                upload_failed: false,
            },
            Err(e) => {
                tracing::warn!(
                    folder = %folder,
                    file = ?file.file_name,
                    error = %e,
                    "image upload failed, storing record without image"
                );
                ResolvedImage {
                    url: None,
                    upload_failed: true,
                }
            }
        },
    }
}

/// Encoder quality by file extension.
pub fn optimal_quality(src: &str) -> u8 {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => 80,
        "png" => 90,
        "webp" => 75,
        _ => 85,
    }
}

/// Hero images and the first three of a list load eagerly.
pub fn should_prioritize(index: usize, is_hero: bool) -> bool {
    is_hero || index < 3
}

/// Breakpoint widths for a `sizes` attribute; unset breakpoints use the default.
#[derive(Debug, Clone, Default)]
pub struct ImageSizes<'a> {
    pub default: &'a str,
    pub sm: Option<&'a str>,
    pub md: Option<&'a str>,
    pub lg: Option<&'a str>,
    pub xl: Option<&'a str>,
}

pub fn responsive_sizes(sizes: &ImageSizes<'_>) -> String {
    let or_default = |v: Option<&str>| v.unwrap_or(sizes.default).to_string();
    format!(
        "(max-width: 640px) {}, (max-width: 768px) {}, (max-width: 1024px) {}, (max-width: 1280px) {}, {}",
        or_default(sizes.sm),
        or_default(sizes.md),
        or_default(sizes.lg),
        or_default(sizes.xl),
        sizes.default
    )
}

/// Card images: full width on phones, half on tablets, a third beyond.
pub fn card_sizes() -> String {
    responsive_sizes(&ImageSizes {
        default: "33vw",
        sm: Some("100vw"),
        md: Some("50vw"),
        ..Default::default()
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageHints {
    pub priority: bool,
    pub quality: u8,
    pub sizes: String,
    pub blur_data_url: &'static str,
}

pub fn image_hints(src: &str, index: usize, is_hero: bool) -> ImageHints {
    ImageHints {
        priority: should_prioritize(index, is_hero),
        quality: optimal_quality(src),
        sizes: if is_hero { "100vw".to_string() } else { card_sizes() },
        blur_data_url: BLUR_DATA_URL,
    }
}
