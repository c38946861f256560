//! Site-wide settings (`siteSettings`). Only the footer logo lives here today.

use serde::{Deserialize, Serialize};

use super::{fetch_with_fallback, require, ContentError, SaveOutcome, Sourced};
use crate::blob::{store_image, BlobStore};
use crate::error::ApiError;
use crate::media::ImageInput;
use crate::store::{to_fields, DocumentStore, StoreError, SITE_SETTINGS};
use crate::validators::{is_valid_image_ref, is_valid_url};

pub const FOOTER_LOGO_ID: &str = "footerLogo";
pub const IMAGE_FOLDER: &str = "site-settings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterLogo {
    pub image_url: Option<String>,
    pub link_url: String,
}

impl FooterLogo {
    pub fn is_empty(&self) -> bool {
        self.image_url.is_none() && self.link_url.trim().is_empty()
    }
}

pub async fn find_footer_logo(store: &dyn DocumentStore) -> Result<Option<FooterLogo>, StoreError> {
    match store.get(SITE_SETTINGS, FOOTER_LOGO_ID).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

/// The stored logo, or an empty one. A record without a link counts as unset.
pub async fn load_footer_logo(store: &dyn DocumentStore) -> Sourced<FooterLogo> {
    fetch_with_fallback(
        "footer logo",
        async {
            let logo = find_footer_logo(store).await?;
            Ok::<_, StoreError>(logo.filter(|l| !l.link_url.trim().is_empty()))
        },
        FooterLogo::default,
    )
    .await
}

/// Set the footer logo. Unlike content records, a failed upload aborts the write.
pub async fn save_footer_logo(
    store: &dyn DocumentStore,
    blobs: Option<&dyn BlobStore>,
    link_url: &str,
    image: ImageInput,
) -> Result<SaveOutcome<FooterLogo>, ApiError> {
    require(&[("linkUrl", link_url)])?;
    if !is_valid_url(link_url) {
        return Err(ContentError::invalid("linkUrl", "must be a web address").into());
    }

    let image_url = match image {
        ImageInput::Keep(url) => {
            let url = url.filter(|u| !u.trim().is_empty());
            if let Some(u) = &url {
                if !is_valid_image_ref(u) {
                    return Err(ContentError::invalid("imageUrl", "must be an image URL or path").into());
                }
            }
            url
        }
        ImageInput::Upload(file) => Some(store_image(blobs, IMAGE_FOLDER, &file).await?),
    };

    let logo = FooterLogo {
        image_url,
        link_url: link_url.trim().to_string(),
    };
    store
        .put(SITE_SETTINGS, FOOTER_LOGO_ID, to_fields(&logo)?)
        .await?;

    tracing::info!(link = %logo.link_url, has_image = logo.image_url.is_some(), "footer logo updated");
    Ok(SaveOutcome {
        record: logo,
        message: "Footer logo updated successfully".to_string(),
        image_upload_failed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::UploadedFile;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_unset_logo_is_empty_fallback() {
        let store = MemoryStore::new();
        let sourced = load_footer_logo(&store).await;
        assert!(sourced.is_fallback());
        assert!(sourced.value.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = MemoryStore::new();
        let outcome = save_footer_logo(
            &store,
            None,
            "https://linktr.ee/motionwealth",
            ImageInput::Keep(Some("/uploads/site-settings/logo.png".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(outcome.message, "Footer logo updated successfully");

        let sourced = load_footer_logo(&store).await;
        assert!(!sourced.is_fallback());
        assert_eq!(sourced.value.link_url, "https://linktr.ee/motionwealth");
        assert!(store.get(SITE_SETTINGS, FOOTER_LOGO_ID).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_bad_upload_is_surfaced() {
        let store = MemoryStore::new();
        let file = UploadedFile {
            field_name: "image".to_string(),
            file_name: Some("logo.txt".to_string()),
            content_type: Some("text/plain".to_string()),
            bytes: b"hello".to_vec(),
        };
        let result = save_footer_logo(&store, None, "https://linktr.ee/x", ImageInput::Upload(file)).await;
        assert!(matches!(result, Err(ApiError::Upload(_))));
        assert!(store.get(SITE_SETTINGS, FOOTER_LOGO_ID).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_link_is_required() {
        let store = MemoryStore::new();
        let result = save_footer_logo(&store, None, " ", ImageInput::Keep(None)).await;
        assert!(matches!(result, Err(ApiError::Content(ContentError::MissingFields(_)))));
    }
}
