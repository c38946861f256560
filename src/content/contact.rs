//! Contact details shown on the contact page and footer (`contactInfo`).

use serde::{Deserialize, Serialize};

use super::{fetch_with_fallback, require, ContentError, SaveOutcome, Sourced};
use crate::error::ApiError;
use crate::store::{to_fields, DocumentStore, StoreError, CONTACT_INFO};
use crate::validators::{is_valid_email, is_valid_url};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SocialLink {
    pub name: String,
    pub value: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
    pub email: String,
    pub social_links: Vec<SocialLink>,
}

impl ContactInfo {
    pub fn validate(&self) -> Result<(), ContentError> {
        require(&[("email", self.email.as_str())])?;
        if !is_valid_email(&self.email) {
            return Err(ContentError::invalid("email", "not a valid e-mail address"));
        }

        for link in &self.social_links {
            require(&[("name", link.name.as_str()), ("value", link.value.as_str())])?;
            // "#" is a placeholder for a profile that does not exist yet.
            if link.url != "#" && !is_valid_url(&link.url) {
                return Err(ContentError::invalid(
                    "socialLinks",
                    format!("{} has an invalid url", link.name),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub info: ContactInfo,
}

impl Default for StoredContactInfo {
    fn default() -> Self {
        StoredContactInfo {
            id: None,
            info: default_contact_info(),
        }
    }
}

pub fn default_contact_info() -> ContactInfo {
    let link = |name: &str, value: &str, url: &str| SocialLink {
        name: name.to_string(),
        value: value.to_string(),
        url: url.to_string(),
    };

    ContactInfo {
        email: "contact@motionwealthgroup.com".to_string(),
        social_links: vec![
            link("LinkedIn", "Connect on LinkedIn", "#"),
            link("Twitter", "@motionwealthgrp", "https://twitter.com/motionwealthgrp"),
            link(
                "Instagram",
                "@motionwealthgroup",
                "https://instagram.com/motionwealthgroup",
            ),
        ],
    }
}

/// The first stored record; the collection holds a single document.
pub async fn find_contact_info(store: &dyn DocumentStore) -> Result<Option<StoredContactInfo>, StoreError> {
    let docs = store.list(CONTACT_INFO).await?;
    match docs.first() {
        Some(doc) => Ok(Some(StoredContactInfo {
            id: Some(doc.id.clone()),
            info: doc.decode()?,
        })),
        None => Ok(None),
    }
}

pub async fn load_contact_info(store: &dyn DocumentStore) -> Sourced<StoredContactInfo> {
    fetch_with_fallback("contact info", find_contact_info(store), StoredContactInfo::default).await
}

/// Admin view: the stored record, creating the default one when absent.
pub async fn get_or_create_contact_info(store: &dyn DocumentStore) -> Result<StoredContactInfo, StoreError> {
    if let Some(existing) = find_contact_info(store).await? {
        return Ok(existing);
    }

    let info = default_contact_info();
    let doc = store.create(CONTACT_INFO, to_fields(&info)?).await?;
    tracing::info!(id = %doc.id, "created default contact info");
    Ok(StoredContactInfo {
        id: Some(doc.id),
        info,
    })
}

/// Replace the contact details, updating the existing record when there is one.
pub async fn save_contact_info(
    store: &dyn DocumentStore,
    info: ContactInfo,
) -> Result<SaveOutcome<StoredContactInfo>, ApiError> {
    info.validate()?;

    let info = ContactInfo {
        email: info.email.trim().to_string(),
        social_links: info.social_links,
    };
    let fields = to_fields(&info)?;

    let doc = match find_contact_info(store).await {
        Ok(Some(StoredContactInfo { id: Some(id), .. })) => store.put(CONTACT_INFO, &id, fields).await?,
        Ok(_) => store.create(CONTACT_INFO, fields).await?,
        // A malformed record is overwritten in place.
        Err(StoreError::Malformed { id, .. }) => store.put(CONTACT_INFO, &id, fields).await?,
        Err(e) => return Err(e.into()),
    };

    tracing::info!(id = %doc.id, "contact info updated");
    Ok(SaveOutcome {
        record: StoredContactInfo {
            id: Some(doc.id),
            info,
        },
        message: "Contact information updated successfully!".to_string(),
        image_upload_failed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_reader_gets_default_when_empty() {
        let store = MemoryStore::new();
        let sourced = load_contact_info(&store).await;
        assert!(sourced.is_fallback());
        assert_eq!(sourced.value.info.email, "contact@motionwealthgroup.com");
        assert_eq!(sourced.value.info.social_links.len(), 3);
        assert!(store.list(CONTACT_INFO).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_read_creates_default_once() {
        let store = MemoryStore::new();
        let first = get_or_create_contact_info(&store).await.unwrap();
        let second = get_or_create_contact_info(&store).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list(CONTACT_INFO).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_replaces_single_record() {
        let store = MemoryStore::new();
        get_or_create_contact_info(&store).await.unwrap();

        let mut info = default_contact_info();
        info.email = "hello@motionwealthgroup.com".to_string();
        info.social_links.truncate(1);
        let outcome = save_contact_info(&store, info).await.unwrap();
        assert_eq!(outcome.message, "Contact information updated successfully!");

        let docs = store.list(CONTACT_INFO).await.unwrap();
        assert_eq!(docs.len(), 1);
        let loaded = load_contact_info(&store).await;
        assert_eq!(loaded.value.info.email, "hello@motionwealthgroup.com");
        assert_eq!(loaded.value.info.social_links.len(), 1);
    }

    #[test]
    fn test_validation() {
        assert!(default_contact_info().validate().is_ok());

        let mut bad_email = default_contact_info();
        bad_email.email = "nope".to_string();
        assert!(bad_email.validate().is_err());

        let mut bad_link = default_contact_info();
        bad_link.social_links[1].url = "twitter".to_string();
        assert!(bad_link.validate().is_err());
    }
}
