//! Typed views over the document store, with the fallback policy for readers.
//!
//! Readers never see a store failure: an empty or failed read degrades to the
//! built-in default and the response says where the value came from. Writes
//! go through the validation in each submodule and surface their errors.

pub mod blog;
pub mod contact;
pub mod pages;
pub mod resources;
pub mod settings;

use std::future::Future;

use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Please fill in all required fields")]
    MissingFields(Vec<&'static str>),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Invalid content for page \"{page}\": {reason}")]
    InvalidPage { page: String, reason: String },
}

impl ContentError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ContentError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Collect the names of blank required fields.
pub(crate) fn require(fields: &[(&'static str, &str)]) -> Result<(), ContentError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| !crate::validators::is_required(value))
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ContentError::MissingFields(missing))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    Store,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: ContentSource,
}

impl<T> Sourced<T> {
    pub fn is_fallback(&self) -> bool {
        self.source == ContentSource::Fallback
    }
}

/// Result of an admin write, with the message shown to the editor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome<T> {
    pub record: T,
    pub message: String,
    pub image_upload_failed: bool,
}

/// Await `load`; fall back to `default()` when it yields nothing or fails.
pub async fn fetch_with_fallback<T, Fut, D>(what: &str, load: Fut, default: D) -> Sourced<T>
where
    Fut: Future<Output = Result<Option<T>, StoreError>>,
    D: FnOnce() -> T,
{
    match load.await {
        Ok(Some(value)) => Sourced {
            value,
            source: ContentSource::Store,
        },
        Ok(None) => {
            tracing::debug!(content = %what, "no stored content, serving default");
            Sourced {
                value: default(),
                source: ContentSource::Fallback,
            }
        }
        Err(e) => {
            tracing::warn!(content = %what, error = %e, "content read failed, serving default");
            Sourced {
                value: default(),
                source: ContentSource::Fallback,
            }
        }
    }
}
