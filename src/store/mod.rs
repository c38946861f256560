//! Schema-less document store.
//!
//! Every piece of site content is a JSON object in a named collection. The
//! store knows nothing about the shapes; typed views live in [`crate::content`].

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const BLOGS: &str = "blogs";
pub const RESOURCES: &str = "resources";
pub const PAGE_CONTENT: &str = "pageContent";
pub const CONTACT_INFO: &str = "contactInfo";
pub const SITE_SETTINGS: &str = "siteSettings";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("documents must be JSON objects")]
    NotAnObject,

    #[error("malformed document {id}: {source}")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// A stored record: opaque id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    /// Deserialize the fields into a typed view.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.data.clone())).map_err(|source| {
            StoreError::Malformed {
                id: self.id.clone(),
                source,
            }
        })
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

/// Serialize a typed record into document fields.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::NotAnObject),
        Err(e) => Err(StoreError::Backend(e.to_string())),
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection, ordered by id.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert under a freshly generated id.
    async fn create(
        &self,
        collection: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Insert or replace under a caller-chosen id.
    async fn put(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Shallow-merge fields into an existing document.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Returns `false` when nothing was stored under `id`.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Round-trip latency to the backend.
    async fn ping(&self) -> Result<Duration, StoreError>;
}

pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
