//! In-process store used when no database is configured, and in tests.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{new_document_id, Document, DocumentStore, StoreError};

type Collection = BTreeMap<String, Map<String, Value>>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn create(
        &self,
        collection: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let id = new_document_id();
        self.put(collection, &id, data).await
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data.clone());
        Ok(Document {
            id: id.to_string(),
            data,
        })
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        existing.extend(data);
        Ok(Document {
            id: id.to_string(),
            data: existing.clone(),
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        let _guard = self.collections.read().await;
        Ok(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryStore::new();
        let doc = store
            .create("blogs", fields(json!({ "title": "Hello" })))
            .await
            .unwrap();

        let fetched = store.get("blogs", &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.get_str("title"), Some("Hello"));
        assert!(store.get("blogs", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleted_document_disappears_from_list() {
        let store = MemoryStore::new();
        let keep = store.create("blogs", fields(json!({ "n": 1 }))).await.unwrap();
        let gone = store.create("blogs", fields(json!({ "n": 2 }))).await.unwrap();

        assert!(store.delete("blogs", &gone.id).await.unwrap());
        let ids: Vec<String> = store
            .list("blogs")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![keep.id]);
        assert!(!store.delete("blogs", &gone.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let doc = store
            .create("resources", fields(json!({ "title": "A", "link": "x" })))
            .await
            .unwrap();

        let updated = store
            .update("resources", &doc.id, fields(json!({ "title": "B" })))
            .await
            .unwrap();
        assert_eq!(updated.get_str("title"), Some("B"));
        assert_eq!(updated.get_str("link"), Some("x"));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update("resources", "nope", Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_put_uses_given_id() {
        let store = MemoryStore::new();
        store
            .put("siteSettings", "footerLogo", fields(json!({ "linkUrl": "/" })))
            .await
            .unwrap();
        let doc = store.get("siteSettings", "footerLogo").await.unwrap();
        assert!(doc.is_some());
    }
}
