//! Postgres-backed store: one `documents` table, JSONB payloads.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;

use super::{new_document_id, Document, DocumentStore, StoreError};
use crate::db::models::DocumentRow;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn into_document(row: DocumentRow) -> Result<Document, StoreError> {
    match row.data {
        Value::Object(data) => Ok(Document { id: row.id, data }),
        _ => Err(StoreError::NotAnObject),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data FROM documents WHERE collection = $1 ORDER BY id",
        )
        .bind(collection)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(into_document).collect()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(into_document).transpose()
    }

    async fn create(
        &self,
        collection: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let id = new_document_id();
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            RETURNING id, data
            "#,
        )
        .bind(collection)
        .bind(&id)
        .bind(Value::Object(data))
        .fetch_one(self.pool.as_ref())
        .await?;

        into_document(row)
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            RETURNING id, data
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(data))
        .fetch_one(self.pool.as_ref())
        .await?;

        into_document(row)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents
            SET data = data || $3, updated_at = now()
            WHERE collection = $1 AND id = $2
            RETURNING id, data
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(data))
        .fetch_optional(self.pool.as_ref())
        .await?;

        match row {
            Some(row) => into_document(row),
            None => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(self.pool.as_ref()).await?;
        Ok(start.elapsed())
    }
}
