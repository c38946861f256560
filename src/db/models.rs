//! Database rows for the document and session tables.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub uid: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}
