/**
 * Routes Module
 * API route handlers
 */
use serde::{Deserialize, Serialize};

pub mod auth;
pub mod blog;
pub mod contact;
pub mod forms;
pub mod health;
pub mod logs;
pub mod pages;
pub mod resources;
pub mod seo;
pub mod settings;
pub mod upload;

/// Plain acknowledgement body for writes that return no record.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            count: None,
        }
    }

    pub fn with_count(message: impl Into<String>, count: usize) -> Self {
        Self {
            count: Some(count),
            ..Self::new(message)
        }
    }
}
