//! Contact form relay.
//!
//! Messages from the public contact form are validated here and forwarded to
//! an e-mail delivery service. EmailJS is the only implementation; tests use
//! a recording stub.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EmailJsConfig;
use crate::content::{require, ContentError};
use crate::validators::{is_valid_email, is_valid_length, sanitize_text};

pub const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

pub const SUBJECTS: [&str; 4] = ["General Inquiry", "Collaboration", "Trading Question", "Other"];

const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail relay rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> Result<(), ContentError> {
        require(&[
            ("name", self.name.as_str()),
            ("email", self.email.as_str()),
            ("subject", self.subject.as_str()),
            ("message", self.message.as_str()),
        ])?;

        if !is_valid_length(&self.name, 1, 100) {
            return Err(ContentError::invalid("name", "must be at most 100 characters"));
        }
        if !is_valid_email(&self.email) {
            return Err(ContentError::invalid("email", "not a valid e-mail address"));
        }
        if !SUBJECTS.contains(&self.subject.trim()) {
            return Err(ContentError::invalid("subject", "select a subject from the list"));
        }
        if !is_valid_length(&self.message, 1, MAX_MESSAGE_LEN) {
            return Err(ContentError::invalid("message", "must be at most 5000 characters"));
        }
        Ok(())
    }

    /// Trimmed copy with markup escaped, safe to hand to a mail template.
    pub fn sanitized(&self) -> Self {
        Self {
            name: sanitize_text(self.name.trim()),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: sanitize_text(self.message.trim()),
        }
    }
}

#[async_trait]
pub trait ContactRelay: Send + Sync {
    async fn send(&self, message: &ContactMessage) -> Result<(), RelayError>;
}

#[derive(Debug, Serialize)]
struct TemplateParams<'a> {
    from_name: &'a str,
    from_email: &'a str,
    reply_to: &'a str,
    subject: &'a str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: TemplateParams<'a>,
}

pub struct EmailJsRelay {
    client: reqwest::Client,
    config: EmailJsConfig,
    endpoint: String,
}

impl EmailJsRelay {
    pub fn new(config: EmailJsConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            config,
            endpoint: EMAILJS_SEND_URL.to_string(),
        })
    }

    fn request<'a>(&'a self, message: &'a ContactMessage) -> SendRequest<'a> {
        SendRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.public_key,
            access_token: self.config.private_key.as_deref(),
            template_params: TemplateParams {
                from_name: &message.name,
                from_email: &message.email,
                reply_to: &message.email,
                subject: &message.subject,
                message: &message.message,
            },
        }
    }
}

#[async_trait]
impl ContactRelay for EmailJsRelay {
    async fn send(&self, message: &ContactMessage) -> Result<(), RelayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.request(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "emailjs rejected contact message");
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(subject = %message.subject, "contact message relayed");
        Ok(())
    }
}
