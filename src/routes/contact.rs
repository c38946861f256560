/**
 * Contact Routes
 * Contact details, the contact form relay and the admin contact editor
 */
use axum::{extract::State, Json};
use serde::Serialize;

use crate::content::contact::{self, ContactInfo, StoredContactInfo};
use crate::content::{ContentSource, SaveOutcome};
use crate::error::ApiError;
use crate::mailer::ContactMessage;
use crate::routes::MessageResponse;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfoResponse {
    #[serde(flatten)]
    pub contact: StoredContactInfo,
    pub source: ContentSource,
}

/// GET /api/contact-info
pub async fn get_contact_info(State(state): State<SharedState>) -> Json<ContactInfoResponse> {
    let sourced = contact::load_contact_info(state.store()).await;
    Json(ContactInfoResponse {
        contact: sourced.value,
        source: sourced.source,
    })
}

/// POST /api/contact - relay a contact form submission
pub async fn send_message(
    State(state): State<SharedState>,
    Json(message): Json<ContactMessage>,
) -> Result<Json<MessageResponse>, ApiError> {
    message.validate()?;

    let relay = state.relay.as_ref().ok_or_else(|| {
        tracing::warn!("contact form submitted but no mail relay is configured");
        ApiError::Unavailable("The contact form is temporarily unavailable.".to_string())
    })?;

    relay.send(&message.sanitized()).await?;
    Ok(Json(MessageResponse::new(
        "Your message has been sent successfully. We'll get back to you soon.",
    )))
}

/// GET /api/admin/contact-info - creates the default record on first use
pub async fn admin_get_contact_info(
    State(state): State<SharedState>,
) -> Result<Json<StoredContactInfo>, ApiError> {
    Ok(Json(contact::get_or_create_contact_info(state.store()).await?))
}

/// PUT /api/admin/contact-info
pub async fn admin_put_contact_info(
    State(state): State<SharedState>,
    Json(info): Json<ContactInfo>,
) -> Result<Json<SaveOutcome<StoredContactInfo>>, ApiError> {
    Ok(Json(contact::save_contact_info(state.store(), info).await?))
}
