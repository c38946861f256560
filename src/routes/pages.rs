/**
 * Page Content Routes
 * Public page content with fallback and the admin editor endpoints
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::contact::load_contact_info;
use crate::content::pages::{self, is_valid_page_name, PageContent, PageEntry, HOME, RESOURCES};
use crate::content::{ContentSource, SaveOutcome};
use crate::error::ApiError;
use crate::routes::MessageResponse;
use crate::seo::{breadcrumb_schema, faq_schema, organization_schema, website_schema, Crumb, OrganizationDetails};
use crate::state::{AppState, SharedState};
use crate::store::PAGE_CONTENT;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub page_name: String,
    pub content: PageContent,
    pub source: ContentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON-LD blocks keyed by schema type.
    pub structured_data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct PageUpdateRequest {
    #[serde(default)]
    pub content: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub id: String,
    pub page_name: String,
    pub content: PageContent,
}

fn title_case(page: &str) -> String {
    page.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

async fn structured_data(state: &AppState, page: &str, content: &PageContent) -> Map<String, Value> {
    let site = state.site();
    let mut data = Map::new();

    if page == HOME {
        let contact = load_contact_info(state.store()).await.value.info;
        let details = OrganizationDetails {
            same_as: contact
                .social_links
                .iter()
                .map(|l| l.url.clone())
                .filter(|u| u.starts_with("http"))
                .collect(),
            email: Some(contact.email).filter(|e| !e.is_empty()),
            telephone: None,
        };
        data.insert("website".into(), website_schema(&site));
        data.insert("organization".into(), organization_schema(&site, &details));
    } else {
        let name = content
            .title()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| title_case(page));
        data.insert(
            "breadcrumb".into(),
            breadcrumb_schema(&[
                Crumb { name: "Home", url: site.page_url("/") },
                Crumb { name: &name, url: site.page_url(page) },
            ]),
        );
    }

    if let (RESOURCES, PageContent::Resources(resources)) = (page, content) {
        let questions: Vec<(&str, &str)> = resources
            .resources
            .iter()
            .filter(|r| !r.description.trim().is_empty())
            .map(|r| (r.title.as_str(), r.description.as_str()))
            .collect();
        if !questions.is_empty() {
            data.insert("faq".into(), faq_schema(&questions));
        }
    }

    data
}

/// GET /api/pages/{name}
pub async fn get_page(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<PageResponse>, ApiError> {
    if !is_valid_page_name(&name) {
        return Err(ApiError::NotFound);
    }
    let sourced = pages::load_page(state.store(), &name)
        .await
        .ok_or(ApiError::NotFound)?;

    let structured_data = structured_data(&state, &name, &sourced.value).await;
    Ok(Json(PageResponse {
        title: sourced.value.title().map(str::to_string),
        description: sourced.value.description().map(str::to_string),
        structured_data,
        page_name: name,
        content: sourced.value,
        source: sourced.source,
    }))
}

/// GET /api/admin/pages - Re-seeds missing default pages, then lists every document
pub async fn admin_list_pages(State(state): State<SharedState>) -> Result<Json<Vec<PageEntry>>, ApiError> {
    pages::seed_missing_pages(state.store()).await?;
    Ok(Json(pages::list_pages(state.store()).await?))
}

/// GET /api/admin/pages/{name} - Stored content, or the default to start editing from
pub async fn admin_get_page(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match pages::find_page(state.store(), &name).await? {
        Some(doc) => Ok(Json(serde_json::json!({
            "id": doc.id,
            "pageName": doc.page_name,
            "content": doc.content,
            "source": ContentSource::Store,
        }))),
        None => {
            let default = PageContent::default_for(&name).ok_or(ApiError::NotFound)?;
            Ok(Json(serde_json::json!({
                "pageName": name,
                "content": default,
                "source": ContentSource::Fallback,
            })))
        }
    }
}

/// PUT /api/admin/pages/{name}
pub async fn admin_put_page(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(payload): Json<PageUpdateRequest>,
) -> Result<(StatusCode, Json<SaveOutcome<PageRecord>>), ApiError> {
    let content = PageContent::from_submission(&name, payload.content)?;
    let (doc, created) = pages::upsert_page(state.store(), &name, content).await?;
    tracing::info!(page = %name, id = %doc.id, created, "page content saved");

    let (status, message) = if created {
        (StatusCode::CREATED, "New page content added successfully!")
    } else {
        (StatusCode::OK, "Page content updated successfully!")
    };
    Ok((
        status,
        Json(SaveOutcome {
            record: PageRecord {
                id: doc.id,
                page_name: doc.page_name,
                content: doc.content,
            },
            message: message.to_string(),
            image_upload_failed: false,
        }),
    ))
}

/// DELETE /api/admin/pages/id/{id}
pub async fn admin_delete_page(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.store().delete(PAGE_CONTENT, &id).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!(id = %id, "page content deleted");
    Ok(Json(MessageResponse::new("Content deleted successfully!")))
}
