/**
 * Resource Routes
 * Affiliate resource listing and admin CRUD
 */
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::content::resources::{self, ResourceCategory, ResourceSubmission, StoredResource};
use crate::content::{ContentSource, SaveOutcome};
use crate::error::ApiError;
use crate::routes::forms::FormData;
use crate::routes::MessageResponse;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct ResourceListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceListResponse {
    pub resources: Vec<StoredResource>,
    pub categories: Vec<ResourceCategory>,
    pub total: usize,
    pub source: ContentSource,
}

/// GET /api/resources
pub async fn list_resources(
    State(state): State<SharedState>,
    Query(query): Query<ResourceListQuery>,
) -> Json<ResourceListResponse> {
    let sourced = resources::load_resources(state.store()).await;
    let categories = resources::categories(&sourced.value);
    let list = resources::filter_by_category(sourced.value, query.category.as_deref());

    Json(ResourceListResponse {
        total: list.len(),
        resources: list,
        categories,
        source: sourced.source,
    })
}

fn submission(mut form: FormData) -> ResourceSubmission {
    ResourceSubmission {
        category: form.text("category"),
        category_label: form.text("categoryLabel"),
        title: form.text("title"),
        description: form.text("description"),
        link: form.text("link"),
        image: form.image("image", "imageUrl"),
    }
}

/// GET /api/admin/resources
pub async fn admin_list_resources(
    State(state): State<SharedState>,
) -> Result<Json<Vec<StoredResource>>, ApiError> {
    Ok(Json(resources::list_stored(state.store()).await?))
}

/// POST /api/admin/resources
pub async fn create_resource(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SaveOutcome<StoredResource>>), ApiError> {
    let form = FormData::read(multipart).await?;
    let outcome = resources::save_resource(state.store(), state.blobs(), None, submission(form)).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// PUT /api/admin/resources/{id}
pub async fn update_resource(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<SaveOutcome<StoredResource>>, ApiError> {
    let form = FormData::read(multipart).await?;
    let outcome =
        resources::save_resource(state.store(), state.blobs(), Some(&id), submission(form)).await?;
    Ok(Json(outcome))
}

/// DELETE /api/admin/resources/{id}
pub async fn delete_resource(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    resources::delete_resource(state.store(), &id).await?;
    Ok(Json(MessageResponse::new("Resource deleted successfully!")))
}

/// POST /api/admin/resources/seed
pub async fn seed_resources(
    State(state): State<SharedState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let count = resources::seed_resources(state.store()).await?;
    let message = if count == 0 {
        "Resources already exist, nothing to add."
    } else {
        "Sample resources have been added successfully!"
    };
    Ok(Json(MessageResponse::with_count(message, count)))
}
