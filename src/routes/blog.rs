/**
 * Blog Routes
 * Public listing/detail and the admin CRUD handlers
 */
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::blog::{self, PostSubmission, StoredPost};
use crate::content::{ContentSource, SaveOutcome};
use crate::error::ApiError;
use crate::media::{image_hints, ImageHints};
use crate::routes::forms::FormData;
use crate::routes::MessageResponse;
use crate::seo::{blog_post_schema, breadcrumb_schema, Crumb};
use crate::state::SharedState;

/// Query parameters for GET /api/blog (list)
#[derive(Debug, Default, Deserialize)]
pub struct BlogListQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListResponse {
    pub posts: Vec<StoredPost>,
    pub categories: Vec<String>,
    pub total: usize,
    pub source: ContentSource,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredData {
    pub blog_posting: Value,
    pub breadcrumb: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostResponse {
    pub post: StoredPost,
    pub source: ContentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageHints>,
    pub structured_data: StructuredData,
}

/// GET /api/blog - List posts with optional category/search filters
pub async fn list_posts(
    State(state): State<SharedState>,
    Query(query): Query<BlogListQuery>,
) -> Json<BlogListResponse> {
    let sourced = blog::load_posts(state.store()).await;
    // Categories come from the unfiltered set so the filter bar stays stable.
    let categories = blog::categories(&sourced.value);
    let posts = blog::filter_posts(sourced.value, query.category.as_deref(), query.q.as_deref());

    Json(BlogListResponse {
        total: posts.len(),
        posts,
        categories,
        source: sourced.source,
    })
}

/// GET /api/blog/{id} - Single post with structured data
pub async fn get_post(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<BlogPostResponse>, ApiError> {
    let sourced = blog::load_post(state.store(), &id)
        .await
        .ok_or(ApiError::NotFound)?;

    let site = state.site();
    let post = sourced.value;
    let structured_data = StructuredData {
        blog_posting: blog_post_schema(&site, &post),
        breadcrumb: breadcrumb_schema(&[
            Crumb { name: "Home", url: site.page_url("/") },
            Crumb { name: "Blog", url: site.page_url("blog") },
            Crumb {
                name: &post.post.title,
                url: site.page_url(&format!("blog/{}", post.id)),
            },
        ]),
    };

    Ok(Json(BlogPostResponse {
        image: post.post.img.as_deref().map(|src| image_hints(src, 0, true)),
        structured_data,
        source: sourced.source,
        post,
    }))
}

// ============================================================================
// Admin
// ============================================================================

fn submission(mut form: FormData) -> PostSubmission {
    PostSubmission {
        title: form.text("title"),
        desc: form.text("desc"),
        content: form.text("content"),
        category: form.text("category"),
        date: form.text("date"),
        author: form.opt_text("author"),
        image: form.image("image", "img"),
    }
}

/// GET /api/admin/blog - Every stored post, store errors surfaced
pub async fn admin_list_posts(State(state): State<SharedState>) -> Result<Json<Vec<StoredPost>>, ApiError> {
    Ok(Json(blog::list_stored(state.store()).await?))
}

/// POST /api/admin/blog
pub async fn create_post(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SaveOutcome<StoredPost>>), ApiError> {
    let form = FormData::read(multipart).await?;
    let outcome = blog::save_post(state.store(), state.blobs(), None, submission(form)).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// PUT /api/admin/blog/{id}
pub async fn update_post(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<SaveOutcome<StoredPost>>, ApiError> {
    let form = FormData::read(multipart).await?;
    let outcome = blog::save_post(state.store(), state.blobs(), Some(&id), submission(form)).await?;
    Ok(Json(outcome))
}

/// DELETE /api/admin/blog/{id}
pub async fn delete_post(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    blog::delete_post(state.store(), &id).await?;
    Ok(Json(MessageResponse::new("Blog post deleted successfully!")))
}

/// POST /api/admin/blog/seed
pub async fn seed_posts(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let count = blog::seed_sample_posts(state.store()).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_count(
            "Sample blog posts have been added successfully!",
            count,
        )),
    ))
}
