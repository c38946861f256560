use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::blob::{detect_image_type, store_image};
use crate::error::ApiError;
use crate::routes::forms::FormData;
use crate::state::SharedState;

const DEFAULT_FOLDER: &str = "uploads";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub size: usize,
    pub mime_type: String,
}

fn is_valid_folder(folder: &str) -> bool {
    !folder.is_empty()
        && folder.len() <= 64
        && folder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// POST /api/admin/upload - store a single image (`file`) under an optional `folder`
pub async fn upload_image(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut form = FormData::read(multipart).await?;

    let folder = form.opt_text("folder").unwrap_or_else(|| DEFAULT_FOLDER.to_string());
    if !is_valid_folder(&folder) {
        return Err(ApiError::bad_request("Invalid folder name"));
    }

    let file = form
        .take_file("file")
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;

    let url = store_image(state.blobs(), &folder, &file).await?;
    let mime_type = detect_image_type(&file.bytes).unwrap_or("application/octet-stream");

    tracing::info!(folder = %folder, size = file.bytes.len(), mime = %mime_type, "image uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url,
            size: file.bytes.len(),
            mime_type: mime_type.to_string(),
        }),
    ))
}
