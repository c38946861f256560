//! Multipart form parsing for admin submissions that carry an image.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::blob::UploadedFile;
use crate::error::ApiError;
use crate::media::ImageInput;

#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

impl FormData {
    /// Drain a multipart body. Parts with a file name are files; the rest are text.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            tracing::warn!(error = %e, "malformed multipart body");
            ApiError::bad_request("Invalid form data")
        })? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            if file_name.is_some() {
                let bytes = field.bytes().await.map_err(|e| {
                    tracing::warn!(field = %name, error = %e, "failed to read uploaded file");
                    ApiError::bad_request("Failed to read uploaded file")
                })?;
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    form.files.push(UploadedFile {
                        field_name: name,
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|_| ApiError::bad_request("Invalid form field"))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn opt_text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        let idx = self.files.iter().position(|f| f.field_name == name)?;
        Some(self.files.remove(idx))
    }

    /// A new file in `file_field` wins over the existing reference in `url_field`.
    pub fn image(&mut self, file_field: &str, url_field: &str) -> ImageInput {
        match self.take_file(file_field) {
            Some(file) => ImageInput::Upload(file),
            None => ImageInput::Keep(self.opt_text(url_field)),
        }
    }
}
