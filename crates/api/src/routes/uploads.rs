//! Multipart file upload.

use std::path::Path as FsPath;

use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use serde::Serialize;
use uuid::Uuid;

use super::extract::Json;
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Name of the multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

/// Longest extension kept from the client's filename.
const MAX_EXTENSION_LENGTH: usize = 10;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Public path, e.g. `/media/<uuid>.png`.
    pub filename: String,
}

/// `POST /v1/file-upload`
///
/// Stores the `file` field as `<uuid><ext>` in the media directory.
pub async fn upload(
    State(state): State<AppState>,
    caller: CurrentUser,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let mut multipart = multipart?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let extension = field.file_name().and_then(safe_extension);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let name = extension.map_or_else(
            || Uuid::new_v4().to_string(),
            |ext| format!("{}.{ext}", Uuid::new_v4()),
        );

        tokio::fs::create_dir_all(state.media_dir())
            .await
            .map_err(|e| AppError::Internal(format!("failed to create media dir: {e}")))?;
        tokio::fs::write(state.media_dir().join(&name), &data)
            .await
            .map_err(|e| AppError::Internal(format!("failed to store upload: {e}")))?;

        tracing::info!(file = %name, bytes = data.len(), user_id = %caller.id(), "File uploaded");
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                filename: format!("/media/{name}"),
            }),
        ));
    }

    Err(AppError::BadRequest(format!(
        "multipart field '{FILE_FIELD}' is required"
    )))
}

/// The client filename's extension, if it is short and alphanumeric.
fn safe_extension(file_name: &str) -> Option<String> {
    let ext = FsPath::new(file_name).extension()?.to_str()?;
    (!ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LENGTH
        && ext.bytes().all(|b| b.is_ascii_alphanumeric()))
    .then(|| ext.to_ascii_lowercase())
}
