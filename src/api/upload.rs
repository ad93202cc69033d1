//! Upload handlers: accept, inspect, and delete source photos

use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::public_url;
use crate::error::{AppError, Result};
use crate::store::blob::extension_for_mime;
use crate::AppState;

const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// Record returned for a stored upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: usize,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub image_id: String,
    pub file: UploadedFile,
}

/// Accept one image from a multipart form (field `image` or `photo`),
/// validate type and size, and persist it under a fresh identifier.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::Validation(format!("Malformed multipart request: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if name != "image" && name != "photo" {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let mimetype = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| {
            AppError::Validation(format!("Failed to read uploaded file: {}", e))
        })?;

        upload = Some((original_name, mimetype, data));
        break;
    }

    let (original_name, mimetype, data) =
        upload.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

    if !ALLOWED_MIME_TYPES.contains(&mimetype.as_str()) {
        return Err(AppError::Validation(
            "Invalid file type. Only JPEG, JPG, and PNG files are allowed.".to_string(),
        ));
    }

    let max_bytes = state.settings.storage.max_upload_bytes;
    if data.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "File too large. Maximum size is {} bytes",
            max_bytes
        )));
    }

    let id = Uuid::new_v4();
    let extension = stored_extension(&original_name, &mimetype);
    let filename = state.blobs.save_upload(id, &extension, &data).await?;

    info!(image_id = %id, size = data.len(), mimetype = %mimetype, "Stored uploaded image");

    let file = UploadedFile {
        id: id.to_string(),
        filename: filename.clone(),
        original_name,
        mimetype,
        size: data.len(),
        url: public_url(&state.settings, &filename),
        uploaded_at: Utc::now(),
    };

    Ok(Json(UploadResponse {
        success: true,
        message: "File uploaded successfully".to_string(),
        image_id: file.id.clone(),
        file,
    }))
}

/// Extension under which an upload is stored: the original extension when
/// it matches an allowed image type, otherwise derived from the MIME type.
fn stored_extension(original_name: &str, mimetype: &str) -> String {
    if let Some((_, ext)) = original_name.rsplit_once('.') {
        let ext = ext.to_ascii_lowercase();
        if matches!(ext.as_str(), "jpg" | "jpeg" | "png") {
            return ext;
        }
    }

    extension_for_mime(mimetype).unwrap_or("png").to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub id: String,
    pub filename: String,
    pub size: u64,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct FileInfoResponse {
    pub file: FileInfo,
}

/// Look up a stored upload by identifier
pub async fn file_info(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<FileInfoResponse>> {
    let filename = state
        .blobs
        .resolve(&file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let stat = state.blobs.stat(&filename).await?;

    Ok(Json(FileInfoResponse {
        file: FileInfo {
            id: file_id,
            url: public_url(&state.settings, &filename),
            filename,
            size: stat.size,
            uploaded_at: stat.modified,
        },
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Delete a stored upload by identifier
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let filename = state
        .blobs
        .resolve(&file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    state.blobs.delete(&filename).await?;
    info!(file_id = %file_id, "Deleted uploaded file");

    Ok(Json(DeleteResponse {
        success: true,
        message: "File deleted successfully".to_string(),
    }))
}
