//! Download and share handlers

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::{absolute_url, base_url, public_url};
use crate::archive;
use crate::client::traits::GenerationInput;
use crate::error::{AppError, Result};
use crate::store::blob::content_type_for;
use crate::AppState;

/// Stream one thumbnail as an attachment
pub async fn download_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(thumbnail_id): Path<String>,
) -> Result<Response> {
    let filename = state
        .blobs
        .resolve(&thumbnail_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Thumbnail not found".to_string()))?;

    let bytes = state.blobs.read(&filename).await?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                content_type_for(&filename).to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Bundle every thumbnail of a session plus a manifest into a ZIP stream.
/// The archive lives only in memory, so nothing is left behind in the blob
/// directory whatever happens to the response.
pub async fn download_all(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Response> {
    let session_id = Uuid::parse_str(&session_id)
        .map_err(|_| AppError::NotFound("Session not found".to_string()))?;
    let session = state.sessions.load(session_id).await?;

    if session.thumbnails.is_empty() {
        return Err(AppError::NotFound(
            "No thumbnails found in session".to_string(),
        ));
    }

    let archive_bytes = archive::bundle_session(&state.blobs, &session).await?;
    info!(
        session_id = %session_id,
        entries = session.thumbnails.len(),
        bytes = archive_bytes.len(),
        "Bundled session archive"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"thumbnails_{}.zip\"", session_id),
            ),
        ],
        archive_bytes,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub user_input: GenerationInput,
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailInfo {
    pub id: String,
    pub filename: String,
    pub size: u64,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_info: Option<SessionInfo>,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub success: bool,
    pub thumbnail: ThumbnailInfo,
}

/// File stats for a thumbnail, with the owning session's questionnaire
/// and prompt when one references it
pub async fn thumbnail_info(
    State(state): State<Arc<AppState>>,
    Path(thumbnail_id): Path<String>,
) -> Result<Json<InfoResponse>> {
    let filename = state
        .blobs
        .resolve(&thumbnail_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Thumbnail not found".to_string()))?;

    let stat = state.blobs.stat(&filename).await?;

    let session_info = state
        .sessions
        .find_by_thumbnail(&thumbnail_id)
        .await?
        .map(|session| {
            let prompt = session
                .thumbnails
                .iter()
                .find(|t| t.id.to_string() == thumbnail_id)
                .map(|t| t.prompt.clone())
                .unwrap_or_default();

            SessionInfo {
                session_id: session.session_id,
                user_input: session.user_input,
                prompt,
            }
        });

    Ok(Json(InfoResponse {
        success: true,
        thumbnail: ThumbnailInfo {
            id: thumbnail_id,
            url: public_url(&state.settings, &filename),
            filename,
            size: stat.size,
            created_at: stat.modified,
            session_info,
        },
    }))
}

#[derive(Debug, Serialize)]
pub struct CopyResponse {
    pub success: bool,
    pub url: String,
    pub message: String,
}

/// Absolute URL for a thumbnail, for the client to copy
pub async fn copy_url(
    State(state): State<Arc<AppState>>,
    Path(thumbnail_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CopyResponse>> {
    let filename = state
        .blobs
        .resolve(&thumbnail_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Thumbnail not found".to_string()))?;

    Ok(Json(CopyResponse {
        success: true,
        url: absolute_url(&state.settings, &headers, &filename),
        message: "URL ready to copy to clipboard".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareBody {
    pub share_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub success: bool,
    pub share_url: String,
    pub share_type: String,
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

/// Mint a share link for a thumbnail. The expiry is advisory metadata;
/// nothing enforces it.
pub async fn share_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(thumbnail_id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<ShareBody>>,
) -> Result<Json<ShareResponse>> {
    state
        .blobs
        .resolve(&thumbnail_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Thumbnail not found".to_string()))?;

    let share_type = body
        .and_then(|Json(b)| b.share_type)
        .unwrap_or_else(|| "public".to_string());

    Ok(Json(ShareResponse {
        success: true,
        share_url: format!(
            "{}/api/download/{}",
            base_url(&state.settings, &headers),
            thumbnail_id
        ),
        share_type,
        expires_at: Utc::now() + Duration::days(7),
        message: "Share link created successfully".to_string(),
    }))
}
