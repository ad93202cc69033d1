//! Generation handlers: session creation, regeneration, edits, analysis

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{absolute_url, public_url};
use crate::client::traits::{
    GeneratedImage, GenerationInput, OutputFormat, PromptArtifact,
};
use crate::error::{AppError, Result};
use crate::store::session::{Dimensions, OriginalFile, Session, Thumbnail};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    pub file_id: Option<String>,
    pub video_type: Option<String>,
    pub style: Option<String>,
    pub mood: Option<String>,
    pub photo_placement: Option<String>,
    pub formats: Option<Vec<String>>,
    pub generate_count: Option<u32>,
}

/// Thumbnail summary returned in generation responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailSummary {
    pub id: Uuid,
    pub format: OutputFormat,
    pub dimensions: Dimensions,
    pub url: String,
    pub prompt: String,
}

impl From<&Thumbnail> for ThumbnailSummary {
    fn from(t: &Thumbnail) -> Self {
        Self {
            id: t.id,
            format: t.format,
            dimensions: t.dimensions,
            url: t.url.clone(),
            prompt: t.prompt.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub message: String,
    pub session_id: Uuid,
    pub thumbnails: Vec<ThumbnailSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_prompt: Option<PromptArtifact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prompt_variations: Vec<String>,
}

fn required(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> String {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => v,
        None => {
            missing.push(name);
            String::new()
        }
    }
}

/// Validate the questionnaire body, reporting every missing field at once
fn parse_input(body: GenerateBody) -> Result<(String, GenerationInput)> {
    let mut missing = Vec::new();

    let file_id = required(body.file_id, "fileId", &mut missing);
    let video_type = required(body.video_type, "videoType", &mut missing);
    let style = required(body.style, "style", &mut missing);
    let mood = required(body.mood, "mood", &mut missing);
    let placement = required(body.photo_placement, "photoPlacement", &mut missing);

    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let photo_placement = placement.parse()?;

    let formats = match body.formats {
        Some(raw) if !raw.is_empty() => raw
            .iter()
            .map(|f| f.parse())
            .collect::<Result<Vec<OutputFormat>>>()?,
        _ => vec![OutputFormat::Horizontal],
    };

    let generate_count = body.generate_count.unwrap_or(1);
    if !(1..=5).contains(&generate_count) {
        return Err(AppError::Validation(
            "generateCount must be between 1 and 5".to_string(),
        ));
    }

    Ok((
        file_id,
        GenerationInput {
            video_type,
            style,
            mood,
            photo_placement,
            formats,
            generate_count,
        },
    ))
}

/// Create a session: enhance the prompt when configured, generate the
/// requested thumbnails, and persist the session document.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerateResponse>> {
    let (file_id, input) = parse_input(body)?;

    let source_filename = state
        .blobs
        .resolve(&file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Uploaded file not found".to_string()))?;
    let source_path = state.blobs.path_of(&source_filename);

    // Enhancement is optional: it runs only when a credential is configured
    let (enhanced_prompt, prompt_variations) = if state.enhancer.is_configured() {
        let artifact = state.enhancer.enhance(&input).await?;
        let variations = state
            .enhancer
            .variations(&artifact.enhanced_prompt, 3)
            .await?;
        (Some(artifact), variations)
    } else {
        (None, Vec::new())
    };

    let prompt = enhanced_prompt
        .as_ref()
        .map(|a| a.enhanced_prompt.clone())
        .unwrap_or_else(|| input.base_prompt());

    let thumbnails = generate_batch(
        &state,
        &prompt,
        &source_path,
        &input.formats,
        input.generate_count,
    )
    .await?;

    let session = Session {
        session_id: Uuid::new_v4(),
        original_file: OriginalFile {
            id: file_id,
            url: public_url(&state.settings, &source_filename),
            filename: source_filename,
        },
        user_input: input,
        enhanced_prompt,
        prompt_variations,
        thumbnails,
        generated_at: Utc::now(),
        regenerated_at: None,
    };

    state.sessions.save(&session).await?;
    info!(
        session_id = %session.session_id,
        thumbnails = session.thumbnails.len(),
        "Created generation session"
    );

    Ok(Json(GenerateResponse {
        success: true,
        message: "Thumbnails generated successfully".to_string(),
        session_id: session.session_id,
        thumbnails: session.thumbnails.iter().map(ThumbnailSummary::from).collect(),
        enhanced_prompt: session.enhanced_prompt,
        prompt_variations: session.prompt_variations,
    }))
}

/// Generate `formats × count` thumbnails sequentially. A failure discards
/// the whole batch: files persisted earlier in the batch are removed
/// best-effort before the error propagates, so a session never references
/// half a batch.
async fn generate_batch(
    state: &AppState,
    prompt: &str,
    source_path: &std::path::Path,
    formats: &[OutputFormat],
    count: u32,
) -> Result<Vec<Thumbnail>> {
    let mut thumbnails = Vec::new();

    for format in formats {
        for _ in 0..count {
            match state.generator.generate(prompt, source_path, *format).await {
                Ok(image) => thumbnails.push(new_thumbnail(state, image, *format, prompt)),
                Err(e) => {
                    discard_batch(state, &thumbnails).await;
                    return Err(e);
                }
            }
        }
    }

    Ok(thumbnails)
}

fn new_thumbnail(
    state: &AppState,
    image: GeneratedImage,
    format: OutputFormat,
    prompt: &str,
) -> Thumbnail {
    Thumbnail {
        id: image.id,
        format,
        dimensions: format.into(),
        url: public_url(&state.settings, &image.filename),
        filename: image.filename,
        prompt: prompt.to_string(),
        created_at: Utc::now(),
    }
}

async fn discard_batch(state: &AppState, thumbnails: &[Thumbnail]) {
    for thumbnail in thumbnails {
        if let Err(e) = state.blobs.delete(&thumbnail.filename).await {
            warn!(
                filename = %thumbnail.filename,
                error = %e,
                "Failed to remove discarded thumbnail"
            );
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateBody {
    pub session_id: Option<String>,
    pub new_prompts: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateResponse {
    pub success: bool,
    pub message: String,
    pub new_thumbnails: Vec<ThumbnailSummary>,
}

/// Append freshly generated thumbnails to an existing session, using the
/// supplied prompts or the session's stored variations.
pub async fn regenerate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegenerateBody>,
) -> Result<Json<RegenerateResponse>> {
    let session_id = body
        .session_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Session ID is required".to_string()))?;
    let session_id = Uuid::parse_str(&session_id)
        .map_err(|_| AppError::NotFound("Session not found".to_string()))?;

    // Concurrent regenerations of one session serialize here
    let lock = state.sessions.lock_handle(session_id);
    let _guard = lock.lock().await;

    let mut session = state.sessions.load(session_id).await?;

    let prompts = body
        .new_prompts
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| session.prompt_variations.clone());
    if prompts.is_empty() {
        return Err(AppError::Validation(
            "No prompts available for regeneration".to_string(),
        ));
    }

    let source_path = state.blobs.path_of(&session.original_file.filename);

    let mut new_thumbnails = Vec::new();
    for prompt in &prompts {
        match generate_batch(&state, prompt, &source_path, &session.user_input.formats, 1).await {
            Ok(mut batch) => new_thumbnails.append(&mut batch),
            Err(e) => {
                discard_batch(&state, &new_thumbnails).await;
                return Err(e);
            }
        }
    }

    session.thumbnails.extend(new_thumbnails.iter().cloned());
    session.regenerated_at = Some(Utc::now());
    state.sessions.save(&session).await?;

    info!(
        session_id = %session_id,
        added = new_thumbnails.len(),
        total = session.thumbnails.len(),
        "Regenerated thumbnails"
    );

    Ok(Json(RegenerateResponse {
        success: true,
        message: "Thumbnails regenerated successfully".to_string(),
        new_thumbnails: new_thumbnails.iter().map(ThumbnailSummary::from).collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: Session,
}

/// Fetch a session document
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>> {
    let session_id = Uuid::parse_str(&session_id)
        .map_err(|_| AppError::NotFound("Session not found".to_string()))?;
    let session = state.sessions.load(session_id).await?;

    Ok(Json(SessionResponse {
        success: true,
        session,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBody {
    pub edit_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditedThumbnail {
    pub id: Uuid,
    pub url: String,
    pub edited_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResponse {
    pub success: bool,
    pub message: String,
    pub thumbnail: EditedThumbnail,
}

/// Rework one thumbnail according to an edit instruction
pub async fn edit_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(thumbnail_id): Path<String>,
    body: Option<Json<EditBody>>,
) -> Result<Json<EditResponse>> {
    let edit_prompt = body
        .and_then(|Json(b)| b.edit_prompt)
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Edit prompt is required".to_string()))?;

    let filename = state
        .blobs
        .resolve(&thumbnail_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Thumbnail not found".to_string()))?;

    let image = state
        .generator
        .edit(&state.blobs.path_of(&filename), &edit_prompt)
        .await?;

    info!(thumbnail_id = %thumbnail_id, edited = %image.id, "Edited thumbnail");

    Ok(Json(EditResponse {
        success: true,
        message: "Thumbnail edited successfully".to_string(),
        thumbnail: EditedThumbnail {
            id: image.id,
            url: public_url(&state.settings, &image.filename),
            edited_at: Utc::now(),
        },
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: String,
    pub thumbnail_id: String,
}

/// Critique a thumbnail via the text provider
pub async fn analyze_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(thumbnail_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<AnalyzeResponse>> {
    let filename = state
        .blobs
        .resolve(&thumbnail_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Thumbnail not found".to_string()))?;

    let url = absolute_url(&state.settings, &headers, &filename);
    let analysis = state.enhancer.analyze(&url).await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis,
        thumbnail_id,
    }))
}
