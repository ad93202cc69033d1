//! Session documents persisted beside the blobs they reference
//!
//! One JSON file per session, named `<session-id>.json`, in the same flat
//! directory as the images. Writes to a given session are serialized
//! through a per-session async mutex so concurrent regenerations append
//! rather than overwrite each other.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::client::traits::{GenerationInput, OutputFormat, PromptArtifact};
use crate::error::{AppError, Result};

/// Reference to the uploaded source image
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalFile {
    pub id: String,
    pub filename: String,
    pub url: String,
}

/// Pixel dimensions of a generated thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<OutputFormat> for Dimensions {
    fn from(format: OutputFormat) -> Self {
        let (width, height) = format.dimensions();
        Self { width, height }
    }
}

/// One generated thumbnail belonging to a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnail {
    pub id: Uuid,
    pub format: OutputFormat,
    pub dimensions: Dimensions,
    pub filename: String,
    pub url: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

/// Persisted record tying one upload, one questionnaire answer set, and
/// the resulting thumbnails together
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: Uuid,
    pub original_file: OriginalFile,
    pub user_input: GenerationInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_prompt: Option<PromptArtifact>,
    #[serde(default)]
    pub prompt_variations: Vec<String>,
    pub thumbnails: Vec<Thumbnail>,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regenerated_at: Option<DateTime<Utc>>,
}

/// Store for session documents
pub struct SessionStore {
    dir: PathBuf,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: DashMap::new(),
        }
    }

    fn doc_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Per-session write lock. Hold the guard across the whole
    /// read-modify-write of a regeneration.
    pub fn lock_handle(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Persist a session document
    pub async fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_vec_pretty(session)?;
        fs::write(self.doc_path(session.session_id), json).await?;
        Ok(())
    }

    /// Load a session document, failing with "Session not found" when the
    /// backing file is absent
    pub async fn load(&self, id: Uuid) -> Result<Session> {
        let path = self.doc_path(id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound("Session not found".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Find the session owning a given thumbnail by scanning the session
    /// documents. Unparseable documents are skipped.
    pub async fn find_by_thumbnail(&self, thumbnail_id: &str) -> Result<Option<Session>> {
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(".json") {
                continue;
            }

            let Ok(bytes) = fs::read(entry.path()).await else {
                continue;
            };
            let Ok(session) = serde_json::from_slice::<Session>(&bytes) else {
                continue;
            };

            if session
                .thumbnails
                .iter()
                .any(|t| t.id.to_string() == thumbnail_id)
            {
                return Ok(Some(session));
            }
        }

        Ok(None)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
