//! Flat-directory blob store for uploads and generated thumbnails
//!
//! Files are keyed by generated identifiers embedded in the filename:
//! uploads are stored as `<id>.<ext>`, generated images as
//! `<id>_<tag>.png`, and session documents as `<id>.json`. Lookup matches
//! the identifier against the filename stem exactly, so one identifier can
//! never shadow another.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

/// Handle to the blob directory
pub struct BlobStore {
    dir: PathBuf,
}

/// Size and timestamp of a stored file
#[derive(Debug, Clone)]
pub struct FileStat {
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ensure the blob directory exists
    pub async fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
            debug!(path = ?self.dir, "Created blob directory");
        }
        Ok(())
    }

    /// Persist uploaded bytes under `<id>.<ext>`
    pub async fn save_upload(&self, id: Uuid, extension: &str, data: &[u8]) -> Result<String> {
        self.ensure_dir().await?;

        let filename = format!("{}.{}", id, extension.trim_start_matches('.'));
        fs::write(self.dir.join(&filename), data).await?;

        debug!(filename = %filename, size = data.len(), "Saved upload");
        Ok(filename)
    }

    /// Persist generated image bytes under `<id>_<tag>.png`
    pub async fn save_image(&self, id: Uuid, tag: &str, data: &[u8]) -> Result<String> {
        self.ensure_dir().await?;

        let filename = format!("{}_{}.png", id, tag);
        fs::write(self.dir.join(&filename), data).await?;

        debug!(filename = %filename, size = data.len(), "Saved generated image");
        Ok(filename)
    }

    /// Find the stored filename for an identifier by exact stem match
    pub async fn resolve(&self, id: &str) -> Result<Option<String>> {
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if filename_stem(name) == id {
                    return Ok(Some(name.to_string()));
                }
            }
        }

        Ok(None)
    }

    /// Read a stored file
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.dir.join(filename)).await?)
    }

    /// Delete a stored file
    pub async fn delete(&self, filename: &str) -> Result<()> {
        Ok(fs::remove_file(self.dir.join(filename)).await?)
    }

    /// Size and modification time of a stored file
    pub async fn stat(&self, filename: &str) -> Result<FileStat> {
        let metadata = fs::metadata(self.dir.join(filename)).await?;
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(FileStat {
            size: metadata.len(),
            modified,
        })
    }

    /// Full filesystem path for a stored filename
    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

/// Identifier portion of a stored filename: everything before the first
/// `.` or `_` separator.
pub fn filename_stem(filename: &str) -> &str {
    filename
        .split(['.', '_'])
        .next()
        .unwrap_or(filename)
}

/// Map an upload MIME type to the stored file extension
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Content type served for a stored filename, by extension
pub fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("json") => "application/json",
        _ => "image/png",
    }
}
