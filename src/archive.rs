//! ZIP bundling for whole-session downloads
//!
//! The archive is assembled in memory and streamed to the caller, so no
//! transient archive file ever lands in the blob directory.

use serde_json::json;
use std::io::{Cursor, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::error::{AppError, Result};
use crate::store::blob::BlobStore;
use crate::store::session::{Session, Thumbnail};

/// Manifest entry name inside the archive
pub const MANIFEST_NAME: &str = "session_info.json";

/// Display name of a thumbnail inside the archive
pub fn display_name(thumbnail: &Thumbnail) -> String {
    format!("{}_{}.png", thumbnail.format.tag(), thumbnail.id)
}

/// Bundle a session's thumbnails and a JSON manifest into a ZIP archive.
/// Thumbnails whose backing file has gone missing are skipped rather than
/// failing the whole bundle.
pub async fn bundle_session(blobs: &BlobStore, session: &Session) -> Result<Vec<u8>> {
    let manifest = session_manifest(session)?;

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for thumbnail in &session.thumbnails {
            let Ok(data) = blobs.read(&thumbnail.filename).await else {
                continue;
            };

            zip.start_file(display_name(thumbnail), options)
                .map_err(|e| AppError::Internal(format!("Failed to build archive: {}", e)))?;
            zip.write_all(&data)?;
        }

        zip.start_file(MANIFEST_NAME, options)
            .map_err(|e| AppError::Internal(format!("Failed to build archive: {}", e)))?;
        zip.write_all(manifest.as_bytes())?;

        zip.finish()
            .map_err(|e| AppError::Internal(format!("Failed to finalize archive: {}", e)))?;
    }

    Ok(buffer)
}

/// Summarizing manifest written into the archive alongside the images
fn session_manifest(session: &Session) -> Result<String> {
    let manifest = json!({
        "sessionId": session.session_id,
        "originalFile": session.original_file.filename,
        "userInput": session.user_input,
        "generatedAt": session.generated_at,
        "thumbnailCount": session.thumbnails.len(),
        "thumbnails": session
            .thumbnails
            .iter()
            .map(|t| {
                json!({
                    "id": t.id,
                    "format": t.format,
                    "dimensions": t.dimensions,
                    "filename": t.filename,
                })
            })
            .collect::<Vec<_>>(),
    });

    Ok(serde_json::to_string_pretty(&manifest)?)
}
