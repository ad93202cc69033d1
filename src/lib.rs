//! AI Thumbnail Generation Service
//!
//! A web service that turns an uploaded photo and a short questionnaire
//! into AI-generated YouTube thumbnails, served over an HTTP API with
//! filesystem-backed blob and session storage.

pub mod api;
pub mod archive;
pub mod client;
pub mod config;
pub mod error;
pub mod store;

pub use error::{AppError, Result};

use std::sync::Arc;

use client::traits::{PromptEnhancer, ThumbnailGenerator};
use config::Settings;
use store::blob::BlobStore;
use store::session::SessionStore;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,
    pub blobs: Arc<BlobStore>,
    pub sessions: Arc<SessionStore>,
    pub enhancer: Arc<dyn PromptEnhancer>,
    pub generator: Arc<dyn ThumbnailGenerator>,
}
