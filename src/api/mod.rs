//! HTTP surface: routing and request handlers

pub mod download;
pub mod generate;
pub mod routes;
pub mod upload;

use axum::http::{header, HeaderMap};

use crate::config::Settings;

/// Relative public URL for a stored filename
pub(crate) fn public_url(settings: &Settings, filename: &str) -> String {
    format!(
        "{}/{}",
        settings.storage.public_prefix.trim_end_matches('/'),
        filename
    )
}

/// Absolute base URL: the configured override when present, otherwise
/// derived from the request's Host header.
pub(crate) fn base_url(settings: &Settings, headers: &HeaderMap) -> String {
    if let Some(base) = &settings.server.public_base_url {
        return base.trim_end_matches('/').to_string();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{}", host)
}

/// Absolute public URL for a stored filename
pub(crate) fn absolute_url(settings: &Settings, headers: &HeaderMap, filename: &str) -> String {
    format!(
        "{}{}",
        base_url(settings, headers),
        public_url(settings, filename)
    )
}
