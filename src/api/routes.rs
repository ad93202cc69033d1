//! Router assembly for the HTTP surface

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::{download, generate, upload};
use crate::AppState;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let settings = &state.settings;

    let origins: Vec<HeaderValue> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let upload_routes = Router::new()
        .route("/", post(upload::upload_image))
        .route(
            "/:file_id",
            get(upload::file_info).delete(upload::delete_file),
        );

    let generate_routes = Router::new()
        .route("/", post(generate::create_session))
        .route("/regenerate", post(generate::regenerate))
        .route("/edit/:thumbnail_id", post(generate::edit_thumbnail))
        .route("/session/:session_id", get(generate::get_session))
        .route("/analyze/:thumbnail_id", post(generate::analyze_thumbnail));

    let download_routes = Router::new()
        .route("/:thumbnail_id", get(download::download_thumbnail))
        .route("/all/:session_id", get(download::download_all))
        .route("/info/:thumbnail_id", get(download::thumbnail_info))
        .route("/copy/:thumbnail_id", get(download::copy_url))
        .route("/share/:thumbnail_id", post(download::share_thumbnail));

    // Multipart framing overhead rides on top of the file ceiling
    let body_limit = settings.storage.max_upload_bytes + 1024 * 1024;

    Router::new()
        .nest("/api/upload", upload_routes)
        .nest("/api/generate", generate_routes)
        .nest("/api/download", download_routes)
        .route("/api/health", get(health))
        .nest_service(
            settings.storage.public_prefix.as_str(),
            ServeDir::new(&settings.storage.upload_dir),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness payload
async fn health() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "AI Thumbnail Generator API is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
