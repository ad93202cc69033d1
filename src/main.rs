//! Main entry point for the thumbnail generation service

use std::sync::Arc;

use thumbsmith::{
    api,
    client::{openai::OpenAiClient, openrouter::OpenRouterClient},
    config::Settings,
    store::{blob::BlobStore, session::SessionStore},
    AppState,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.logging.format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("Starting thumbnail generation service");

    // Initialize storage
    let blobs = Arc::new(BlobStore::new(&settings.storage.upload_dir));
    blobs.ensure_dir().await?;
    let sessions = Arc::new(SessionStore::new(&settings.storage.upload_dir));
    info!(dir = %settings.storage.upload_dir, "Blob directory ready");

    // Construct provider clients; credentials are checked per request
    let enhancer = Arc::new(OpenAiClient::new(&settings.openai)?);
    let generator = Arc::new(OpenRouterClient::new(&settings.openrouter, blobs.clone())?);

    // Create application state
    let state = Arc::new(AppState {
        settings: settings.clone(),
        blobs,
        sessions,
        enhancer,
        generator,
    });

    // Build the router
    let app = api::routes::create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
