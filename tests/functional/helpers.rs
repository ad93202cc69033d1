//! Shared fixtures: fake provider clients and an in-process app

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use thumbsmith::client::traits::{
    GeneratedImage, GenerationInput, OutputFormat, PromptArtifact, PromptEnhancer,
    ThumbnailGenerator,
};
use thumbsmith::config::Settings;
use thumbsmith::error::{AppError, Result as AppResult};
use thumbsmith::store::blob::BlobStore;
use thumbsmith::store::session::SessionStore;
use thumbsmith::{api, AppState};

/// Minimal PNG header, plenty for a service that never decodes pixels
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
];

pub struct FakeEnhancer {
    pub configured: bool,
}

#[async_trait]
impl PromptEnhancer for FakeEnhancer {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn enhance(&self, input: &GenerationInput) -> AppResult<PromptArtifact> {
        Ok(PromptArtifact {
            enhanced_prompt: format!("enhanced {} thumbnail", input.video_type),
            style_guide: format!("Style: {}", input.style),
            color_palette: "vivid".to_string(),
            composition: format!("Photo placement: {}", input.photo_placement),
        })
    }

    async fn variations(&self, base_prompt: &str, count: usize) -> AppResult<Vec<String>> {
        Ok((1..=count)
            .map(|i| format!("{} (variation {})", base_prompt, i))
            .collect())
    }

    async fn analyze(&self, image_url: &str) -> AppResult<String> {
        Ok(format!("Strong composition at {}", image_url))
    }
}

/// Generator fake that persists real files through the blob store, and can
/// be told to start failing after a number of successful calls.
pub struct FakeGenerator {
    blobs: Arc<BlobStore>,
    fail_after: Option<usize>,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn new(blobs: Arc<BlobStore>) -> Self {
        Self {
            blobs,
            fail_after: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_after(blobs: Arc<BlobStore>, successes: usize) -> Self {
        Self {
            blobs,
            fail_after: Some(successes),
            calls: AtomicUsize::new(0),
        }
    }

    async fn produce(&self, tag: &str) -> AppResult<GeneratedImage> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.fail_after {
            if call >= limit {
                return Err(AppError::upstream(
                    "Failed to generate image",
                    "provider rejected the request".to_string(),
                ));
            }
        }

        let id = Uuid::new_v4();
        let filename = self.blobs.save_image(id, tag, PNG_BYTES).await?;
        Ok(GeneratedImage { id, filename })
    }
}

#[async_trait]
impl ThumbnailGenerator for FakeGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _source_image: &Path,
        format: OutputFormat,
    ) -> AppResult<GeneratedImage> {
        self.produce(format.tag()).await
    }

    async fn edit(&self, _source_image: &Path, _edit_prompt: &str) -> AppResult<GeneratedImage> {
        self.produce("edited").await
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    _tmp: TempDir,
}

pub fn test_app() -> TestApp {
    test_app_with(|_| {}, false, None)
}

pub fn test_app_with(
    configure: impl FnOnce(&mut Settings),
    enhancer_configured: bool,
    generator_fails_after: Option<usize>,
) -> TestApp {
    let tmp = TempDir::new().expect("temp dir");

    let mut settings = Settings::default();
    settings.storage.upload_dir = tmp.path().to_string_lossy().to_string();
    configure(&mut settings);

    let blobs = Arc::new(BlobStore::new(tmp.path()));
    let sessions = Arc::new(SessionStore::new(tmp.path()));

    let generator = match generator_fails_after {
        Some(successes) => FakeGenerator::failing_after(blobs.clone(), successes),
        None => FakeGenerator::new(blobs.clone()),
    };

    let state = Arc::new(AppState {
        settings,
        blobs,
        sessions,
        enhancer: Arc::new(FakeEnhancer {
            configured: enhancer_configured,
        }),
        generator: Arc::new(generator),
    });

    TestApp {
        router: api::routes::create_router(state.clone()),
        state,
        _tmp: tmp,
    }
}

/// Write an upload straight into the blob store, returning its identifier
pub async fn seed_upload(state: &AppState) -> String {
    let id = Uuid::new_v4();
    state
        .blobs
        .save_upload(id, "png", PNG_BYTES)
        .await
        .expect("seed upload");
    id.to_string()
}

pub fn multipart_request(
    uri: &str,
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Request<Body> {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            field, filename, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .expect("multipart request")
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("json request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("get request")
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn response_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body")
        .to_vec()
}
