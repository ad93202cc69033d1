//! Image generation client backed by OpenRouter's multimodal chat API
//!
//! The configured model answers a chat completion with the generated image
//! either inline as a data URL or as a fetchable URL; either way the bytes
//! are persisted to the blob store before the call returns.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::client::base64;
use crate::client::traits::{GeneratedImage, OutputFormat, ThumbnailGenerator};
use crate::config::OpenRouterConfig;
use crate::error::{AppError, Result};
use crate::store::blob::BlobStore;

/// Client for the image-generation provider
pub struct OpenRouterClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    referer: String,
    app_title: String,
    blobs: Arc<BlobStore>,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize, Deserialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    images: Vec<MessageImage>,
}

#[derive(Debug, Deserialize)]
struct MessageImage {
    image_url: ImageUrl,
}

impl OpenRouterClient {
    /// Create a new client from configuration
    pub fn new(config: &OpenRouterConfig, blobs: Arc<BlobStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            referer: config.referer.clone(),
            app_title: config.app_title.clone(),
            blobs,
        })
    }

    /// Run one generation call and persist the resulting image under
    /// `<new-id>_<tag>.png`
    async fn generate_image(
        &self,
        generation_prompt: String,
        source_image: &Path,
        tag: &str,
    ) -> Result<GeneratedImage> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::MissingCredential("OpenRouter"))?;

        let source_bytes = fs::read(source_image).await?;
        let source_data_url = base64::create_data_url(&source_bytes, mime_for_path(source_image));

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: generation_prompt.clone(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: source_data_url,
                        },
                    },
                ],
            }],
            max_tokens: 1024,
            temperature: 0.3,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, tag = %tag, "Sending image generation request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.app_title)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                "Failed to generate image",
                format!("provider returned {}: {}", status, body),
            ));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            AppError::upstream("Failed to generate image", format!("malformed response: {}", e))
        })?;

        let payload = extract_image_payload(chat).ok_or_else(|| {
            AppError::upstream("Failed to generate image", "no image in response".to_string())
        })?;

        let image_bytes = self.fetch_payload(&payload).await?;

        let id = Uuid::new_v4();
        let filename = self.blobs.save_image(id, tag, &image_bytes).await?;
        debug!(filename = %filename, "Persisted generated image");

        Ok(GeneratedImage { id, filename })
    }

    /// Turn an image payload (data URL or fetchable URL) into bytes
    async fn fetch_payload(&self, payload: &str) -> Result<Vec<u8>> {
        if base64::is_data_url(payload) {
            return base64::decode(payload);
        }

        if payload.starts_with("http://") || payload.starts_with("https://") {
            let response = self.client.get(payload).send().await?;
            if !response.status().is_success() {
                return Err(AppError::upstream(
                    "Failed to generate image",
                    format!("image download returned {}", response.status()),
                ));
            }
            return Ok(response.bytes().await?.to_vec());
        }

        Err(AppError::upstream(
            "Failed to generate image",
            "unrecognized image payload in response".to_string(),
        ))
    }
}

/// Pull the image payload out of a chat response: an inline image
/// attachment when present, otherwise a URL-bearing text content.
fn extract_image_payload(chat: ChatResponse) -> Option<String> {
    let message = chat.choices.into_iter().next()?.message;

    if let Some(image) = message.images.into_iter().next() {
        return Some(image.image_url.url);
    }

    message
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn mime_for_path(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/png",
    }
}

#[async_trait]
impl ThumbnailGenerator for OpenRouterClient {
    async fn generate(
        &self,
        prompt: &str,
        source_image: &Path,
        format: OutputFormat,
    ) -> Result<GeneratedImage> {
        let generation_prompt = format!(
            "YouTube thumbnail: {}. {} format.",
            prompt,
            format.aspect_label()
        );

        self.generate_image(generation_prompt, source_image, format.tag())
            .await
    }

    async fn edit(&self, source_image: &Path, edit_prompt: &str) -> Result<GeneratedImage> {
        let generation_prompt = format!(
            "Edit this YouTube thumbnail, keeping the composition: {}.",
            edit_prompt
        );

        self.generate_image(generation_prompt, source_image, "edited")
            .await
    }
}
