//! Prompt enhancement client backed by an OpenAI-compatible chat API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::traits::{GenerationInput, PromptArtifact, PromptEnhancer};
use crate::config::OpenAiConfig;
use crate::error::{AppError, Result};

const ENHANCE_SYSTEM_PROMPT: &str = "You are an expert YouTube thumbnail designer and \
prompt engineer. Convert the user's answers into a detailed AI image generation prompt. \
Respond with a JSON object of the shape {\"enhancedPrompt\": ..., \"styleGuide\": ..., \
\"colorPalette\": ..., \"composition\": ...} and nothing else.";

const ANALYZE_SYSTEM_PROMPT: &str = "You are an expert YouTube thumbnail analyst. \
Review the thumbnail at the given URL and give feedback on visual appeal, clarity, \
and click-through potential.";

/// Client for the text-completion provider
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
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
}

impl OpenAiClient {
    /// Create a new client from configuration
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Single chat-completion call, returning the first choice's content
    async fn chat(&self, system: &str, user: String, temperature: f32, max_tokens: u32) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::MissingCredential("OpenAI"))?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, url = %url, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                "Prompt enhancement failed",
                format!("provider returned {}: {}", status, body),
            ));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            AppError::upstream("Prompt enhancement failed", format!("malformed response: {}", e))
        })?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                AppError::upstream("Prompt enhancement failed", "empty completion".to_string())
            })
    }
}

/// Strip a Markdown code fence wrapping a JSON completion
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[async_trait]
impl PromptEnhancer for OpenAiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn enhance(&self, input: &GenerationInput) -> Result<PromptArtifact> {
        let user = format!(
            "Create an enhanced AI image generation prompt for a YouTube thumbnail.\n\
             Video Type: {}\nStyle: {}\nMood: {}\nPhoto Placement: {}",
            input.video_type, input.style, input.mood, input.photo_placement
        );

        let content = self.chat(ENHANCE_SYSTEM_PROMPT, user, 0.7, 1000).await?;

        match serde_json::from_str::<PromptArtifact>(strip_code_fence(&content)) {
            Ok(artifact) => Ok(artifact),
            Err(e) => {
                warn!(error = %e, "Enhancement response was not structured JSON, synthesizing artifact");
                Ok(PromptArtifact::fallback(&content, input))
            }
        }
    }

    async fn variations(&self, base_prompt: &str, count: usize) -> Result<Vec<String>> {
        let system = format!(
            "You create variations of AI image generation prompts. Produce {} distinct \
             variations of the given prompt and respond with a JSON array of strings.",
            count
        );
        let user = format!("Create {} variations of this prompt: {}", count, base_prompt);

        let content = self.chat(&system, user, 0.8, 1500).await?;

        let variations = match serde_json::from_str::<Vec<String>>(strip_code_fence(&content)) {
            Ok(list) => list,
            Err(_) => {
                // Unstructured reply: take non-empty lines as variations
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from)
                    .collect()
            }
        };

        Ok(variations.into_iter().take(count).collect())
    }

    async fn analyze(&self, image_url: &str) -> Result<String> {
        if !self.is_configured() {
            return Err(AppError::MissingCredential("OpenAI"));
        }

        let user = format!(
            "Analyze this YouTube thumbnail: {}. Cover visual appeal, clarity and \
             readability, click-through potential, and areas for improvement.",
            image_url
        );

        // Read-only call, so one bounded retry; generation calls never retry.
        match self
            .chat(ANALYZE_SYSTEM_PROMPT, user.clone(), 0.3, 500)
            .await
        {
            Ok(analysis) => Ok(analysis),
            Err(first) => {
                warn!(error = %first, "Analysis call failed, retrying once");
                self.chat(ANALYZE_SYSTEM_PROMPT, user, 0.3, 500).await
            }
        }
    }
}
