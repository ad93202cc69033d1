//! Questionnaire types and the seams to the external AI providers

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Target thumbnail format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Horizontal,
    Vertical,
}

impl OutputFormat {
    /// Pixel dimensions for the format
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Horizontal => (1280, 720),
            Self::Vertical => (1080, 1920),
        }
    }

    /// Aspect-ratio wording used in generation prompts
    pub fn aspect_label(&self) -> &'static str {
        match self {
            Self::Horizontal => "16:9",
            Self::Vertical => "9:16",
        }
    }

    /// Filename tag for generated images
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            other => Err(AppError::Validation(format!(
                "Unsupported format '{}'. Must be 'horizontal' or 'vertical'",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Where the user's photo sits in the composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoPlacement {
    Left,
    Right,
    Center,
    Background,
}

impl PhotoPlacement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
            Self::Background => "background",
        }
    }
}

impl FromStr for PhotoPlacement {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "center" => Ok(Self::Center),
            "background" => Ok(Self::Background),
            other => Err(AppError::Validation(format!(
                "Unsupported photo placement '{}'. Must be 'left', 'right', 'center' or 'background'",
                other
            ))),
        }
    }
}

impl fmt::Display for PhotoPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Questionnaire answers captured in the session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationInput {
    pub video_type: String,
    pub style: String,
    pub mood: String,
    pub photo_placement: PhotoPlacement,
    pub formats: Vec<OutputFormat>,
    pub generate_count: u32,
}

impl GenerationInput {
    /// Prompt used when no enhancement artifact is available
    pub fn base_prompt(&self) -> String {
        format!(
            "{} video thumbnail, {} style, {} mood, subject {}",
            self.video_type, self.style, self.mood, self.photo_placement
        )
    }
}

/// Structured prompt artifact produced by the enhancement model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptArtifact {
    pub enhanced_prompt: String,
    pub style_guide: String,
    pub color_palette: String,
    pub composition: String,
}

impl PromptArtifact {
    /// Artifact synthesized directly from the questionnaire, used when the
    /// upstream response is not well-formed JSON.
    pub fn fallback(raw_completion: &str, input: &GenerationInput) -> Self {
        Self {
            enhanced_prompt: raw_completion.trim().to_string(),
            style_guide: format!("Style: {}, Mood: {}", input.style, input.mood),
            color_palette: "Professional YouTube thumbnail colors".to_string(),
            composition: format!("Photo placement: {}", input.photo_placement),
        }
    }
}

/// One generated image, already persisted in the blob store
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub id: Uuid,
    pub filename: String,
}

/// Seam to the text-completion provider used for prompt work
#[async_trait]
pub trait PromptEnhancer: Send + Sync {
    /// Whether a credential is present; enhancement is skipped otherwise
    fn is_configured(&self) -> bool;

    /// Turn questionnaire answers into a structured generation prompt
    async fn enhance(&self, input: &GenerationInput) -> Result<PromptArtifact>;

    /// Produce up to `count` prompt variations of a base prompt
    async fn variations(&self, base_prompt: &str, count: usize) -> Result<Vec<String>>;

    /// Critique a thumbnail reachable at `image_url`
    async fn analyze(&self, image_url: &str) -> Result<String>;
}

/// Seam to the image-generation provider
#[async_trait]
pub trait ThumbnailGenerator: Send + Sync {
    /// Generate one thumbnail from a prompt and the uploaded source image,
    /// persisting the result and returning its identifier and filename.
    async fn generate(
        &self,
        prompt: &str,
        source_image: &Path,
        format: OutputFormat,
    ) -> Result<GeneratedImage>;

    /// Rework an existing thumbnail according to an edit instruction
    async fn edit(&self, source_image: &Path, edit_prompt: &str) -> Result<GeneratedImage>;
}
