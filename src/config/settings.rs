//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Absolute base URL advertised in copy/share responses. When unset,
    /// the request's Host header is used instead.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    #[serde(default = "default_cors_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

/// Blob storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

fn default_public_prefix() -> String {
    "/uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

/// Prompt enhancement provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_timeout")]
    pub timeout_ms: u64,
}

fn default_openai_model() -> String {
    "gpt-4".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_timeout() -> u64 {
    30000
}

/// Image generation provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenRouterConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,
    #[serde(default = "default_openrouter_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_app_title")]
    pub app_title: String,
}

fn default_image_model() -> String {
    "google/gemini-2.5-flash-image-preview".to_string()
}

fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_openrouter_timeout() -> u64 {
    60000
}

fn default_referer() -> String {
    "http://localhost:3000".to_string()
}

fn default_app_title() -> String {
    "Thumbsmith".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("storage.upload_dir", "./uploads")?
            .set_default("storage.max_upload_bytes", 5 * 1024 * 1024)?
            // Load from configuration file
            .add_source(
                File::with_name(path.as_ref().to_str().unwrap_or("config/default"))
                    .required(false),
            )
            // Override with environment variables (prefixed with THUMBSMITH__)
            .add_source(
                Environment::with_prefix("THUMBSMITH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;

        // Bare provider variables take precedence so a stock .env works
        // without the prefixed form.
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            settings.openai.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
            settings.openrouter.api_key = Some(key);
        }

        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Server port cannot be 0".to_string(),
            )));
        }

        if self.storage.upload_dir.is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "Upload directory cannot be empty".to_string(),
            )));
        }

        if self.storage.max_upload_bytes == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Maximum upload size cannot be 0".to_string(),
            )));
        }

        if !self.storage.public_prefix.starts_with('/') {
            return Err(AppError::Config(config::ConfigError::Message(format!(
                "Public prefix '{}' must start with '/'",
                self.storage.public_prefix
            ))));
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            cors: CorsConfig::default(),
            storage: StorageConfig::default(),
            openai: OpenAiConfig::default(),
            openrouter: OpenRouterConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: None,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_cors_origins(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            public_prefix: default_public_prefix(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            base_url: default_openai_base_url(),
            timeout_ms: default_openai_timeout(),
        }
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_image_model(),
            base_url: default_openrouter_base_url(),
            timeout_ms: default_openrouter_timeout(),
            referer: default_referer(),
            app_title: default_app_title(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
