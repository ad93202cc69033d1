//! Configuration loading and validation

pub mod settings;

pub use settings::{
    CorsConfig, LoggingConfig, OpenAiConfig, OpenRouterConfig, ServerConfig, Settings,
    StorageConfig,
};
