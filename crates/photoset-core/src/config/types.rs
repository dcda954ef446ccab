//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Origins allowed by CORS ("*" allows any origin, without credentials)
    pub cors_origins: Vec<String>,

    /// Maximum request body size for uploads, in megabytes
    pub max_upload_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            max_upload_mb: 50,
        }
    }
}

/// Where uploaded images and generated datasets live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for uploaded originals (stored under random names)
    pub upload_dir: PathBuf,

    /// Directory for generated `.jsonl` datasets
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
        }
    }
}

/// Vision API settings shared by both dialects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Token cap sent to OpenAI-compatible endpoints
    pub max_tokens: u32,

    /// User-turn instruction sent alongside every image
    pub user_prompt: String,

    /// Model requested from DashScope endpoints
    pub dashscope_model: String,

    /// Model requested from OpenAI-compatible endpoints
    pub openai_model: String,

    /// Endpoint substrings (case-insensitive) that select the DashScope dialect
    pub dialect_markers: Vec<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            max_tokens: 500,
            user_prompt: "请描述这张图片的内容".to_string(),
            dashscope_model: "qwen3-vl-plus".to_string(),
            openai_model: "gpt-4-vision-preview".to_string(),
            dialect_markers: vec!["dashscope".to_string(), "qwen".to_string()],
        }
    }
}

/// Shape of the generated training records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// User-turn content written into every record
    pub instruction: String,

    /// Dataset file name prefix (`<prefix>_<YYYYMMDD_HHMMSS>.jsonl`)
    pub file_prefix: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            instruction: crate::record::DEFAULT_INSTRUCTION.to_string(),
            file_prefix: "train".to_string(),
        }
    }
}

/// Offline demo mode: canned descriptions instead of network calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Replace the vision API with the demo provider
    pub enabled: bool,

    /// Simulated per-image latency in milliseconds
    pub delay_ms: u64,

    /// Dataset file name prefix used while in demo mode
    pub file_prefix: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_ms: 500,
            file_prefix: "train_demo".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
