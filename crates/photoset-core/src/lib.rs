//! Photoset Core - multimodal fine-tuning dataset generation.
//!
//! Photoset takes uploaded images, asks a vision-capable language model to
//! describe each one, and writes the descriptions out as a JSON Lines
//! training dataset.
//!
//! # Architecture
//!
//! ```text
//! Upload → UploadStore → Generator → VisionProvider (DashScope | OpenAI | demo)
//!                                 ↘ TrainingRecord → OutputStore (.jsonl)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use photoset_core::{Config, GenerationRequest, Generator, OutputStore, UploadStore};
//!
//! #[tokio::main]
//! async fn main() -> photoset_core::Result<()> {
//!     let config = Config::load()?;
//!     let uploads = UploadStore::open(config.upload_dir()).await?;
//!     let outputs = OutputStore::open(config.output_dir()).await?;
//!     let generator = Generator::new(uploads, outputs, config);
//!
//!     let result = generator.run(&request).await?;
//!     println!("Dataset: {:?}", result.output_file);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
pub mod output;
pub mod record;
pub mod storage;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PhotosetError, Result, StoreError, StoreResult, UpstreamError};
pub use generator::{FileOutcome, GenerationRequest, GenerationResult, Generator};
pub use llm::{describe, Dialect, ImageInput, VisionProvider, VisionProviderFactory};
pub use output::JsonlWriter;
pub use record::TrainingRecord;
pub use storage::{OutputFileInfo, OutputStore, PendingUpload, UploadStore, UploadedImage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
