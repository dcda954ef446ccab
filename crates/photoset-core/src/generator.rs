//! Batch generation: describe uploaded images and collect a training dataset.
//!
//! Files are processed strictly one at a time. A missing file or a failed
//! upstream call is recorded against that file and the batch moves on; only
//! failing to write the finished dataset aborts a run.

use crate::config::Config;
use crate::error::Result;
use crate::llm::{ImageInput, VisionProvider, VisionProviderFactory};
use crate::record::TrainingRecord;
use crate::storage::{OutputStore, UploadStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Parameters for one generation run.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Vision API URL; also decides the dialect
    pub endpoint: String,
    pub api_key: Option<String>,
    pub system_prompt: String,
    pub temperature: f32,
    /// Saved names, processed in this order
    pub target_files: Vec<String>,
    /// Saved name → original name, used for the record's `images` entry
    pub name_mapping: HashMap<String, String>,
}

impl GenerationRequest {
    /// Display name for a stored file, falling back to the saved name.
    pub fn display_name<'a>(&'a self, saved_name: &'a str) -> &'a str {
        self.name_mapping
            .get(saved_name)
            .map(String::as_str)
            .unwrap_or(saved_name)
    }
}

/// Outcome for one requested file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome {
    Success { file: String, description: String },
    Failed { file: String, error: String },
}

impl FileOutcome {
    pub fn file(&self) -> &str {
        match self {
            Self::Success { file, .. } | Self::Failed { file, .. } => file,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Summary of a generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: usize,
    pub failed: usize,
    pub details: Vec<FileOutcome>,
    /// Dataset file name; absent when nothing succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

impl GenerationResult {
    fn push(&mut self, outcome: FileOutcome) {
        if outcome.is_success() {
            self.success += 1;
        } else {
            self.failed += 1;
        }
        self.details.push(outcome);
    }
}

/// Error text recorded for files absent from the upload store.
pub const FILE_NOT_FOUND: &str = "file not found";

/// Runs generation batches against the upload and output stores.
pub struct Generator {
    uploads: UploadStore,
    outputs: OutputStore,
    config: Config,
}

impl Generator {
    pub fn new(uploads: UploadStore, outputs: OutputStore, config: Config) -> Self {
        Self {
            uploads,
            outputs,
            config,
        }
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    pub fn outputs(&self) -> &OutputStore {
        &self.outputs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Provider for a request: the demo provider in demo mode, otherwise
    /// whichever dialect the endpoint selects.
    pub fn provider_for(&self, request: &GenerationRequest) -> Box<dyn VisionProvider> {
        if self.config.demo.enabled {
            VisionProviderFactory::demo(&self.config.demo)
        } else {
            VisionProviderFactory::create(
                &request.endpoint,
                request.api_key.as_deref(),
                &self.config.llm,
            )
        }
    }

    /// Run a batch with the provider selected from configuration.
    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let provider = self.provider_for(request);
        self.run_with(provider.as_ref(), request).await
    }

    /// Run a batch with an explicit provider.
    pub async fn run_with(
        &self,
        provider: &dyn VisionProvider,
        request: &GenerationRequest,
    ) -> Result<GenerationResult> {
        let start = Instant::now();
        let key_state = if request.api_key.is_some() {
            "provided"
        } else {
            "none"
        };
        tracing::info!(
            provider = provider.name(),
            files = request.target_files.len(),
            api_key = key_state,
            "Starting generation batch"
        );

        let mut result = GenerationResult::default();
        let mut records = Vec::new();

        for saved_name in &request.target_files {
            let outcome = match self.describe_one(provider, request, saved_name).await {
                Ok(description) => {
                    let record = TrainingRecord::with_instruction(
                        &self.config.dataset.instruction,
                        request.display_name(saved_name),
                        &description,
                    );
                    records.push(record);
                    tracing::info!("Described {saved_name}");
                    FileOutcome::Success {
                        file: saved_name.clone(),
                        description,
                    }
                }
                Err(error) => {
                    tracing::warn!("Failed: {saved_name} - {error}");
                    FileOutcome::Failed {
                        file: saved_name.clone(),
                        error,
                    }
                }
            };
            result.push(outcome);
        }

        if records.is_empty() {
            tracing::warn!("No records generated ({} failed)", result.failed);
        } else {
            let name = self
                .outputs
                .write_dataset(self.config.file_prefix(), &records)
                .await?;
            result.output_file = Some(name);
        }

        tracing::info!(
            success = result.success,
            failed = result.failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generation batch finished"
        );
        Ok(result)
    }

    /// Describe one stored file; errors are rendered for the detail list.
    async fn describe_one(
        &self,
        provider: &dyn VisionProvider,
        request: &GenerationRequest,
        saved_name: &str,
    ) -> std::result::Result<String, String> {
        let path = self
            .uploads
            .resolve(saved_name)
            .ok_or_else(|| FILE_NOT_FOUND.to_string())?;

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| format!("Failed to read image: {e}"))?;

        provider
            .describe(
                &ImageInput::jpeg(&bytes),
                &request.system_prompt,
                request.temperature,
            )
            .await
            .map_err(|e| e.to_string())
    }
}
