//! Flat-file stores for uploaded images and generated datasets.
//!
//! Both stores are a single directory passed in at construction. Uploads are
//! renamed to random UUIDs (keeping a plain extension); datasets are named by
//! generation timestamp. Names accepted from callers must be plain file names.

use crate::error::{StoreError, StoreResult};
use crate::output::JsonlWriter;
use crate::record::TrainingRecord;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::AsyncWriteExt;

/// An image accepted by the upload store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    /// Name the client uploaded the file under
    pub original_name: String,
    /// UUID-derived name on disk
    pub saved_name: String,
    /// Size in bytes
    pub size: u64,
}

/// An upload received from a client, not yet validated or written.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A generated dataset file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFileInfo {
    pub name: String,
    pub size: u64,
    /// Local ISO-8601 timestamp
    pub created_at: String,
}

/// Reject anything that is not a bare file name.
pub fn validate_file_name(name: &str) -> StoreResult<&str> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if plain {
        Ok(name)
    } else {
        Err(StoreError::InvalidInput(format!("invalid file name: {name:?}")))
    }
}

/// Timestamped dataset name, e.g. `train_20250301_140509.jsonl`.
pub fn dataset_file_name(prefix: &str, at: NaiveDateTime) -> String {
    format!("{prefix}_{}.jsonl", at.format("%Y%m%d_%H%M%S"))
}

async fn ensure_dir(dir: &Path) -> StoreResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

/// Suffixed names tried before giving up on a dataset write.
const MAX_NAME_ATTEMPTS: usize = 100;

/// Directory of uploaded originals.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the store, making the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self::new(dir);
        ensure_dir(&store.dir).await?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check that an upload declares an image content type.
    pub fn check_image(file_name: &str, content_type: Option<&str>) -> StoreResult<()> {
        match content_type {
            Some(ct) if ct.starts_with("image/") => Ok(()),
            _ => Err(StoreError::InvalidInput(format!(
                "file {file_name} is not an image"
            ))),
        }
    }

    /// Random storage name keeping the original extension when it is plain
    /// ASCII alphanumeric.
    pub fn saved_name_for(original_name: &str) -> String {
        let id = uuid::Uuid::new_v4();
        match Path::new(original_name).extension().and_then(|e| e.to_str()) {
            Some(ext) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
                format!("{id}.{ext}")
            }
            _ => id.to_string(),
        }
    }

    /// Validate and persist a batch of uploads.
    ///
    /// Every upload is checked before anything is written, so a rejected
    /// batch leaves no files behind.
    pub async fn save_all(&self, uploads: Vec<PendingUpload>) -> StoreResult<Vec<UploadedImage>> {
        for upload in &uploads {
            Self::check_image(&upload.file_name, upload.content_type.as_deref())?;
        }

        let mut saved = Vec::with_capacity(uploads.len());
        for upload in uploads {
            saved.push(self.write(&upload.file_name, &upload.bytes).await?);
        }
        Ok(saved)
    }

    /// Validate and persist a single upload.
    pub async fn save(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> StoreResult<UploadedImage> {
        Self::check_image(file_name, content_type)?;
        self.write(file_name, bytes).await
    }

    async fn write(&self, original_name: &str, bytes: &[u8]) -> StoreResult<UploadedImage> {
        ensure_dir(&self.dir).await?;
        let saved_name = Self::saved_name_for(original_name);
        let path = self.dir.join(&saved_name);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        tracing::debug!("Stored upload {original_name:?} as {saved_name}");
        Ok(UploadedImage {
            original_name: original_name.to_string(),
            saved_name,
            size: bytes.len() as u64,
        })
    }

    /// Path of a stored upload, if the name is plain and the file exists.
    pub fn resolve(&self, saved_name: &str) -> Option<PathBuf> {
        let name = validate_file_name(saved_name).ok()?;
        let path = self.dir.join(name);
        path.is_file().then_some(path)
    }

    /// Remove a stored upload.
    pub async fn delete(&self, saved_name: &str) -> StoreResult<()> {
        let name = validate_file_name(saved_name)?;
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        tokio::fs::remove_file(&path).await?;
        tracing::info!("Deleted upload {name}");
        Ok(())
    }
}

/// Directory of generated `.jsonl` datasets.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the store, making the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self::new(dir);
        ensure_dir(&store.dir).await?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write records to a new timestamped dataset and return its name.
    ///
    /// A name already taken within the same second gets a numeric suffix
    /// (`train_20250301_140509_1.jsonl`); existing datasets are never replaced.
    pub async fn write_dataset(
        &self,
        prefix: &str,
        records: &[TrainingRecord],
    ) -> StoreResult<String> {
        let base = dataset_file_name(prefix, Local::now().naive_local());
        let stem = base.trim_end_matches(".jsonl");
        let mut name = base.clone();
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            match self.write_named(&name, records).await {
                Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    tracing::debug!("Dataset {name} exists, trying another name");
                    name = format!("{stem}_{attempt}.jsonl");
                }
                other => return other.map(|()| name),
            }
        }
        Err(StoreError::InvalidInput(format!(
            "no free dataset name for {base}"
        )))
    }

    /// Write records as JSONL under an explicit name.
    ///
    /// Fails with an `AlreadyExists` IO error if the file is present.
    pub async fn write_named(&self, name: &str, records: &[TrainingRecord]) -> StoreResult<()> {
        let name = validate_file_name(name)?;
        ensure_dir(&self.dir).await?;

        let mut writer = JsonlWriter::new(Vec::new());
        writer.write_all(records)?;
        let count = writer.items_written();
        let buf = writer.into_inner();

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.dir.join(name))
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;
        tracing::info!("Wrote {count} records to {name}");
        Ok(())
    }

    /// Dataset files, newest first.
    ///
    /// Ordered by creation time where the filesystem reports it, otherwise by
    /// modification time; ties fall back to name, descending.
    pub async fn list(&self) -> StoreResult<Vec<OutputFileInfo>> {
        let mut entries = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let created = meta
                .created()
                .or_else(|_| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((created, entry.file_name().to_string_lossy().into_owned(), meta.len()));
        }

        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        Ok(entries
            .into_iter()
            .map(|(created, name, size)| OutputFileInfo {
                name,
                size,
                created_at: DateTime::<Local>::from(created)
                    .format("%Y-%m-%dT%H:%M:%S%.6f")
                    .to_string(),
            })
            .collect())
    }

    /// Path of an existing dataset file.
    pub fn resolve(&self, name: &str) -> StoreResult<PathBuf> {
        let name = validate_file_name(name)?;
        let path = self.dir.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(StoreError::NotFound(name.to_string()))
        }
    }
}
