//! Route handlers.

use super::error::ApiError;
use super::form;
use super::AppState;
use axum::body::Body;
use axum::extract::{Multipart, Path, Request, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use photoset_core::{GenerationResult, OutputFileInfo, PendingUpload, UploadedImage};
use serde::Serialize;
use tokio_util::io::ReaderStream;

/// Multipart field carrying image files.
const UPLOAD_FIELD: &str = "files";

#[derive(Serialize)]
pub struct Status {
    pub status: &'static str,
    pub message: &'static str,
    pub mode: &'static str,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub files: Vec<UploadedImage>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct OutputsResponse {
    pub files: Vec<OutputFileInfo>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// `GET /` — liveness.
pub async fn root(State(state): State<AppState>) -> Json<Status> {
    let demo = state.config().demo.enabled;
    Json(Status {
        status: "ok",
        message: if demo {
            "Photoset dataset API is running (demo mode)"
        } else {
            "Photoset dataset API is running"
        },
        mode: if demo { "demo" } else { "live" },
    })
}

/// `POST /api/upload` — store one or more images.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut pending = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(String::from);
        let bytes = field.bytes().await?;
        pending.push(PendingUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    if pending.is_empty() {
        return Err(ApiError::bad_request(format!(
            "no files in multipart field '{UPLOAD_FIELD}'"
        )));
    }

    let files = state.uploads().save_all(pending).await?;
    tracing::info!("Uploaded {} file(s)", files.len());
    Ok(Json(UploadResponse {
        success: true,
        count: files.len(),
        files,
    }))
}

/// `POST /api/generate` — describe uploaded images and write a dataset.
pub async fn generate(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<GenerationResult>, ApiError> {
    let fields = form::read_fields(request).await?;
    let generation = form::parse_generate(fields)?;
    let result = state.generator().run(&generation).await?;
    Ok(Json(result))
}

/// `GET /api/outputs` — generated datasets, newest first.
pub async fn list_outputs(State(state): State<AppState>) -> Result<Json<OutputsResponse>, ApiError> {
    let files = state.outputs().list().await?;
    Ok(Json(OutputsResponse { files }))
}

/// `GET /api/download/:filename` — stream a dataset file.
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let path = state.outputs().resolve(&filename)?;
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', "_"));
    let headers = [
        (header::CONTENT_TYPE, "application/json".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// `DELETE /api/uploads/:filename` — remove an uploaded image.
pub async fn delete_upload(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.uploads().delete(&filename).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: format!("file {filename} deleted"),
    }))
}
