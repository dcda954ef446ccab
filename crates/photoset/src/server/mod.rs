//! HTTP surface for uploads, generation and dataset downloads.

mod error;
mod form;
mod routes;

pub use error::ApiError;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use photoset_core::{Config, Generator, OutputStore, UploadStore};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared handler state: the generator owns both stores and the config.
#[derive(Clone)]
pub struct AppState {
    generator: Arc<Generator>,
}

impl AppState {
    /// Open the configured directories and build the generator.
    pub async fn open(config: Config) -> photoset_core::Result<Self> {
        let uploads = UploadStore::open(config.upload_dir()).await?;
        let outputs = OutputStore::open(config.output_dir()).await?;
        tracing::info!(
            "Uploads in {}, datasets in {}",
            uploads.dir().display(),
            outputs.dir().display()
        );
        Ok(Self {
            generator: Arc::new(Generator::new(uploads, outputs, config)),
        })
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn config(&self) -> &Config {
        self.generator.config()
    }

    pub fn uploads(&self) -> &UploadStore {
        self.generator.uploads()
    }

    pub fn outputs(&self) -> &OutputStore {
        self.generator.outputs()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let server = &state.config().server;
    let body_limit = (server.max_upload_mb * 1024 * 1024) as usize;
    let cors = cors_layer(&server.cors_origins);

    Router::new()
        .route("/", get(routes::root))
        .route("/api/upload", post(routes::upload))
        .route("/api/generate", post(routes::generate))
        .route("/api/outputs", get(routes::list_outputs))
        .route("/api/download/:filename", get(routes::download))
        .route("/api/uploads/:filename", delete(routes::delete_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins.
///
/// A `*` entry opens the API to any origin; credentials are only allowed
/// with an explicit origin list.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {o}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let demo = config.demo.enabled;

    let state = AppState::open(config).await?;
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;

    if demo {
        tracing::warn!("Demo mode: descriptions are canned, no vision API is called");
    }
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::multipart::{Form, Part};
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    struct TestServer {
        _dir: TempDir,
        base: String,
        client: reqwest::Client,
        state: AppState,
    }

    impl TestServer {
        async fn start(demo: bool) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut config = Config::default();
            config.storage.upload_dir = dir.path().join("uploads");
            config.storage.output_dir = dir.path().join("outputs");
            config.demo.enabled = demo;
            config.demo.delay_ms = 0;
            config.llm.timeout_ms = 2_000;

            let state = AppState::open(config).await.unwrap();
            let app = router(state.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            Self {
                _dir: dir,
                base: format!("http://{addr}"),
                client: reqwest::Client::new(),
                state,
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        async fn upload(&self, name: &str, mime: &str) -> reqwest::Response {
            let part = Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
                .file_name(name.to_string())
                .mime_str(mime)
                .unwrap();
            self.client
                .post(self.url("/api/upload"))
                .multipart(Form::new().part("files", part))
                .send()
                .await
                .unwrap()
        }

        async fn upload_one(&self, name: &str) -> String {
            let body: Value = self.upload(name, "image/jpeg").await.json().await.unwrap();
            body["files"][0]["saved_name"].as_str().unwrap().to_string()
        }

        async fn generate(&self, endpoint: &str, files: Value, mapping: Option<&str>) -> reqwest::Response {
            let mut form = Form::new()
                .text("api_endpoint", endpoint.to_string())
                .text("system_prompt", "请详细描述")
                .text("temperature", "0.5")
                .text("file_names", files.to_string());
            if let Some(mapping) = mapping {
                form = form.text("file_mapping", mapping.to_string());
            }
            self.client
                .post(self.url("/api/generate"))
                .multipart(form)
                .send()
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_root_reports_mode() {
        let server = TestServer::start(true).await;
        let body: Value = reqwest::get(server.url("/")).await.unwrap().json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["mode"], "demo");
    }

    #[tokio::test]
    async fn test_upload_returns_saved_names() {
        let server = TestServer::start(true).await;
        let resp = server.upload("cat.png", "image/png").await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 1);
        assert_eq!(body["files"][0]["original_name"], "cat.png");
        assert_eq!(body["files"][0]["size"], 4);
        let saved = body["files"][0]["saved_name"].as_str().unwrap();
        assert!(saved.ends_with(".png") && saved != "cat.png");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let server = TestServer::start(true).await;
        let resp = server.upload("notes.txt", "text/plain").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = resp.json().await.unwrap();
        assert!(body["detail"].as_str().unwrap().contains("notes.txt"));
    }

    #[tokio::test]
    async fn test_generate_list_and_download() {
        let server = TestServer::start(true).await;
        let saved = server.upload_one("cat.png").await;
        let mapping = json!({ (saved.as_str()): "cat.png" }).to_string();

        let resp = server
            .generate("http://unused", json!([saved.clone(), "ghost.png"]), Some(&mapping))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let result: Value = resp.json().await.unwrap();
        assert_eq!(result["success"], 1);
        assert_eq!(result["failed"], 1);
        assert_eq!(result["details"][0]["status"], "success");
        assert_eq!(result["details"][1]["error"], "file not found");
        let output = result["output_file"].as_str().unwrap().to_string();
        assert!(output.starts_with("train_demo_"));

        let listing: Value = reqwest::get(server.url("/api/outputs"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listing["files"][0]["name"], output.as_str());

        let resp = reqwest::get(server.url(&format!("/api/download/{output}")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "application/json");
        let text = resp.text().await.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let record: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(record["images"], json!(["cat.png"]));
        assert_eq!(record["messages"][0]["content"], "<image>请描述这张图片");
        assert!(record["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("画面细节丰富"));
    }

    #[tokio::test]
    async fn test_generate_accepts_urlencoded_form() {
        let server = TestServer::start(true).await;
        let saved = server.upload_one("a.jpg").await;
        let files = json!([saved]).to_string();

        let resp = server
            .client
            .post(server.url("/api/generate"))
            .form(&[
                ("api_endpoint", "http://unused"),
                ("system_prompt", "describe"),
                ("file_names", files.as_str()),
                ("file_mapping", "{broken"),
            ])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let result: Value = resp.json().await.unwrap();
        assert_eq!(result["success"], 1);
        let output = result["output_file"].as_str().unwrap();
        let path = server.state.outputs().resolve(output).unwrap();
        let line = std::fs::read_to_string(path).unwrap();
        let record: Value = serde_json::from_str(line.trim()).unwrap();
        // Malformed mapping falls back to the saved name.
        assert_eq!(record["images"][0], saved.as_str());
    }

    #[tokio::test]
    async fn test_generate_rejects_malformed_file_names() {
        let server = TestServer::start(true).await;
        let resp = server
            .generate("http://unused", Value::String("not-json[".into()), None)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_with_unreachable_api_reports_failures() {
        let server = TestServer::start(false).await;
        let saved = server.upload_one("a.jpg").await;

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let dead = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
        drop(listener);

        let resp = server.generate(&dead, json!([saved]), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let result: Value = resp.json().await.unwrap();
        assert_eq!(result["success"], 0);
        assert_eq!(result["failed"], 1);
        assert_eq!(result["details"][0]["status"], "failed");
        assert!(result.get("output_file").is_none());
        assert!(server.state.outputs().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_and_delete_missing_are_404() {
        let server = TestServer::start(true).await;

        let resp = reqwest::get(server.url("/api/download/train_nope.jsonl"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = server
            .client
            .delete(server.url("/api/uploads/nope.png"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_upload() {
        let server = TestServer::start(true).await;
        let saved = server.upload_one("a.jpg").await;

        let resp = server
            .client
            .delete(server.url(&format!("/api/uploads/{saved}")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert!(server.state.uploads().resolve(&saved).is_none());
    }
}
