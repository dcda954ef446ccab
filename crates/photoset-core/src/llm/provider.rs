//! Vision provider trait, dialect detection, and the provider factory.
//!
//! Two wire dialects are supported: DashScope (Qwen-VL) and OpenAI-compatible
//! Chat Completions. The dialect is chosen once from the endpoint URL and
//! baked into the provider, so callers only ever see `describe()`.

use crate::config::{DemoConfig, LlmConfig};
use crate::error::UpstreamError;
use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Base64-encoded image ready to embed in a request body.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type advertised in the data URL
    pub media_type: String,
}

impl ImageInput {
    /// Encode raw image bytes.
    ///
    /// The media type is always `image/jpeg`: both upstream APIs sniff the
    /// actual format, and the declared type is not used for decoding.
    pub fn jpeg(bytes: &[u8]) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: "image/jpeg".to_string(),
        }
    }

    /// Return a `data:` URL for embedding in a JSON payload.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Wire format spoken to a vision endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// DashScope / Qwen-VL `input` + `parameters` envelope
    DashScope,
    /// OpenAI-compatible Chat Completions
    OpenAi,
}

impl Dialect {
    /// Pick the dialect for an endpoint URL.
    ///
    /// Any marker found in the lowercased URL selects DashScope; everything
    /// else is treated as OpenAI-compatible.
    pub fn detect(endpoint: &str, markers: &[String]) -> Self {
        let endpoint = endpoint.to_lowercase();
        let is_dashscope = markers
            .iter()
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .any(|m| endpoint.contains(&m));

        if is_dashscope {
            Self::DashScope
        } else {
            Self::OpenAi
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DashScope => "dashscope",
            Self::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait that all vision providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn VisionProvider>` for dynamic dispatch).
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    /// Produce a textual description of the image.
    async fn describe(
        &self,
        image: &ImageInput,
        system_prompt: &str,
        temperature: f32,
    ) -> Result<String, UpstreamError>;
}

/// Connection parameters shared by the HTTP-backed providers.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Endpoint {
    pub(crate) fn new(url: &str, api_key: Option<&str>, timeout_ms: u64) -> Self {
        Self {
            url: url.to_string(),
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// POST a JSON body and decode the JSON response.
    ///
    /// The bearer header is attached only when a key is present. Transport
    /// failures, timeouts, non-2xx statuses and undecodable bodies all map to
    /// [`UpstreamError`]; nothing is retried.
    pub(crate) async fn post_json<B, R>(
        &self,
        client: &reqwest::Client,
        provider: &str,
        body: &B,
    ) -> Result<R, UpstreamError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let start = Instant::now();

        let mut builder = client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(body)
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout {
                    provider: provider.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }
            } else {
                UpstreamError::Request {
                    provider: provider.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| UpstreamError::Request {
            provider: provider.to_string(),
            message: format!("failed to read response body: {e}"),
        })?;

        tracing::debug!(
            provider,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Vision API responded"
        );

        if !status.is_success() {
            return Err(UpstreamError::Status {
                provider: provider.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| UpstreamError::Response {
            provider: provider.to_string(),
            message: e.to_string(),
        })
    }
}

/// Factory that creates the provider matching an endpoint.
pub struct VisionProviderFactory;

impl VisionProviderFactory {
    /// Create a provider for `endpoint`, detecting its dialect.
    ///
    /// # Arguments
    /// * `endpoint` - Full URL the request is POSTed to
    /// * `api_key` - Optional bearer token; blank keys are treated as absent
    /// * `config` - Models, prompt, timeout and dialect markers
    pub fn create(
        endpoint: &str,
        api_key: Option<&str>,
        config: &LlmConfig,
    ) -> Box<dyn VisionProvider> {
        let dialect = Dialect::detect(endpoint, &config.dialect_markers);
        tracing::debug!("Using {dialect} dialect for {endpoint}");

        let target = Endpoint::new(endpoint, api_key, config.timeout_ms);
        match dialect {
            Dialect::DashScope => Box::new(super::dashscope::DashScopeProvider::new(
                target,
                &config.dashscope_model,
                &config.user_prompt,
            )),
            Dialect::OpenAi => Box::new(super::openai::OpenAiProvider::new(
                target,
                &config.openai_model,
                &config.user_prompt,
                config.max_tokens,
            )),
        }
    }

    /// Create the offline demo provider.
    pub fn demo(config: &DemoConfig) -> Box<dyn VisionProvider> {
        Box::new(super::demo::DemoProvider::new(config.delay_ms))
    }
}

/// Describe one image in a single call.
///
/// Convenience wrapper that builds a provider for `endpoint` and invokes it.
/// Batch callers should build the provider once with
/// [`VisionProviderFactory::create`] instead.
pub async fn describe(
    image_bytes: &[u8],
    endpoint: &str,
    api_key: Option<&str>,
    system_prompt: &str,
    temperature: f32,
    config: &LlmConfig,
) -> Result<String, UpstreamError> {
    let provider = VisionProviderFactory::create(endpoint, api_key, config);
    provider
        .describe(&ImageInput::jpeg(image_bytes), system_prompt, temperature)
        .await
}
