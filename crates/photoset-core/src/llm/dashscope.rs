//! DashScope (Qwen-VL) provider using the multimodal-generation API.
//!
//! DashScope wraps messages in an `input` envelope, puts sampling options
//! under `parameters`, and returns content as a list of typed parts.

use super::provider::{Endpoint, ImageInput, VisionProvider};
use crate::error::UpstreamError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider for DashScope-hosted Qwen vision models.
pub struct DashScopeProvider {
    endpoint: Endpoint,
    model: String,
    user_prompt: String,
    client: reqwest::Client,
}

impl DashScopeProvider {
    pub(crate) fn new(endpoint: Endpoint, model: &str, user_prompt: &str) -> Self {
        Self {
            endpoint,
            model: model.to_string(),
            user_prompt: user_prompt.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn build_request(
        &self,
        image: &ImageInput,
        system_prompt: &str,
        temperature: f32,
    ) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            input: Input {
                messages: vec![
                    Message {
                        role: "system",
                        content: vec![Part::Text {
                            text: system_prompt.to_string(),
                        }],
                    },
                    Message {
                        role: "user",
                        content: vec![
                            Part::Image {
                                image: image.data_url(),
                            },
                            Part::Text {
                                text: self.user_prompt.clone(),
                            },
                        ],
                    },
                ],
            },
            parameters: Parameters { temperature },
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct GenerationRequest {
    model: String,
    input: Input,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Input {
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: Vec<Part>,
}

/// Parts are distinguished by key name, not by a `type` tag.
#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Image { image: String },
    Text { text: String },
}

#[derive(Serialize)]
struct Parameters {
    temperature: f32,
}

// --- Response types ---

#[derive(Deserialize)]
struct GenerationResponse {
    output: Option<Output>,
}

#[derive(Deserialize)]
struct Output {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    text: Option<String>,
}

impl GenerationResponse {
    /// `output.choices[0].message.content[0].text`
    fn into_text(self) -> Option<String> {
        self.output?
            .choices
            .into_iter()
            .next()?
            .message
            .content
            .into_iter()
            .next()?
            .text
    }
}

#[async_trait]
impl VisionProvider for DashScopeProvider {
    fn name(&self) -> &str {
        "dashscope"
    }

    async fn describe(
        &self,
        image: &ImageInput,
        system_prompt: &str,
        temperature: f32,
    ) -> Result<String, UpstreamError> {
        let body = self.build_request(image, system_prompt, temperature);
        let resp: GenerationResponse = self
            .endpoint
            .post_json(&self.client, self.name(), &body)
            .await?;

        resp.into_text().ok_or_else(|| UpstreamError::Response {
            provider: self.name().to_string(),
            message: "missing output.choices[0].message.content[0].text".to_string(),
        })
    }
}
