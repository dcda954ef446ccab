//! OpenAI-compatible provider using the Chat Completions API.
//!
//! The system prompt travels as a plain-string system message; the image goes
//! as a data URL in the user message content array, after the instruction.

use super::provider::{Endpoint, ImageInput, VisionProvider};
use crate::error::UpstreamError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider for any endpoint speaking Chat Completions.
pub struct OpenAiProvider {
    endpoint: Endpoint,
    model: String,
    user_prompt: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub(crate) fn new(endpoint: Endpoint, model: &str, user_prompt: &str, max_tokens: u32) -> Self {
        Self {
            endpoint,
            model: model.to_string(),
            user_prompt: user_prompt.to_string(),
            max_tokens,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, image: &ImageInput, system_prompt: &str, temperature: f32) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(system_prompt.to_string()),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ChatContent::Text {
                            text: self.user_prompt.clone(),
                        },
                        ChatContent::ImageUrl {
                            image_url: ImageUrl {
                                url: image.data_url(),
                            },
                        },
                    ]),
                },
            ],
            temperature,
            max_tokens: self.max_tokens,
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

/// System content is a bare string, user content is a typed parts array.
#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ChatContent>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    /// `choices[0].message.content`
    fn into_text(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.message.content)
    }
}

#[async_trait]
impl VisionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn describe(
        &self,
        image: &ImageInput,
        system_prompt: &str,
        temperature: f32,
    ) -> Result<String, UpstreamError> {
        let body = self.build_request(image, system_prompt, temperature);
        let resp: ChatResponse = self
            .endpoint
            .post_json(&self.client, self.name(), &body)
            .await?;

        resp.into_text().ok_or_else(|| UpstreamError::Response {
            provider: self.name().to_string(),
            message: "missing choices[0].message.content".to_string(),
        })
    }
}
