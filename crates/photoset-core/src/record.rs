//! Training records for multimodal fine-tuning corpora.
//!
//! One record per described image, in the conversation + image-list shape
//! consumed by common VLM fine-tuning toolkits.

use serde::{Deserialize, Serialize};

/// User-turn content written into every record.
pub const DEFAULT_INSTRUCTION: &str = "<image>请描述这张图片";

/// A single chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// One line of a generated dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    /// User instruction followed by the assistant description
    pub messages: Vec<Message>,

    /// Image file names referenced by `<image>` placeholders, in order.
    /// Always the user-facing original name, never the storage name.
    pub images: Vec<String>,
}

impl TrainingRecord {
    /// Build a record with the default instruction.
    pub fn build(original_filename: &str, description: &str) -> Self {
        Self::with_instruction(DEFAULT_INSTRUCTION, original_filename, description)
    }

    /// Build a record with a custom user-turn instruction.
    ///
    /// The description is taken as-is; empty strings are accepted.
    pub fn with_instruction(instruction: &str, original_filename: &str, description: &str) -> Self {
        Self {
            messages: vec![
                Message {
                    role: "user".to_string(),
                    content: instruction.to_string(),
                },
                Message {
                    role: "assistant".to_string(),
                    content: description.to_string(),
                },
            ],
            images: vec![original_filename.to_string()],
        }
    }

    /// The assistant description carried by this record.
    pub fn description(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == "assistant")
            .map(|m| m.content.as_str())
    }
}
