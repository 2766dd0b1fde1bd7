use serde::{Deserialize, Serialize};

/// Default local server address
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Commonly available local models
pub const MODELS: &[&str] = &["qwen2.5:7b", "llama3.2", "mistral"];

/// Default model
pub const DEFAULT_MODEL: &str = "qwen2.5:7b";

#[derive(Debug, Serialize)]
pub(crate) struct OllamaRequest {
    pub model: String,
    pub messages: Vec<OllamaMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OllamaMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate (Ollama's name for max output tokens)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// One `/api/chat` response object. Non-streaming calls return a single
/// object with `done: true`; streaming calls emit one object per line and
/// only the final one carries counts.
#[derive(Debug, Deserialize)]
pub(crate) struct OllamaResponse {
    pub model: String,
    #[serde(default)]
    pub message: Option<OllamaResponseMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub done_reason: Option<String>,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OllamaResponseMessage {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OllamaError {
    pub error: String,
}
