//! Vendor adapter implementations

/// Anthropic Claude adapter
pub mod anthropic;
/// Azure OpenAI deployment-scoped adapter
pub mod azure;
/// Google Gemini adapter
pub mod gemini;
/// Mock adapter for tests
pub mod mock;
/// Ollama local adapter
pub mod ollama;
/// OpenAI adapter
pub mod openai;
