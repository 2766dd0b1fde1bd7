//! Ollama - local model adapter
//!
//! Ollama is endpoint-scoped (a local or LAN server address) and has no
//! authentication. It streams newline-delimited JSON instead of SSE and
//! reports token counts as `prompt_eval_count`/`eval_count`.

/// Adapter implementation
pub mod provider;
/// API types and configuration
pub mod types;


pub use provider::OllamaAdapter;
pub use types::{DEFAULT_BASE_URL, DEFAULT_MODEL, MODELS};
