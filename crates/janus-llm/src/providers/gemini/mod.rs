//! Google Gemini - generateContent adapter
//!
//! Gemini speaks camelCase JSON with a `systemInstruction` field, uses
//! "model" for the assistant role, authenticates via a `key` query
//! parameter, and reports usage under `usageMetadata` including a thinking
//! token count.

/// Message conversion utilities
pub mod convert;
/// Adapter implementation
pub mod provider;
/// API types and configuration
pub mod types;

#[cfg(test)]
mod tests;

pub use provider::GeminiAdapter;
pub use types::{DEFAULT_MODEL, MODELS};
