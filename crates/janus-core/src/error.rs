//! Error types for janus-core

use thiserror::Error;

/// Core execution error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error from the LLM layer (configuration or vendor)
    #[error(transparent)]
    Llm(#[from] janus_llm::Error),

    /// Persistence error
    #[error("store error: {0}")]
    Store(String),

    /// Agent not found
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    /// Model not found
    #[error("unknown model for agent: {0}")]
    UnknownModel(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
