//! Janus LLM - unified multi-vendor LLM access
//!
//! This crate lets callers drive several interchangeable LLM backends
//! through one request/response contract:
//! - Pool: bounded, TTL-evicting cache of vendor client handles
//! - Adapters: Anthropic, OpenAI, Azure OpenAI, Google Gemini, Ollama
//! - Registry: adapter factory + cache keyed by vendor and credential
//! - Rate limits: shared parser normalizing per-vendor header formats
//! - Cost: tiered, multi-category token cost calculation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod completion;
pub mod cost;
pub mod credential;
pub mod error;
pub mod message;
pub mod pool;
pub mod providers;
pub mod ratelimit;
pub mod registry;
pub mod sse;
pub mod tools;
pub mod util;

pub use adapter::{Capabilities, ChunkStream, HealthProbe, ProviderAdapter};
pub use completion::{CompletionRequest, CompletionResponse, StreamChunk, TokenUsage};
pub use cost::{calculate_cost, default_pricing, CostBreakdown, PricingDescriptor, PricingTier};
pub use credential::{ProviderCredential, Vendor};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use pool::{ClientHandle, ClientPool, PoolConfig};
pub use ratelimit::RateLimitInfo;
pub use registry::ProviderRegistry;
pub use tools::ToolDefinition;

// Re-export adapter types
pub use providers::anthropic::AnthropicAdapter;
pub use providers::azure::AzureOpenAiAdapter;
pub use providers::gemini::GeminiAdapter;
pub use providers::mock::MockAdapter;
pub use providers::ollama::OllamaAdapter;
pub use providers::openai::OpenAiAdapter;
