//! Completion request and response types
//!
//! This module defines the unified request/response contract that every
//! provider adapter translates to and from its vendor's native API.

use crate::message::Message;
use crate::ratelimit::RateLimitInfo;
use crate::tools::ToolDefinition;
use serde::{Deserialize, Serialize};

/// Token usage information, normalized across vendors.
///
/// `cache_creation_tokens`, `cache_read_tokens` and `reasoning_tokens` are
/// vendor-specific categories and stay zero for vendors that do not report
/// them. `total_tokens` always follows the reconciliation rule in
/// [`TokenUsage::reconcile`]; vendor-reported totals are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input (prompt) tokens
    pub input_tokens: u64,
    /// Output (completion) tokens
    pub output_tokens: u64,
    /// Total tokens
    pub total_tokens: u64,
    /// Tokens written to a vendor prompt cache
    #[serde(default)]
    pub cache_creation_tokens: u64,
    /// Tokens served from a vendor prompt cache (billed separately from input)
    #[serde(default)]
    pub cache_read_tokens: u64,
    /// Extended-reasoning ("thinking") tokens
    #[serde(default)]
    pub reasoning_tokens: u64,
}

impl TokenUsage {
    /// Create a usage record from input/output counts.
    #[must_use]
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            ..Default::default()
        }
        .reconcile()
    }

    /// Set cache token categories.
    #[must_use]
    pub fn with_cache_tokens(mut self, creation: u64, read: u64) -> Self {
        self.cache_creation_tokens = creation;
        self.cache_read_tokens = read;
        self.reconcile()
    }

    /// Set reasoning tokens.
    #[must_use]
    pub fn with_reasoning_tokens(mut self, reasoning: u64) -> Self {
        self.reasoning_tokens = reasoning;
        self.reconcile()
    }

    /// Recompute `total_tokens`.
    ///
    /// Total = input + output + cache-creation + reasoning. Cache-read tokens
    /// are billed separately from input and excluded from the total.
    #[must_use]
    pub fn reconcile(mut self) -> Self {
        self.total_tokens = self.input_tokens
            + self.output_tokens
            + self.cache_creation_tokens
            + self.reasoning_tokens;
        self
    }
}

/// Completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Model to use (vendor-specific name)
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<Message>,
    /// System instruction, carried separately from the message list.
    /// Each adapter decides whether it becomes a dedicated field or a
    /// prepended system-role message.
    pub system: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Tool/function declarations
    pub tools: Option<Vec<ToolDefinition>>,
}

impl CompletionRequest {
    /// Create a new completion request
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add a message
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Add messages
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Set the system instruction
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set tool declarations
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,
    /// Model that actually served the request (vendors may echo a
    /// different string than requested)
    pub model: String,
    /// Token usage
    pub usage: TokenUsage,
    /// Stop/finish reason
    pub finish_reason: Option<String>,
    /// Rate limit state parsed from the response headers, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitInfo>,
}

/// A chunk of a streamed completion.
///
/// Content arrives incrementally; usage is only populated on the terminal
/// chunk for most vendors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Incremental content
    pub delta: String,
    /// Finish reason, set on the terminal chunk
    pub finish_reason: Option<String>,
    /// Token usage, set on the terminal chunk when the vendor reports it
    pub usage: Option<TokenUsage>,
}
