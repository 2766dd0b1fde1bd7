//! Provider adapter trait definition
//!
//! Every vendor adapter translates the unified request/response contract in
//! [`crate::completion`] to and from its vendor's native API. The trait is
//! dyn-compatible so adapters are shared as `Arc<dyn ProviderAdapter>`.

use crate::completion::{CompletionRequest, CompletionResponse, StreamChunk};
use crate::credential::Vendor;
use crate::error::Result;
use crate::ratelimit::RateLimitInfo;
use futures::stream::BoxStream;

/// Static capability flags for an adapter.
///
/// Callers must check these before using the corresponding feature; calling
/// an unsupported feature is a caller error, not something the adapter
/// degrades around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Incremental streaming via `complete_stream`
    pub streaming: bool,
    /// Tool/function calling declarations
    pub tools: bool,
    /// Image inputs
    pub vision: bool,
}

/// Result of a health probe.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    /// Whether the minimal call succeeded
    pub healthy: bool,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
    /// Error description when unhealthy
    pub error: Option<String>,
}

/// Lazy stream of completion chunks.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk>>;

/// Trait implemented by every vendor adapter.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Vendor this adapter talks to
    fn vendor(&self) -> Vendor;

    /// Static capability flags
    fn capabilities(&self) -> Capabilities;

    /// Known model names for this vendor
    fn available_models(&self) -> Vec<String>;

    /// Default model when a request leaves the model empty
    fn default_model(&self) -> &str;

    /// Single-shot completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Streaming completion.
    ///
    /// Chunks carry content only; token usage arrives on the terminal chunk
    /// where the vendor reports it.
    async fn complete_stream(&self, request: CompletionRequest) -> Result<ChunkStream>;

    /// Issue a minimal cheap call to probe vendor reachability.
    async fn health_check(&self) -> HealthProbe;

    /// Rate limit state parsed from the most recent response, if any.
    fn last_rate_limit(&self) -> Option<RateLimitInfo>;
}
