//! Mock adapter for testing
//!
//! Returns queued responses (or errors) in FIFO order, falling back to a
//! default response when the queue is empty.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures::stream;

use crate::adapter::{Capabilities, ChunkStream, HealthProbe, ProviderAdapter};
use crate::completion::{CompletionRequest, CompletionResponse, StreamChunk, TokenUsage};
use crate::credential::Vendor;
use crate::error::Result;
use crate::ratelimit::RateLimitInfo;

/// A mock adapter that replays queued results.
pub struct MockAdapter {
    vendor: Vendor,
    responses: Mutex<VecDeque<Result<CompletionResponse>>>,
    rate_limit: Mutex<Option<RateLimitInfo>>,
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAdapter {
    /// Create a new mock adapter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vendor: Vendor::OpenAi,
            responses: Mutex::new(VecDeque::new()),
            rate_limit: Mutex::new(None),
        }
    }

    /// Report a different vendor.
    #[must_use]
    pub fn with_vendor(mut self, vendor: Vendor) -> Self {
        self.vendor = vendor;
        self
    }

    /// Queue a successful response.
    pub fn add_response(&self, response: CompletionResponse) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(response));
    }

    /// Queue an error.
    pub fn add_error(&self, error: crate::error::Error) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    /// Set the rate limit info returned by `last_rate_limit`.
    pub fn set_rate_limit(&self, info: RateLimitInfo) {
        *self.rate_limit.lock().unwrap_or_else(|e| e.into_inner()) = Some(info);
    }

    fn next_response(&self) -> Result<CompletionResponse> {
        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        responses.pop_front().unwrap_or_else(|| {
            Ok(CompletionResponse {
                content: "mock response".to_string(),
                model: "mock-model".to_string(),
                usage: TokenUsage::new(10, 5),
                finish_reason: Some("stop".to_string()),
                rate_limit: None,
            })
        })
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for MockAdapter {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            tools: true,
            vision: false,
        }
    }

    fn available_models(&self) -> Vec<String> {
        vec!["mock-model".to_string()]
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
        self.next_response()
    }

    async fn complete_stream(&self, _request: CompletionRequest) -> Result<ChunkStream> {
        let response = self.next_response()?;
        let chunks = vec![
            Ok(StreamChunk {
                delta: response.content,
                ..Default::default()
            }),
            Ok(StreamChunk {
                delta: String::new(),
                finish_reason: response.finish_reason,
                usage: Some(response.usage),
            }),
        ];
        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn health_check(&self) -> HealthProbe {
        HealthProbe {
            healthy: true,
            latency_ms: 0,
            error: None,
        }
    }

    fn last_rate_limit(&self) -> Option<RateLimitInfo> {
        *self.rate_limit.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_queued_responses_replay_in_order() {
        let adapter = MockAdapter::new();
        adapter.add_response(CompletionResponse {
            content: "first".into(),
            model: "mock-model".into(),
            usage: TokenUsage::new(1, 1),
            finish_reason: Some("stop".into()),
            rate_limit: None,
        });

        let first = adapter
            .complete(CompletionRequest::new("mock-model"))
            .await
            .unwrap();
        assert_eq!(first.content, "first");

        // Queue drained: falls back to the default response.
        let second = adapter
            .complete(CompletionRequest::new("mock-model"))
            .await
            .unwrap();
        assert_eq!(second.content, "mock response");
    }

    #[tokio::test]
    async fn test_stream_ends_with_usage() {
        let adapter = MockAdapter::new();
        let chunks: Vec<_> = adapter
            .complete_stream(CompletionRequest::new("mock-model"))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(chunks.len(), 2);
        let last = chunks.last().unwrap().as_ref().unwrap();
        assert!(last.usage.is_some());
    }
}
