use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::StreamExt;
use tracing::{debug, instrument};

use super::convert::{convert_messages, convert_tools, convert_usage};
use super::types::{
    AnthropicError, AnthropicRequest, AnthropicResponse, AnthropicStreamEvent, AnthropicUsage,
    ResponseContentBlock, API_VERSION, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, MODELS,
};
use crate::adapter::{Capabilities, ChunkStream, HealthProbe, ProviderAdapter};
use crate::completion::{CompletionRequest, CompletionResponse, StreamChunk};
use crate::credential::{ProviderCredential, Vendor};
use crate::error::{Error, Result};
use crate::pool::{ClientHandle, ClientPool};
use crate::ratelimit::{parse_rate_limit_headers, parse_retry_after_ms, RateLimitInfo};
use crate::sse;
use crate::util::sanitize_api_error;

/// Anthropic Claude adapter
pub struct AnthropicAdapter {
    client: Arc<ClientHandle>,
    credential: ProviderCredential,
    base_url: String,
    last_rate_limit: Mutex<Option<RateLimitInfo>>,
}

impl AnthropicAdapter {
    /// Create an adapter over a pooled client.
    pub fn new(credential: ProviderCredential, pool: &ClientPool) -> Result<Self> {
        if credential.api_key.is_empty() {
            return Err(Error::NotConfigured("anthropic api key is empty".into()));
        }

        let base_url = credential
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let client = pool.acquire(&credential);

        Ok(Self {
            client,
            credential,
            base_url,
            last_rate_limit: Mutex::new(None),
        })
    }

    fn build_request(&self, request: &CompletionRequest, stream: bool) -> AnthropicRequest {
        let model = if request.model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            request.model.clone()
        };
        let (system, messages) = convert_messages(request);

        AnthropicRequest {
            model,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            messages,
            temperature: request.temperature,
            tools: request.tools.as_deref().map(convert_tools),
            stream: stream.then_some(true),
        }
    }

    async fn send(&self, body: &AnthropicRequest) -> Result<reqwest::Response> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(url = %url, model = %body.model, "sending request to Anthropic");

        let response = self
            .client
            .http
            .post(&url)
            .header("x-api-key", &self.credential.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        // Capture rate limit headers before consuming the body.
        if let Some(info) = parse_rate_limit_headers(Vendor::Anthropic, response.headers()) {
            *self
                .last_rate_limit
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = Some(info);
        }

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after_ms(response.headers());
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<AnthropicError>(&body) {
                Ok(err) => format!("{}: {}", err.error.r#type, err.error.message),
                Err(_) => format!("HTTP {status}: {body}"),
            };
            return Err(Error::vendor(
                "anthropic",
                status.as_u16(),
                sanitize_api_error(&message),
                retry_after,
            ));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Anthropic
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            tools: true,
            vision: true,
        }
    }

    fn available_models(&self) -> Vec<String> {
        MODELS.iter().map(|s| (*s).to_string()).collect()
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(&request, false);
        let response = self.send(&body).await?;

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let content = parsed
            .content
            .iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(text.as_str()),
                ResponseContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            content,
            model: parsed.model,
            usage: convert_usage(&parsed.usage),
            finish_reason: parsed.stop_reason,
            rate_limit: self.last_rate_limit(),
        })
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete_stream(&self, request: CompletionRequest) -> Result<ChunkStream> {
        let body = self.build_request(&request, true);
        let response = self.send(&body).await?;

        // input/cache counts arrive in message_start, output tokens in the
        // terminal message_delta; stitch them together across events.
        let mut start_usage = AnthropicUsage::default();

        let chunks = sse::lines(response.bytes_stream())
            .map(move |line| -> Option<Result<StreamChunk>> {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => return Some(Err(Error::Network(e))),
                };
                let payload = sse::data_payload(&line)?;

                match serde_json::from_str::<AnthropicStreamEvent>(payload) {
                    Ok(AnthropicStreamEvent::MessageStart { message }) => {
                        start_usage = message.usage;
                        None
                    }
                    Ok(AnthropicStreamEvent::ContentBlockDelta { delta }) => {
                        delta.text.map(|text| {
                            Ok(StreamChunk {
                                delta: text,
                                ..Default::default()
                            })
                        })
                    }
                    Ok(AnthropicStreamEvent::MessageDelta { delta, usage }) => {
                        let mut total = convert_usage(&start_usage);
                        if let Some(usage) = usage {
                            total.output_tokens = usage.output_tokens;
                            total = total.reconcile();
                        }
                        Some(Ok(StreamChunk {
                            delta: String::new(),
                            finish_reason: delta.stop_reason,
                            usage: Some(total),
                        }))
                    }
                    Ok(AnthropicStreamEvent::Other) | Err(_) => None,
                }
            })
            .filter_map(futures::future::ready);

        Ok(Box::pin(chunks))
    }

    async fn health_check(&self) -> HealthProbe {
        let started = Instant::now();
        let url = format!("{}/v1/models", self.base_url);

        let result = self
            .client
            .http
            .get(&url)
            .header("x-api-key", &self.credential.api_key)
            .header("anthropic-version", API_VERSION)
            .send()
            .await;

        let latency_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(response) if response.status().is_success() => HealthProbe {
                healthy: true,
                latency_ms,
                error: None,
            },
            Ok(response) => HealthProbe {
                healthy: false,
                latency_ms,
                error: Some(format!("HTTP {}", response.status())),
            },
            Err(e) => HealthProbe {
                healthy: false,
                latency_ms,
                error: Some(sanitize_api_error(&e.to_string())),
            },
        }
    }

    fn last_rate_limit(&self) -> Option<RateLimitInfo> {
        *self
            .last_rate_limit
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}
