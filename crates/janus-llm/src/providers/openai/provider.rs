use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::StreamExt;
use tracing::{debug, instrument};

use super::convert::{convert_messages, convert_tools, convert_usage};
use super::types::{
    ChatChunk, ChatError, ChatRequest, ChatResponse, StreamOptions, DEFAULT_BASE_URL,
    DEFAULT_MODEL, MODELS,
};
use crate::adapter::{Capabilities, ChunkStream, HealthProbe, ProviderAdapter};
use crate::completion::{CompletionRequest, CompletionResponse, StreamChunk};
use crate::credential::{ProviderCredential, Vendor};
use crate::error::{Error, Result};
use crate::pool::{ClientHandle, ClientPool};
use crate::ratelimit::{parse_rate_limit_headers, parse_retry_after_ms, RateLimitInfo};
use crate::sse;
use crate::util::sanitize_api_error;

/// OpenAI adapter
pub struct OpenAiAdapter {
    client: Arc<ClientHandle>,
    credential: ProviderCredential,
    base_url: String,
    last_rate_limit: Mutex<Option<RateLimitInfo>>,
}

impl OpenAiAdapter {
    /// Create an adapter over a pooled client.
    pub fn new(credential: ProviderCredential, pool: &ClientPool) -> Result<Self> {
        if credential.api_key.is_empty() {
            return Err(Error::NotConfigured("openai api key is empty".into()));
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

    fn build_request(&self, request: &CompletionRequest, stream: bool) -> ChatRequest {
        let model = if request.model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            request.model.clone()
        };

        ChatRequest {
            model,
            messages: convert_messages(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools.as_deref().map(convert_tools),
            stream: stream.then_some(true),
            // Without this opt-in the stream silently omits usage.
            stream_options: stream.then_some(StreamOptions {
                include_usage: true,
            }),
        }
    }

    async fn send(&self, body: &ChatRequest) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = %body.model, "sending request to OpenAI");

        let response = self
            .client
            .http
            .post(&url)
            .bearer_auth(&self.credential.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if let Some(info) = parse_rate_limit_headers(Vendor::OpenAi, response.headers()) {
            *self
                .last_rate_limit
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = Some(info);
        }

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after_ms(response.headers());
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ChatError>(&body) {
                Ok(err) => err.error.message,
                Err(_) => format!("HTTP {status}: {body}"),
            };
            return Err(Error::vendor(
                "openai",
                status.as_u16(),
                sanitize_api_error(&message),
                retry_after,
            ));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::OpenAi
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

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("response has no choices".into()))?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: parsed.model,
            usage: parsed.usage.as_ref().map(convert_usage).unwrap_or_default(),
            finish_reason: choice.finish_reason,
            rate_limit: self.last_rate_limit(),
        })
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete_stream(&self, request: CompletionRequest) -> Result<ChunkStream> {
        let body = self.build_request(&request, true);
        let response = self.send(&body).await?;

        let chunks = sse::lines(response.bytes_stream())
            .map(|line| -> Option<Result<StreamChunk>> {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => return Some(Err(Error::Network(e))),
                };
                let payload = sse::data_payload(&line)?;
                if payload == sse::DONE_MARKER {
                    return None;
                }

                let frame: ChatChunk = match serde_json::from_str(payload) {
                    Ok(frame) => frame,
                    Err(_) => return None,
                };

                // The final frame carries usage with an empty choice list
                // when include_usage was requested.
                if let Some(usage) = &frame.usage {
                    if frame.choices.is_empty() {
                        return Some(Ok(StreamChunk {
                            delta: String::new(),
                            finish_reason: None,
                            usage: Some(convert_usage(usage)),
                        }));
                    }
                }

                let choice = frame.choices.into_iter().next()?;
                Some(Ok(StreamChunk {
                    delta: choice.delta.content.unwrap_or_default(),
                    finish_reason: choice.finish_reason,
                    usage: frame.usage.as_ref().map(convert_usage),
                }))
            })
            .filter_map(futures::future::ready);

        Ok(Box::pin(chunks))
    }

    async fn health_check(&self) -> HealthProbe {
        let started = Instant::now();
        let url = format!("{}/models", self.base_url);

        let result = self
            .client
            .http
            .get(&url)
            .bearer_auth(&self.credential.api_key)
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
