use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::StreamExt;
use tracing::{debug, instrument};

use super::types::{
    OllamaError, OllamaMessage, OllamaOptions, OllamaRequest, OllamaResponse, DEFAULT_BASE_URL,
    DEFAULT_MODEL, MODELS,
};
use crate::adapter::{Capabilities, ChunkStream, HealthProbe, ProviderAdapter};
use crate::completion::{CompletionRequest, CompletionResponse, StreamChunk, TokenUsage};
use crate::credential::{ProviderCredential, Vendor};
use crate::error::{Error, Result};
use crate::message::MessageRole;
use crate::pool::{ClientHandle, ClientPool};
use crate::ratelimit::{parse_rate_limit_headers, parse_retry_after_ms, RateLimitInfo};
use crate::sse;
use crate::util::sanitize_api_error;

/// Local Ollama adapter
pub struct OllamaAdapter {
    client: Arc<ClientHandle>,
    base_url: String,
    last_rate_limit: Mutex<Option<RateLimitInfo>>,
}

/// Ollama puts the system instruction in-band as a leading system message.
pub(crate) fn convert_messages(request: &CompletionRequest) -> Vec<OllamaMessage> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);

    if let Some(system) = &request.system {
        if !system.is_empty() {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
    }

    for msg in &request.messages {
        let role = match msg.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        messages.push(OllamaMessage {
            role: role.to_string(),
            content: msg.content.clone(),
        });
    }

    messages
}

fn convert_usage(response: &OllamaResponse) -> TokenUsage {
    TokenUsage::new(
        response.prompt_eval_count.unwrap_or(0),
        response.eval_count.unwrap_or(0),
    )
}

impl OllamaAdapter {
    /// Create an adapter over a pooled client.
    pub fn new(credential: ProviderCredential, pool: &ClientPool) -> Result<Self> {
        let base_url = credential
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let client = pool.acquire(&credential);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            last_rate_limit: Mutex::new(None),
        })
    }

    fn build_request(&self, request: &CompletionRequest, stream: bool) -> OllamaRequest {
        let model = if request.model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            request.model.clone()
        };

        let options = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            })
        } else {
            None
        };

        OllamaRequest {
            model,
            messages: convert_messages(request),
            stream,
            options,
        }
    }

    async fn send(&self, body: &OllamaRequest) -> Result<reqwest::Response> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(url = %url, model = %body.model, "sending request to Ollama");

        let response = self
            .client
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if let Some(info) = parse_rate_limit_headers(Vendor::Ollama, response.headers()) {
            *self
                .last_rate_limit
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = Some(info);
        }

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after_ms(response.headers());
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<OllamaError>(&body) {
                Ok(err) => err.error,
                Err(_) => format!("HTTP {status}: {body}"),
            };
            return Err(Error::vendor(
                "ollama",
                status.as_u16(),
                sanitize_api_error(&message),
                retry_after,
            ));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Ollama
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            tools: false,
            vision: false,
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
        if request.tools.is_some() {
            return Err(Error::Unsupported(
                "ollama adapter does not support tool declarations".into(),
            ));
        }

        let body = self.build_request(&request, false);
        let response = self.send(&body).await?;

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        Ok(CompletionResponse {
            content: parsed
                .message
                .as_ref()
                .map(|m| m.content.clone())
                .unwrap_or_default(),
            model: parsed.model.clone(),
            usage: convert_usage(&parsed),
            finish_reason: parsed.done_reason.clone(),
            rate_limit: self.last_rate_limit(),
        })
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete_stream(&self, request: CompletionRequest) -> Result<ChunkStream> {
        if request.tools.is_some() {
            return Err(Error::Unsupported(
                "ollama adapter does not support tool declarations".into(),
            ));
        }

        let body = self.build_request(&request, true);
        let response = self.send(&body).await?;

        // NDJSON: one response object per line, final line has done: true.
        let chunks = sse::lines(response.bytes_stream())
            .map(|line| -> Option<Result<StreamChunk>> {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => return Some(Err(Error::Network(e))),
                };

                let frame: OllamaResponse = match serde_json::from_str(&line) {
                    Ok(frame) => frame,
                    Err(_) => return None,
                };

                let delta = frame
                    .message
                    .as_ref()
                    .map(|m| m.content.clone())
                    .unwrap_or_default();

                if frame.done {
                    Some(Ok(StreamChunk {
                        delta,
                        finish_reason: frame.done_reason.clone().or_else(|| Some("stop".into())),
                        usage: Some(convert_usage(&frame)),
                    }))
                } else if delta.is_empty() {
                    None
                } else {
                    Some(Ok(StreamChunk {
                        delta,
                        ..Default::default()
                    }))
                }
            })
            .filter_map(futures::future::ready);

        Ok(Box::pin(chunks))
    }

    async fn health_check(&self) -> HealthProbe {
        let started = Instant::now();
        let url = format!("{}/api/tags", self.base_url);

        let result = self.client.http.get(&url).send().await;

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
