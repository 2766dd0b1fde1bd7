use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::StreamExt;
use tracing::{debug, instrument};

use super::super::openai::convert::{convert_messages, convert_tools, convert_usage};
use super::super::openai::types::{ChatChunk, ChatError, ChatRequest, ChatResponse, StreamOptions};
use crate::adapter::{Capabilities, ChunkStream, HealthProbe, ProviderAdapter};
use crate::completion::{CompletionRequest, CompletionResponse, StreamChunk};
use crate::credential::{ProviderCredential, Vendor};
use crate::error::{Error, Result};
use crate::pool::{ClientHandle, ClientPool};
use crate::ratelimit::{parse_rate_limit_headers, parse_retry_after_ms, RateLimitInfo};
use crate::sse;
use crate::util::sanitize_api_error;

/// Azure OpenAI service API version
pub const API_VERSION: &str = "2024-06-01";

/// Azure OpenAI adapter
pub struct AzureOpenAiAdapter {
    client: Arc<ClientHandle>,
    credential: ProviderCredential,
    endpoint: String,
    deployment: String,
    last_rate_limit: Mutex<Option<RateLimitInfo>>,
}

impl AzureOpenAiAdapter {
    /// Create an adapter over a pooled client.
    ///
    /// Fails fast when the resource endpoint or deployment name is missing;
    /// Azure cannot be addressed without them.
    pub fn new(credential: ProviderCredential, pool: &ClientPool) -> Result<Self> {
        if credential.api_key.is_empty() {
            return Err(Error::NotConfigured("azure openai api key is empty".into()));
        }
        let endpoint = credential
            .base_url
            .clone()
            .ok_or_else(|| Error::NotConfigured("azure openai requires a resource endpoint".into()))?;
        let deployment = credential
            .deployment
            .clone()
            .ok_or_else(|| Error::NotConfigured("azure openai requires a deployment name".into()))?;

        let client = pool.acquire(&credential);

        Ok(Self {
            client,
            credential,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            deployment,
            last_rate_limit: Mutex::new(None),
        })
    }

    fn build_request(&self, request: &CompletionRequest, stream: bool) -> ChatRequest {
        // The deployment determines the model on Azure; the model field is
        // still sent so the service can echo it back.
        let model = if request.model.is_empty() {
            self.deployment.clone()
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
            stream_options: stream.then_some(StreamOptions {
                include_usage: true,
            }),
        }
    }

    async fn send(&self, body: &ChatRequest) -> Result<reqwest::Response> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        );
        debug!(url = %url, deployment = %self.deployment, "sending request to Azure OpenAI");

        let response = self
            .client
            .http
            .post(&url)
            .query(&[("api-version", API_VERSION)])
            .header("api-key", &self.credential.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if let Some(info) = parse_rate_limit_headers(Vendor::AzureOpenAi, response.headers()) {
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
                "azure_openai",
                status.as_u16(),
                sanitize_api_error(&message),
                retry_after,
            ));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for AzureOpenAiAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::AzureOpenAi
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            tools: true,
            vision: true,
        }
    }

    fn available_models(&self) -> Vec<String> {
        // Azure exposes exactly the configured deployment.
        vec![self.deployment.clone()]
    }

    fn default_model(&self) -> &str {
        &self.deployment
    }

    #[instrument(skip(self, request), fields(deployment = %self.deployment))]
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

    #[instrument(skip(self, request), fields(deployment = %self.deployment))]
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
        let url = format!("{}/openai/models", self.endpoint);

        let result = self
            .client
            .http
            .get(&url)
            .query(&[("api-version", API_VERSION)])
            .header("api-key", &self.credential.api_key)
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
