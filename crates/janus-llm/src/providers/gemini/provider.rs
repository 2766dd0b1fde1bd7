use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::StreamExt;
use tracing::{debug, instrument};

use super::convert::{convert_messages, convert_tools, convert_usage, extract_text};
use super::types::{
    GeminiError, GeminiRequest, GeminiResponse, GenerationConfig, DEFAULT_BASE_URL, DEFAULT_MODEL,
    MODELS,
};
use crate::adapter::{Capabilities, ChunkStream, HealthProbe, ProviderAdapter};
use crate::completion::{CompletionRequest, CompletionResponse, StreamChunk};
use crate::credential::{ProviderCredential, Vendor};
use crate::error::{Error, Result};
use crate::pool::{ClientHandle, ClientPool};
use crate::ratelimit::{parse_rate_limit_headers, parse_retry_after_ms, RateLimitInfo};
use crate::sse;
use crate::util::sanitize_api_error;

/// Google Gemini adapter
pub struct GeminiAdapter {
    client: Arc<ClientHandle>,
    credential: ProviderCredential,
    base_url: String,
    last_rate_limit: Mutex<Option<RateLimitInfo>>,
}

impl GeminiAdapter {
    /// Create an adapter over a pooled client.
    pub fn new(credential: ProviderCredential, pool: &ClientPool) -> Result<Self> {
        if credential.api_key.is_empty() {
            return Err(Error::NotConfigured("gemini api key is empty".into()));
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

    fn model_name<'a>(&self, request: &'a CompletionRequest) -> &'a str {
        if request.model.is_empty() {
            DEFAULT_MODEL
        } else {
            &request.model
        }
    }

    fn build_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let (system_instruction, contents) = convert_messages(request);

        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        GeminiRequest {
            contents,
            system_instruction,
            generation_config,
            tools: request.tools.as_deref().map(convert_tools),
        }
    }

    async fn send(&self, url: &str, body: &GeminiRequest) -> Result<reqwest::Response> {
        debug!(url = %url, "sending request to Gemini");

        let response = self
            .client
            .http
            .post(url)
            .query(&[("key", self.credential.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if let Some(info) = parse_rate_limit_headers(Vendor::Gemini, response.headers()) {
            *self
                .last_rate_limit
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = Some(info);
        }

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after_ms(response.headers());
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<GeminiError>(&body) {
                Ok(err) => err.error.message,
                Err(_) => format!("HTTP {status}: {body}"),
            };
            return Err(Error::vendor(
                "gemini",
                status.as_u16(),
                sanitize_api_error(&message),
                retry_after,
            ));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Gemini
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
        let model = self.model_name(&request).to_string();
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = self.build_request(&request);
        let response = self.send(&url, &body).await?;

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("response has no candidates".into()))?;

        let content = candidate
            .content
            .as_ref()
            .map(extract_text)
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: parsed.model_version.unwrap_or(model),
            usage: parsed
                .usage_metadata
                .as_ref()
                .map(convert_usage)
                .unwrap_or_default(),
            finish_reason: candidate.finish_reason,
            rate_limit: self.last_rate_limit(),
        })
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete_stream(&self, request: CompletionRequest) -> Result<ChunkStream> {
        let model = self.model_name(&request).to_string();
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        );
        let body = self.build_request(&request);
        let response = self.send(&url, &body).await?;

        let chunks = sse::lines(response.bytes_stream())
            .map(|line| -> Option<Result<StreamChunk>> {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => return Some(Err(Error::Network(e))),
                };
                let payload = sse::data_payload(&line)?;

                let frame: GeminiResponse = match serde_json::from_str(payload) {
                    Ok(frame) => frame,
                    Err(_) => return None,
                };

                let candidate = frame.candidates.into_iter().next();
                let delta = candidate
                    .as_ref()
                    .and_then(|c| c.content.as_ref())
                    .map(extract_text)
                    .unwrap_or_default();
                let finish_reason = candidate.and_then(|c| c.finish_reason);

                // Usage accompanies the final frame (the one carrying a
                // finish reason); intermediate frames repeat partial counts.
                let usage = if finish_reason.is_some() {
                    frame.usage_metadata.as_ref().map(convert_usage)
                } else {
                    None
                };

                if delta.is_empty() && finish_reason.is_none() {
                    return None;
                }
                Some(Ok(StreamChunk {
                    delta,
                    finish_reason,
                    usage,
                }))
            })
            .filter_map(futures::future::ready);

        Ok(Box::pin(chunks))
    }

    async fn health_check(&self) -> HealthProbe {
        let started = Instant::now();
        let url = format!("{}/v1beta/models", self.base_url);

        let result = self
            .client
            .http
            .get(&url)
            .query(&[("key", self.credential.api_key.as_str()), ("pageSize", "1")])
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
