//! Agent execution
//!
//! One `execute` call resolves the agent and model configuration, obtains an
//! adapter from the registry, issues the completion, prices the usage,
//! persists the exchange, updates the agent's health record and returns a
//! normalized result.
//!
//! Ordinary vendor and configuration failures come back as a failed
//! [`ExecutionResult`], not an `Err`; persistence failures along the way are
//! logged and swallowed so they can never corrupt an otherwise-successful
//! execution.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::{ExchangeRecord, ExecutionStore};
use janus_llm::{calculate_cost, CompletionRequest, Message, ProviderRegistry};

/// Executor configuration knobs.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum conversation-history messages prefixed to a call.
    pub max_history_messages: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_history_messages: 20,
        }
    }
}

/// One unit of work for an agent.
#[derive(Debug, Clone)]
pub struct ExecutionInput {
    /// Agent to execute, by name
    pub agent_name: String,
    /// User input for this step
    pub input: String,
    /// Session to attribute cost to, when any
    pub session_id: Option<String>,
    /// Prior conversation messages (bounded by the executor)
    pub history: Vec<Message>,
}

impl ExecutionInput {
    /// Create an input with no session or history.
    #[must_use]
    pub fn new(agent_name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            input: input.into(),
            session_id: None,
            history: Vec::new(),
        }
    }

    /// Attribute cost to a session.
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Prefix conversation history.
    #[must_use]
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

/// Normalized result of one execution.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Whether the call succeeded
    pub success: bool,
    /// Parsed output: a JSON value when the response body (or a fenced
    /// ```json block in it) parses, the raw text as a string otherwise
    pub output: Value,
    /// Raw response text
    pub raw_output: String,
    /// Total tokens used (0 on failure)
    pub tokens_used: u64,
    /// Cost in USD (0 on failure)
    pub cost_usd: f64,
    /// Elapsed time in milliseconds
    pub duration_ms: u64,
    /// Error message on failure
    pub error: Option<String>,
}

impl ExecutionResult {
    fn failed(error: &Error, duration_ms: u64) -> Self {
        Self {
            success: false,
            output: Value::Null,
            raw_output: String::new(),
            tokens_used: 0,
            cost_usd: 0.0,
            duration_ms,
            error: Some(error.to_string()),
        }
    }
}

/// Executes agent work units against pooled provider adapters.
pub struct AgentExecutor {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn ExecutionStore>,
    config: ExecutorConfig,
}

impl AgentExecutor {
    /// Create an executor.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, store: Arc<dyn ExecutionStore>) -> Self {
        Self {
            registry,
            store,
            config: ExecutorConfig::default(),
        }
    }

    /// Override the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute one unit of work.
    #[instrument(skip(self, input), fields(agent = %input.agent_name))]
    pub async fn execute(&self, input: ExecutionInput) -> ExecutionResult {
        let started = Instant::now();

        match self.try_execute(&input, started).await {
            Ok(result) => result,
            Err(error) => {
                // Best-effort failure increment; its own failure must not
                // mask the original error.
                self.record_failure(&input.agent_name, &error).await;
                ExecutionResult::failed(&error, started.elapsed().as_millis() as u64)
            }
        }
    }

    async fn try_execute(
        &self,
        input: &ExecutionInput,
        started: Instant,
    ) -> Result<ExecutionResult> {
        let agent = self
            .store
            .find_agent_by_name(&input.agent_name)
            .await?
            .ok_or_else(|| Error::UnknownAgent(input.agent_name.clone()))?;

        let model = self
            .store
            .find_model_with_pricing(agent.model_id)
            .await?
            .ok_or_else(|| Error::UnknownModel(agent.name.clone()))?;

        let adapter = self.registry.get_adapter(&model.credential)?;

        let mut request = CompletionRequest::new(&model.name)
            .with_messages(self.bounded_history(&input.history))
            .with_message(Message::user(&input.input));
        if let Some(system) = &agent.system_prompt {
            request = request.with_system(system.clone());
        }
        if let Some(temperature) = agent.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = agent.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = adapter.complete(request).await?;
        let breakdown = calculate_cost(&response.usage, &model.pricing);
        let duration_ms = started.elapsed().as_millis() as u64;

        debug!(
            model = %response.model,
            tokens = response.usage.total_tokens,
            cost_usd = breakdown.total_cost,
            "completion finished"
        );

        // Best-effort persistence: log and continue on failure.
        let exchange = ExchangeRecord {
            id: Uuid::new_v4(),
            agent_id: agent.id,
            session_id: input.session_id.clone(),
            input: input.input.clone(),
            output: response.content.clone(),
            tokens_used: response.usage.total_tokens,
            cost_usd: breakdown.total_cost,
            created_at: chrono::Utc::now(),
        };
        if let Err(e) = self.store.save_exchange(&exchange).await {
            warn!(agent = %agent.name, error = %e, "failed to save exchange");
        }
        if let Some(session_id) = &input.session_id {
            if let Err(e) = self
                .store
                .append_session_cost_delta(session_id, breakdown.total_cost)
                .await
            {
                warn!(session = %session_id, error = %e, "failed to append session cost");
            }
        }

        self.record_success(agent.id, &agent.name, response.usage.total_tokens)
            .await;

        Ok(ExecutionResult {
            success: true,
            output: parse_output(&response.content),
            raw_output: response.content,
            tokens_used: response.usage.total_tokens,
            cost_usd: breakdown.total_cost,
            duration_ms,
            error: None,
        })
    }

    async fn record_success(&self, agent_id: Uuid, agent_name: &str, tokens_used: u64) {
        match self.store.get_or_create_health_record(agent_id).await {
            Ok(mut record) => {
                record.record_success(tokens_used);
                if let Err(e) = self
                    .store
                    .increment_health_counters(agent_id, &record)
                    .await
                {
                    warn!(agent = %agent_name, error = %e, "failed to persist health record");
                }
            }
            Err(e) => {
                warn!(agent = %agent_name, error = %e, "failed to load health record");
            }
        }
    }

    async fn record_failure(&self, agent_name: &str, error: &Error) {
        let agent = match self.store.find_agent_by_name(agent_name).await {
            Ok(Some(agent)) => agent,
            Ok(None) => return,
            Err(e) => {
                warn!(agent = %agent_name, error = %e, "failed to resolve agent for health update");
                return;
            }
        };

        match self.store.get_or_create_health_record(agent.id).await {
            Ok(mut record) => {
                record.record_failure(error.to_string());
                if let Err(e) = self
                    .store
                    .increment_health_counters(agent.id, &record)
                    .await
                {
                    warn!(agent = %agent_name, error = %e, "failed to persist health record");
                }
            }
            Err(e) => {
                warn!(agent = %agent_name, error = %e, "failed to load health record");
            }
        }
    }

    fn bounded_history(&self, history: &[Message]) -> Vec<Message> {
        let start = history
            .len()
            .saturating_sub(self.config.max_history_messages);
        history[start..].to_vec()
    }
}

/// Parse a response body into structured output.
///
/// Tries the whole body as JSON, then a fenced ```json block, then gives up
/// and returns the raw text. Parse failure is not an error.
fn parse_output(content: &str) -> Value {
    if let Ok(value) = serde_json::from_str(content.trim()) {
        return value;
    }

    if let Some(fenced) = extract_json_fence(content) {
        if let Ok(value) = serde_json::from_str(fenced) {
            return value;
        }
    }

    Value::String(content.to_string())
}

fn extract_json_fence(content: &str) -> Option<&str> {
    let start = content.find("```json")? + "```json".len();
    let rest = &content[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthStatus;
    use crate::store::{AgentRecord, MemoryStore, ModelRecord};
    use janus_llm::{
        ClientPool, CompletionResponse, MockAdapter, PricingDescriptor, ProviderCredential,
        TokenUsage, Vendor,
    };

    struct Fixture {
        executor: AgentExecutor,
        store: Arc<MemoryStore>,
        adapter: Arc<MockAdapter>,
        agent_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let credential = ProviderCredential::new(Vendor::OpenAi, "sk-test");
        let registry = Arc::new(ProviderRegistry::new(Arc::new(ClientPool::default())));
        let adapter = Arc::new(MockAdapter::new());
        registry.register(&credential, adapter.clone());

        let store = Arc::new(MemoryStore::new());
        let model_id = Uuid::new_v4();
        let agent_id = Uuid::new_v4();
        store
            .insert_model(ModelRecord {
                id: model_id,
                name: "mock-model".to_string(),
                credential,
                pricing: PricingDescriptor::flat(3.0, 15.0),
            })
            .await;
        store
            .insert_agent(AgentRecord {
                id: agent_id,
                name: "support-bot".to_string(),
                model_id,
                system_prompt: Some("You are helpful".to_string()),
                temperature: Some(0.2),
                max_tokens: Some(512),
            })
            .await;

        Fixture {
            executor: AgentExecutor::new(registry, store.clone()),
            store,
            adapter,
            agent_id,
        }
    }

    fn response(content: &str, usage: TokenUsage) -> CompletionResponse {
        CompletionResponse {
            content: content.to_string(),
            model: "mock-model".to_string(),
            usage,
            finish_reason: Some("stop".to_string()),
            rate_limit: None,
        }
    }

    #[tokio::test]
    async fn test_success_path_accounts_tokens_and_cost() {
        let fx = fixture().await;
        fx.adapter
            .add_response(response("All good", TokenUsage::new(100, 50)));

        let result = fx
            .executor
            .execute(ExecutionInput::new("support-bot", "hello").with_session("s1"))
            .await;

        assert!(result.success);
        assert_eq!(result.tokens_used, 150);
        // 100/1e6*3 + 50/1e6*15 = 0.0003 + 0.00075
        assert!((result.cost_usd - 0.00105).abs() < 1e-9);
        assert_eq!(result.raw_output, "All good");

        // Exchange persisted with the same accounting.
        let exchanges = fx.store.exchanges().await;
        assert_eq!(exchanges.len(), 1);
        assert_eq!(exchanges[0].tokens_used, 150);
        assert_eq!(exchanges[0].session_id.as_deref(), Some("s1"));

        // Session cost accumulated.
        assert!((fx.store.session_cost("s1").await - 0.00105).abs() < 1e-9);

        // Health counters advanced, status untouched.
        let health = fx.store.health_record(fx.agent_id).await.unwrap();
        assert_eq!(health.total_requests, 1);
        assert_eq!(health.total_failures, 0);
        assert_eq!(health.total_tokens, 150);
        assert_eq!(health.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_vendor_failure_returns_failed_result() {
        let fx = fixture().await;
        fx.adapter
            .add_error(janus_llm::Error::vendor("openai", 500, "boom", None));

        let result = fx
            .executor
            .execute(ExecutionInput::new("support-bot", "hello"))
            .await;

        assert!(!result.success);
        assert_eq!(result.tokens_used, 0);
        assert_eq!(result.cost_usd, 0.0);
        assert!(result.error.as_deref().unwrap().contains("boom"));

        // Best-effort health update recorded the failure: 1/1 -> down.
        let health = fx.store.health_record(fx.agent_id).await.unwrap();
        assert_eq!(health.total_failures, 1);
        assert_eq!(health.status, HealthStatus::Down);
    }

    #[tokio::test]
    async fn test_unknown_agent_fails_without_panic() {
        let fx = fixture().await;

        let result = fx
            .executor
            .execute(ExecutionInput::new("missing", "hello"))
            .await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("unknown agent"));
    }

    #[tokio::test]
    async fn test_output_parsing_variants() {
        let fx = fixture().await;
        fx.adapter
            .add_response(response(r#"{"a":1}"#, TokenUsage::new(1, 1)));
        fx.adapter.add_response(response(
            "here is json ```json\n{\"a\":1}\n```",
            TokenUsage::new(1, 1),
        ));
        fx.adapter
            .add_response(response("plain text", TokenUsage::new(1, 1)));
        fx.adapter
            .add_response(response("{invalid", TokenUsage::new(1, 1)));

        let direct = fx
            .executor
            .execute(ExecutionInput::new("support-bot", "q"))
            .await;
        assert_eq!(direct.output, serde_json::json!({"a": 1}));

        let fenced = fx
            .executor
            .execute(ExecutionInput::new("support-bot", "q"))
            .await;
        assert_eq!(fenced.output, serde_json::json!({"a": 1}));

        let plain = fx
            .executor
            .execute(ExecutionInput::new("support-bot", "q"))
            .await;
        assert_eq!(plain.output, Value::String("plain text".to_string()));

        let invalid = fx
            .executor
            .execute(ExecutionInput::new("support-bot", "q"))
            .await;
        assert_eq!(invalid.output, Value::String("{invalid".to_string()));
        assert!(invalid.success);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let fx = fixture().await;
        let executor = fx.executor.with_config(ExecutorConfig {
            max_history_messages: 2,
        });

        let history: Vec<Message> = (0..10)
            .map(|i| Message::user(format!("message {i}")))
            .collect();

        let bounded = executor.bounded_history(&history);
        assert_eq!(bounded.len(), 2);
        assert_eq!(bounded[0].content, "message 8");
        assert_eq!(bounded[1].content, "message 9");
    }

    /// Store whose writes always fail; lookups work.
    struct FlakyStore {
        inner: Arc<MemoryStore>,
    }

    #[async_trait::async_trait]
    impl ExecutionStore for FlakyStore {
        async fn find_agent_by_name(&self, name: &str) -> crate::error::Result<Option<AgentRecord>> {
            self.inner.find_agent_by_name(name).await
        }

        async fn find_model_with_pricing(
            &self,
            model_id: Uuid,
        ) -> crate::error::Result<Option<ModelRecord>> {
            self.inner.find_model_with_pricing(model_id).await
        }

        async fn save_exchange(&self, _exchange: &ExchangeRecord) -> crate::error::Result<()> {
            Err(Error::Store("disk full".into()))
        }

        async fn get_or_create_health_record(
            &self,
            _agent_id: Uuid,
        ) -> crate::error::Result<crate::health::AgentHealthRecord> {
            Err(Error::Store("disk full".into()))
        }

        async fn increment_health_counters(
            &self,
            _agent_id: Uuid,
            _record: &crate::health::AgentHealthRecord,
        ) -> crate::error::Result<()> {
            Err(Error::Store("disk full".into()))
        }

        async fn append_session_cost_delta(
            &self,
            _session_id: &str,
            _delta_usd: f64,
        ) -> crate::error::Result<()> {
            Err(Error::Store("disk full".into()))
        }
    }

    #[tokio::test]
    async fn test_store_failures_never_fail_the_execution() {
        let fx = fixture().await;
        fx.adapter
            .add_response(response("fine", TokenUsage::new(10, 5)));

        let flaky = Arc::new(FlakyStore {
            inner: Arc::clone(&fx.store),
        });
        let credential = ProviderCredential::new(Vendor::OpenAi, "sk-test");
        let registry = Arc::new(ProviderRegistry::new(Arc::new(ClientPool::default())));
        registry.register(&credential, fx.adapter.clone());
        let executor = AgentExecutor::new(registry, flaky);

        let result = executor
            .execute(ExecutionInput::new("support-bot", "hello").with_session("s1"))
            .await;

        // Every write failed, the primary result is still a success.
        assert!(result.success);
        assert_eq!(result.tokens_used, 15);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_extract_json_fence() {
        assert_eq!(
            extract_json_fence("before ```json\n{\"a\":1}\n``` after"),
            Some("{\"a\":1}")
        );
        assert_eq!(extract_json_fence("no fence"), None);
        assert_eq!(extract_json_fence("```json never closed"), None);
    }
}
