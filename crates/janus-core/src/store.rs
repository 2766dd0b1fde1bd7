//! Persistence boundary
//!
//! The relational layer that owns agent, model, exchange and health records
//! lives outside this crate; [`ExecutionStore`] is the contract the executor
//! calls through. Every method is fallible I/O; the executor treats writes
//! as best-effort side effects whose failure never corrupts in-memory state.
//!
//! [`MemoryStore`] is the in-memory implementation used by tests and
//! embedders without a database.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::health::AgentHealthRecord;
use janus_llm::{PricingDescriptor, ProviderCredential};

/// A configured agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Stable identifier
    pub id: Uuid,
    /// Unique agent name
    pub name: String,
    /// Model this agent runs on
    pub model_id: Uuid,
    /// System prompt applied to every call
    pub system_prompt: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Output token cap
    pub max_tokens: Option<u32>,
}

/// A configured model with its credential and pricing.
#[derive(Debug, Clone)]
pub struct ModelRecord {
    /// Stable identifier
    pub id: Uuid,
    /// Vendor-facing model name
    pub name: String,
    /// Credential used to reach the vendor
    pub credential: ProviderCredential,
    /// Pricing used for cost calculation
    pub pricing: PricingDescriptor,
}

/// One persisted prompt/response exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRecord {
    /// Stable identifier
    pub id: Uuid,
    /// Agent that served the exchange
    pub agent_id: Uuid,
    /// Session the exchange belongs to, when any
    pub session_id: Option<String>,
    /// User input
    pub input: String,
    /// Model output (raw text)
    pub output: String,
    /// Total tokens used
    pub tokens_used: u64,
    /// Cost in USD
    pub cost_usd: f64,
    /// When the exchange completed
    pub created_at: DateTime<Utc>,
}

/// Persistence operations consumed by the executor.
#[async_trait::async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Look up an agent by its unique name.
    async fn find_agent_by_name(&self, name: &str) -> Result<Option<AgentRecord>>;

    /// Look up a model (with credential and pricing) by id.
    async fn find_model_with_pricing(&self, model_id: Uuid) -> Result<Option<ModelRecord>>;

    /// Persist one exchange.
    async fn save_exchange(&self, exchange: &ExchangeRecord) -> Result<()>;

    /// Fetch the agent's health record, creating a fresh one if absent.
    async fn get_or_create_health_record(&self, agent_id: Uuid) -> Result<AgentHealthRecord>;

    /// Persist updated health counters for an agent.
    async fn increment_health_counters(
        &self,
        agent_id: Uuid,
        record: &AgentHealthRecord,
    ) -> Result<()>;

    /// Add a cost delta to a session's running total.
    async fn append_session_cost_delta(&self, session_id: &str, delta_usd: f64) -> Result<()>;
}

/// In-memory [`ExecutionStore`] for tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryStore {
    agents: RwLock<HashMap<String, AgentRecord>>,
    models: RwLock<HashMap<Uuid, ModelRecord>>,
    exchanges: RwLock<Vec<ExchangeRecord>>,
    health: RwLock<HashMap<Uuid, AgentHealthRecord>>,
    session_costs: RwLock<HashMap<String, f64>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an agent.
    pub async fn insert_agent(&self, agent: AgentRecord) {
        self.agents.write().await.insert(agent.name.clone(), agent);
    }

    /// Insert a model.
    pub async fn insert_model(&self, model: ModelRecord) {
        self.models.write().await.insert(model.id, model);
    }

    /// All exchanges saved so far.
    pub async fn exchanges(&self) -> Vec<ExchangeRecord> {
        self.exchanges.read().await.clone()
    }

    /// Running cost total for a session.
    pub async fn session_cost(&self, session_id: &str) -> f64 {
        self.session_costs
            .read()
            .await
            .get(session_id)
            .copied()
            .unwrap_or(0.0)
    }

    /// Current health record for an agent, if one was written.
    pub async fn health_record(&self, agent_id: Uuid) -> Option<AgentHealthRecord> {
        self.health.read().await.get(&agent_id).cloned()
    }
}

#[async_trait::async_trait]
impl ExecutionStore for MemoryStore {
    async fn find_agent_by_name(&self, name: &str) -> Result<Option<AgentRecord>> {
        Ok(self.agents.read().await.get(name).cloned())
    }

    async fn find_model_with_pricing(&self, model_id: Uuid) -> Result<Option<ModelRecord>> {
        Ok(self.models.read().await.get(&model_id).cloned())
    }

    async fn save_exchange(&self, exchange: &ExchangeRecord) -> Result<()> {
        self.exchanges.write().await.push(exchange.clone());
        Ok(())
    }

    async fn get_or_create_health_record(&self, agent_id: Uuid) -> Result<AgentHealthRecord> {
        let mut health = self.health.write().await;
        Ok(health
            .entry(agent_id)
            .or_insert_with(AgentHealthRecord::new)
            .clone())
    }

    async fn increment_health_counters(
        &self,
        agent_id: Uuid,
        record: &AgentHealthRecord,
    ) -> Result<()> {
        self.health.write().await.insert(agent_id, record.clone());
        Ok(())
    }

    async fn append_session_cost_delta(&self, session_id: &str, delta_usd: f64) -> Result<()> {
        let mut costs = self.session_costs.write().await;
        *costs.entry(session_id.to_string()).or_insert(0.0) += delta_usd;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use janus_llm::Vendor;

    fn sample_model() -> ModelRecord {
        ModelRecord {
            id: Uuid::new_v4(),
            name: "mock-model".to_string(),
            credential: ProviderCredential::new(Vendor::OpenAi, "sk-test"),
            pricing: PricingDescriptor::flat(1.0, 2.0),
        }
    }

    #[tokio::test]
    async fn test_agent_lookup_by_name() {
        let store = MemoryStore::new();
        let model = sample_model();
        store
            .insert_agent(AgentRecord {
                id: Uuid::new_v4(),
                name: "support-bot".to_string(),
                model_id: model.id,
                system_prompt: None,
                temperature: None,
                max_tokens: None,
            })
            .await;

        assert!(store
            .find_agent_by_name("support-bot")
            .await
            .unwrap()
            .is_some());
        assert!(store.find_agent_by_name("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_health_record_created_on_first_access() {
        let store = MemoryStore::new();
        let agent_id = Uuid::new_v4();

        let record = store.get_or_create_health_record(agent_id).await.unwrap();
        assert_eq!(record.total_requests, 0);

        let mut updated = record;
        updated.record_failure("boom");
        store
            .increment_health_counters(agent_id, &updated)
            .await
            .unwrap();

        let persisted = store.health_record(agent_id).await.unwrap();
        assert_eq!(persisted.total_failures, 1);
    }

    #[tokio::test]
    async fn test_session_cost_accumulates() {
        let store = MemoryStore::new();
        store.append_session_cost_delta("s1", 0.25).await.unwrap();
        store.append_session_cost_delta("s1", 0.50).await.unwrap();
        store.append_session_cost_delta("s2", 1.00).await.unwrap();

        assert!((store.session_cost("s1").await - 0.75).abs() < 1e-9);
        assert!((store.session_cost("s2").await - 1.00).abs() < 1e-9);
    }
}
