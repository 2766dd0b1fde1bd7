//! Janus Core - agent execution engine
//!
//! Ties the janus-llm provider layer together around one "execute a unit of
//! work" call, and streams run lifecycle events to observers:
//! - Executor: resolve agent/model, complete, price, persist, track health
//! - Health: failure-rate driven agent status
//! - Store: persistence boundary (trait + in-memory implementation)
//! - Events: per-run sequence-numbered pub/sub broadcasting

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod executor;
pub mod health;
pub mod store;

pub use error::{Error, Result};
pub use events::{EventDraft, RunBroadcaster, Subscription, WorkflowEvent, WorkflowEventKind};
pub use executor::{AgentExecutor, ExecutionInput, ExecutionResult, ExecutorConfig};
pub use health::{AgentHealthRecord, HealthStatus};
pub use store::{AgentRecord, ExchangeRecord, ExecutionStore, MemoryStore, ModelRecord};
