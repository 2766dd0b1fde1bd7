use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle marker for a workflow step or run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowEventKind {
    /// Step started
    Started,
    /// Step completed
    Completed,
    /// Step failed
    Failed,
    /// The run itself errored outside any step
    RunError,
}

/// One event delivered to run observers.
///
/// The sequence number is unique and strictly increasing per run, assigned
/// by the broadcaster at delivery time, never by the producer. It exists so
/// a reconnecting observer can detect gaps and duplicates; it carries no
/// other meaning. The payload is a truncated output preview, a token/cost
/// summary, or error text, depending on the kind.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowEvent {
    /// Run this event belongs to
    pub run_id: String,
    /// Step name (empty for run-level events)
    pub step: String,
    /// Lifecycle marker
    #[serde(rename = "type")]
    pub kind: WorkflowEventKind,
    /// When the event was broadcast
    pub timestamp: DateTime<Utc>,
    /// Step duration in milliseconds, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Event payload
    pub payload: serde_json::Value,
    /// Per-run sequence number, assigned at broadcast
    pub sequence: u64,
}

/// Event content handed to [`broadcast`](super::RunBroadcaster::broadcast);
/// the broadcaster stamps the timestamp and sequence.
#[derive(Debug, Clone)]
pub struct EventDraft {
    /// Step name (empty for run-level events)
    pub step: String,
    /// Lifecycle marker
    pub kind: WorkflowEventKind,
    /// Step duration in milliseconds, when known
    pub duration_ms: Option<u64>,
    /// Event payload
    pub payload: serde_json::Value,
}

impl EventDraft {
    /// Create a draft with an empty payload.
    #[must_use]
    pub fn new(step: impl Into<String>, kind: WorkflowEventKind) -> Self {
        Self {
            step: step.into(),
            kind,
            duration_ms: None,
            payload: serde_json::Value::Null,
        }
    }

    /// Set the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Set the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
