//! Agent health tracking
//!
//! Per-agent health record with a derived status. Status transitions are
//! driven by the cumulative failure rate:
//!
//!   rate > 0.5  -> Down
//!   rate > 0.2  -> Degraded
//!   otherwise   -> Healthy
//!
//! Status is recomputed on failure writes only. A success updates the
//! counters but leaves the status as-is until the next failed call's
//! recompute dilutes the rate. This mirrors the upstream behavior: a long
//! success streak after an outage does not restore the status on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived agent health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Failure rate at or below 20%
    #[default]
    Healthy,
    /// Failure rate above 20%
    Degraded,
    /// Failure rate above 50%
    Down,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Cumulative health record for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentHealthRecord {
    /// Derived status, recomputed on failure writes
    pub status: HealthStatus,
    /// Total requests observed
    pub total_requests: u64,
    /// Total failed requests
    pub total_failures: u64,
    /// Total tokens used across successful requests
    pub total_tokens: u64,
    /// Most recent error message
    pub last_error: Option<String>,
    /// When the record was last written
    pub last_checked_at: DateTime<Utc>,
}

impl Default for AgentHealthRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentHealthRecord {
    /// Fresh record with zero counters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: HealthStatus::Healthy,
            total_requests: 0,
            total_failures: 0,
            total_tokens: 0,
            last_error: None,
            last_checked_at: Utc::now(),
        }
    }

    /// Cumulative failure rate.
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        self.total_failures as f64 / self.total_requests.max(1) as f64
    }

    /// Record a successful call.
    ///
    /// Counters advance; the status is intentionally not recomputed here.
    pub fn record_success(&mut self, tokens_used: u64) {
        self.total_requests += 1;
        self.total_tokens += tokens_used;
        self.last_checked_at = Utc::now();
    }

    /// Record a failed call and recompute the status.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.total_requests += 1;
        self.total_failures += 1;
        self.last_error = Some(error.into());
        self.last_checked_at = Utc::now();

        let rate = self.failure_rate();
        self.status = if rate > 0.5 {
            HealthStatus::Down
        } else if rate > 0.2 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
    }
}
