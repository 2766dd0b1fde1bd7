use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::warn;

use super::types::{EventDraft, WorkflowEvent};

type Callback = Arc<dyn Fn(&WorkflowEvent) + Send + Sync>;

#[derive(Default)]
struct RunChannel {
    subscribers: HashMap<u64, Callback>,
    next_subscriber_id: u64,
    sequence: u64,
}

/// Token identifying one registered callback; pass it back to
/// [`RunBroadcaster::unsubscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    run_id: String,
    id: u64,
}

impl Subscription {
    /// Run this subscription observes.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// Per-run pub/sub registry with broadcast-assigned sequence numbers.
///
/// Subscriber callbacks run synchronously during `broadcast`, each wrapped
/// so one observer's panic cannot block delivery to the rest. The registry
/// map lock is held only for lookups; the per-run lock spans sequence
/// assignment plus fan-out so observers see events in sequence order.
///
/// There is no automatic cleanup: callers must [`clear`](Self::clear) a run
/// when it reaches a terminal state or the subscriber sets and counters
/// accumulate for the life of the process.
#[derive(Default)]
pub struct RunBroadcaster {
    runs: Mutex<HashMap<String, Arc<Mutex<RunChannel>>>>,
}

impl RunBroadcaster {
    /// Create an empty broadcaster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, run_id: &str) -> Option<Arc<Mutex<RunChannel>>> {
        let runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        runs.get(run_id).cloned()
    }

    /// Register a callback for a run's events.
    ///
    /// Allocates the run's sequence counter on first subscription.
    pub fn subscribe(
        &self,
        run_id: &str,
        callback: impl Fn(&WorkflowEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let channel = {
            let mut runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(runs.entry(run_id.to_string()).or_default())
        };

        let mut channel = channel.lock().unwrap_or_else(|e| e.into_inner());
        let id = channel.next_subscriber_id;
        channel.next_subscriber_id += 1;
        channel.subscribers.insert(id, Arc::new(callback));

        Subscription {
            run_id: run_id.to_string(),
            id,
        }
    }

    /// Remove one subscription. The run's sequence counter survives until
    /// [`clear`](Self::clear).
    pub fn unsubscribe(&self, subscription: &Subscription) {
        if let Some(channel) = self.channel(&subscription.run_id) {
            let mut channel = channel.lock().unwrap_or_else(|e| e.into_inner());
            channel.subscribers.remove(&subscription.id);
        }
    }

    /// Stamp and deliver an event to every current subscriber of a run.
    ///
    /// Cheap to call speculatively: with zero subscribers this is a no-op
    /// and the sequence counter does not advance. Returns the assigned
    /// sequence number when the event was delivered.
    pub fn broadcast(&self, run_id: &str, draft: EventDraft) -> Option<u64> {
        let channel = self.channel(run_id)?;
        let mut channel = channel.lock().unwrap_or_else(|e| e.into_inner());
        if channel.subscribers.is_empty() {
            return None;
        }

        channel.sequence += 1;
        let event = WorkflowEvent {
            run_id: run_id.to_string(),
            step: draft.step,
            kind: draft.kind,
            timestamp: Utc::now(),
            duration_ms: draft.duration_ms,
            payload: draft.payload,
            sequence: channel.sequence,
        };

        // Per-subscriber isolation: one panicking observer must not starve
        // the rest, so each callback gets its own catch_unwind.
        for (id, callback) in &channel.subscribers {
            let result = catch_unwind(AssertUnwindSafe(|| callback(&event)));
            if result.is_err() {
                warn!(
                    run_id = %run_id,
                    subscriber = id,
                    sequence = event.sequence,
                    "subscriber callback panicked; continuing delivery"
                );
            }
        }

        Some(event.sequence)
    }

    /// Drop all subscribers and the sequence counter for a run.
    ///
    /// Must be called when a run reaches a terminal state.
    pub fn clear(&self, run_id: &str) {
        let mut runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        runs.remove(run_id);
    }

    /// Last assigned sequence number for a run (0 before any delivery).
    #[must_use]
    pub fn sequence(&self, run_id: &str) -> u64 {
        self.channel(run_id).map_or(0, |channel| {
            channel.lock().unwrap_or_else(|e| e.into_inner()).sequence
        })
    }

    /// Current subscriber count for a run.
    #[must_use]
    pub fn subscriber_count(&self, run_id: &str) -> usize {
        self.channel(run_id).map_or(0, |channel| {
            channel
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .subscribers
                .len()
        })
    }
}
