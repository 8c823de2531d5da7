//! Audit trail observer

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use virta_core::{Event, EventObserver, ProcessError};

/// Logs one structured line per event, for every event type
pub struct AuditTrailObserver {
    recorded: AtomicU64,
}

impl AuditTrailObserver {
    /// Create the observer
    pub fn new() -> Self {
        Self {
            recorded: AtomicU64::new(0),
        }
    }

    /// Events recorded so far
    pub fn recorded(&self) -> u64 {
        self.recorded.load(Ordering::Relaxed)
    }
}

impl Default for AuditTrailObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventObserver for AuditTrailObserver {
    fn name(&self) -> &'static str {
        "audit-trail"
    }

    fn interested_in(&self, _event_type: &str) -> bool {
        true
    }

    async fn on_event(&self, event: &Event) -> Result<(), ProcessError> {
        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            aggregate_id = %event.aggregate_id,
            version = event.version,
            occurred_at = %event.occurred_at.to_rfc3339(),
            "audit"
        );
        self.recorded.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
