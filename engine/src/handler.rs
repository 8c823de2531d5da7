//! Message handler pipeline
//!
//! The unit registered with the broker consumer. `handle` parses the raw
//! payload into a canonical [`Event`], then runs the composite path of
//! structural validation, batch submission and observer notification under
//! the retry engine. The returned result drives the broker's delivery
//! decision: `Ok` acks, `Err` rejects without requeue, because retrying
//! and dead-lettering already happened in here.
//!
//! Parse failures are the one path outside the retry loop. A payload that
//! is not a JSON event can never become one, so it is rejected immediately
//! as [`ProcessError::Malformed`] with nothing to escalate.
//!
//! Errors surfacing from `submit` are retried without inspecting their
//! kind, so a deterministic validation failure consumes the full attempt
//! budget before it dead-letters. The waste is bounded by `max_attempts`
//! and keeps the retry engine free of error-classification rules.

use crate::batch::BatchAggregator;
use crate::observer::ObserverSet;
use crate::retry::RetryRunner;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use virta_core::{Event, EventHandler, ProcessError, WireEvent};

/// Retry-wrapped composite handler for one queue subscription
///
/// # Example
///
/// ```ignore
/// let handler = Arc::new(PipelineHandler::new(retry, aggregator, observers));
/// broker.register_handler("order-processing", handler).await?;
/// ```
pub struct PipelineHandler {
    retry: Arc<RetryRunner>,
    batches: Arc<BatchAggregator>,
    observers: Arc<ObserverSet>,
}

impl PipelineHandler {
    /// Wire the handler from its collaborators
    pub fn new(
        retry: Arc<RetryRunner>,
        batches: Arc<BatchAggregator>,
        observers: Arc<ObserverSet>,
    ) -> Self {
        Self {
            retry,
            batches,
            observers,
        }
    }

    /// One attempt of the composite path
    async fn process_event(&self, event: &Event) -> Result<(), ProcessError> {
        if event.event_type.is_empty() {
            return Err(ProcessError::Validation("missing eventType".into()));
        }

        self.batches.submit(event).await?;
        self.observers.notify(event).await;
        Ok(())
    }
}

#[async_trait]
impl EventHandler for PipelineHandler {
    async fn handle(&self, payload: Bytes) -> Result<(), ProcessError> {
        let wire: WireEvent = serde_json::from_slice(&payload)
            .map_err(|e| ProcessError::Malformed(e.to_string()))?;
        let event = wire.into_event();

        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            aggregate_id = %event.aggregate_id,
            "handling event"
        );

        let context = format!("handle {}", event.event_type);
        self.retry
            .execute_with_retry(|| self.process_event(&event), &context, Some(&event))
            .await
    }
}
