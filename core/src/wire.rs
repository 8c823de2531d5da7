//! Wire shapes for queue payloads
//!
//! Two JSON shapes cross the broker boundary:
//!
//! - [`WireEvent`] — the inbound event message. Every field except
//!   `eventType` is optional; [`WireEvent::into_event`] fills the gaps.
//! - [`DeadLetterEnvelope`] — the outbound dead-letter record published
//!   when an event exhausts its retry budget.

use crate::error::ProcessError;
use crate::event::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Inbound event message as it appears on the queue
///
/// Lenient by design: producers routinely omit `eventId`, `aggregateId`,
/// `version`, and `occurredAt`. Only `eventType` is mandatory — without it
/// there is no strategy lookup and the message is malformed.
///
/// # Example
///
/// ```
/// use virta_core::WireEvent;
///
/// let wire: WireEvent =
///     serde_json::from_str(r#"{"eventType":"OrderCreated","data":{"customerId":"c1"}}"#)
///         .map_err(|e| e.to_string())?;
/// let event = wire.into_event();
///
/// assert_eq!(event.event_type, "OrderCreated");
/// assert_eq!(event.version, 1);
/// assert!(!event.id.is_empty());
/// # Ok::<(), String>(())
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEvent {
    /// Event id; generated if absent
    #[serde(default)]
    pub event_id: Option<String>,

    /// Type discriminator; the only mandatory field
    pub event_type: String,

    /// Aggregate id; generated if absent
    #[serde(default)]
    pub aggregate_id: Option<String>,

    /// Version; absent or 0 defaults to 1
    #[serde(default)]
    pub version: Option<u32>,

    /// Occurrence timestamp; defaults to processing time
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,

    /// Event-specific payload map
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl WireEvent {
    /// Convert to the canonical [`Event`], applying defaults
    ///
    /// - absent `eventId` / `aggregateId` → fresh UUID
    /// - absent or zero `version` → 1
    /// - absent `occurredAt` → now
    pub fn into_event(self) -> Event {
        Event {
            id: self
                .event_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            event_type: self.event_type,
            aggregate_id: self
                .aggregate_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            version: self.version.filter(|v| *v > 0).unwrap_or(1),
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
            payload: self.data,
        }
    }
}

/// Dead-letter record published for a permanently-failed event
///
/// Wire shape: `{ originalEvent: {...}, failureInfo: { errorMessage,
/// errorStack, retryCount, failedAt }, metadata: { canRetry: false } }`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterEnvelope {
    /// The event exactly as the pipeline saw it
    pub original_event: Event,
    /// What went wrong and when
    pub failure_info: FailureInfo,
    /// Reprocessing marker
    pub metadata: DeadLetterMetadata,
}

/// Failure details attached to a dead-letter record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureInfo {
    /// Display rendering of the terminal error
    pub error_message: String,
    /// Debug rendering of the terminal error (closest analog to a stack)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_stack: Option<String>,
    /// Attempts consumed before escalation
    pub retry_count: u32,
    /// When the escalation happened
    pub failed_at: DateTime<Utc>,
}

/// Dead-letter metadata block
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterMetadata {
    /// Always `false`: dead-lettered events are never auto-reprocessed
    pub can_retry: bool,
}

impl DeadLetterEnvelope {
    /// Build the envelope for a terminal failure
    pub fn new(event: Event, error: &ProcessError, retry_count: u32) -> Self {
        Self {
            original_event: event,
            failure_info: FailureInfo {
                error_message: error.to_string(),
                error_stack: Some(format!("{error:?}")),
                retry_count,
                failed_at: Utc::now(),
            },
            metadata: DeadLetterMetadata { can_retry: false },
        }
    }
}
