//! Dead-letter escalation
//!
//! When the retry engine exhausts its attempts, the event is wrapped in a
//! [`DeadLetterEnvelope`] and published to the dead-letter exchange so an
//! operator can inspect or replay it. Escalation never fails from the
//! caller's point of view: a publish error is logged and the original
//! processing error is what propagates, not the dead-letter one.
//!
//! Every escalated event is also captured in an in-memory
//! [`DeadLetterStore`] bounded by capacity with oldest-first eviction.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use virta_core::{Broker, DeadLetterEnvelope, Event, ProcessError};

/// Default capacity for the in-memory store
pub const DEFAULT_STORE_CAPACITY: usize = 1000;

/// An escalated event with metadata about the terminal failure
#[derive(Debug, Clone)]
pub struct DeadLetterRecord {
    /// The event that exhausted its retries (cloned from the handler)
    pub event: Event,
    /// Terminal error message
    pub error: String,
    /// Attempts used before escalation
    pub retry_count: u32,
    /// When the escalation happened
    pub escalated_at: DateTime<Utc>,
}

/// In-memory store of escalated events for inspection or replay
pub struct DeadLetterStore {
    records: Mutex<VecDeque<DeadLetterRecord>>,
    capacity: usize,
    /// Metrics: total events ever captured
    total_captured: AtomicU64,
    /// Metrics: events dropped due to capacity
    total_dropped: AtomicU64,
}

impl DeadLetterStore {
    /// Create a new store with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            total_captured: AtomicU64::new(0),
            total_dropped: AtomicU64::new(0),
        }
    }

    /// Add an escalated event, evicting the oldest when at capacity
    pub fn push(&self, record: DeadLetterRecord) {
        let mut records = self.records.lock();
        if records.len() >= self.capacity {
            records.pop_front();
            self.total_dropped.fetch_add(1, Ordering::Relaxed);
        }
        records.push_back(record);
        self.total_captured.fetch_add(1, Ordering::Relaxed);
    }

    /// Drain up to n records for reprocessing
    pub fn drain(&self, n: usize) -> Vec<DeadLetterRecord> {
        let mut records = self.records.lock();
        let drain_count = n.min(records.len());
        records.drain(..drain_count).collect()
    }

    /// Peek at records without removing them
    pub fn peek(&self, n: usize) -> Vec<DeadLetterRecord> {
        let records = self.records.lock();
        records.iter().take(n).cloned().collect()
    }

    /// Current number of records held
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Total records ever captured
    pub fn total_captured(&self) -> u64 {
        self.total_captured.load(Ordering::Relaxed)
    }

    /// Total records dropped due to capacity
    pub fn total_dropped(&self) -> u64 {
        self.total_dropped.load(Ordering::Relaxed)
    }

    /// Remove all records
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

/// Publishes exhausted events to the dead-letter exchange
///
/// # Example
///
/// ```ignore
/// let escalator = DeadLetterEscalator::new(
///     broker.clone(),
///     "order.events.dlx",
///     "order.dead",
/// );
/// escalator.escalate(&event, &error, 3).await;
/// ```
pub struct DeadLetterEscalator {
    broker: Arc<dyn Broker>,
    exchange: String,
    routing_key: String,
    store: DeadLetterStore,
}

impl DeadLetterEscalator {
    /// Create an escalator targeting the given exchange and routing key
    pub fn new(
        broker: Arc<dyn Broker>,
        exchange: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Self {
        Self {
            broker,
            exchange: exchange.into(),
            routing_key: routing_key.into(),
            store: DeadLetterStore::new(DEFAULT_STORE_CAPACITY),
        }
    }

    /// Override the in-memory store capacity
    pub fn with_store_capacity(mut self, capacity: usize) -> Self {
        self.store = DeadLetterStore::new(capacity);
        self
    }

    /// In-memory record of everything escalated through this instance
    pub fn store(&self) -> &DeadLetterStore {
        &self.store
    }

    /// Escalate an event whose retries are exhausted
    ///
    /// Infallible: publish failures are logged and recorded, never surfaced.
    /// The caller re-raises the original processing error either way.
    pub async fn escalate(&self, event: &Event, error: &ProcessError, retry_count: u32) {
        self.store.push(DeadLetterRecord {
            event: event.clone(),
            error: error.to_string(),
            retry_count,
            escalated_at: Utc::now(),
        });

        let envelope = DeadLetterEnvelope::new(event.clone(), error, retry_count);
        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    event_id = %event.id,
                    error = %e,
                    "failed to serialize dead-letter envelope"
                );
                return;
            }
        };

        match self
            .broker
            .publish(&self.exchange, &self.routing_key, Bytes::from(payload))
            .await
        {
            Ok(()) => {
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    retry_count = retry_count,
                    exchange = %self.exchange,
                    "event dead-lettered"
                );
            }
            Err(e) => {
                tracing::error!(
                    event_id = %event.id,
                    error = %e,
                    exchange = %self.exchange,
                    "dead-letter publish failed, record kept in store only"
                );
            }
        }
    }
}
