//! The canonical order-lifecycle event
//!
//! [`Event`] is the unit of work flowing through the VIRTA pipeline. It is
//! created once by the message handler from the raw wire payload and never
//! mutated afterwards — every downstream component (batcher, strategies,
//! observers, dead-letter escalator) reads it through shared references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical event representing something that happened to an order
///
/// Serializes to the wire shape used on the queue:
/// `{ eventId, eventType, aggregateId, version, occurredAt, data }`.
///
/// Two events with the same `id` are the same logical occurrence. The id is
/// used for log correlation only — no deduplication is performed anywhere
/// in the pipeline.
///
/// # Example
///
/// ```
/// use virta_core::Event;
/// use serde_json::json;
///
/// let event = Event::new("OrderCreated", "order-1001")
///     .with_payload_field("customerId", json!("cust-42"))
///     .with_payload_field("totalAmount", json!(99.90));
///
/// assert_eq!(event.event_type, "OrderCreated");
/// assert_eq!(event.version, 1);
/// assert_eq!(event.payload_str("customerId"), Some("cust-42"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier (UUID-shaped), generated if absent on the wire
    #[serde(rename = "eventId")]
    pub id: String,

    /// Type discriminator ("OrderCreated", "OrderCancelled", ...)
    ///
    /// Drives strategy lookup, batch grouping, and observer interest
    /// filtering.
    #[serde(rename = "eventType")]
    pub event_type: String,

    /// Identifier of the business entity the event concerns
    #[serde(rename = "aggregateId")]
    pub aggregate_id: String,

    /// Positive schema/aggregate version, defaults to 1
    pub version: u32,

    /// When the event occurred; defaults to processing time if absent
    #[serde(rename = "occurredAt")]
    pub occurred_at: DateTime<Utc>,

    /// Open key-value map of event-specific data
    ///
    /// Not statically typed at this layer — consumers interpret it by
    /// convention per event type ("customerId", "totalAmount", "items", ...).
    #[serde(rename = "data", default)]
    pub payload: Map<String, Value>,
}

impl Event {
    /// Create an event with a generated id, version 1, and the current time
    pub fn new(event_type: impl Into<String>, aggregate_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: event_type.into(),
            aggregate_id: aggregate_id.into(),
            version: 1,
            occurred_at: Utc::now(),
            payload: Map::new(),
        }
    }

    /// Builder-style: replace the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder-style: set the version
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Builder-style: set the occurrence timestamp
    pub fn with_occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    /// Builder-style: replace the whole payload map
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    /// Builder-style: set one payload field
    pub fn with_payload_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Payload field as a string, if present and a string
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Payload field as an f64, if present and numeric
    pub fn payload_f64(&self, key: &str) -> Option<f64> {
        self.payload.get(key).and_then(Value::as_f64)
    }

    /// Payload field as an array, if present and an array
    pub fn payload_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.payload.get(key).and_then(Value::as_array)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_event_has_generated_id_and_defaults() {
        let event = Event::new("OrderCreated", "order-1");

        assert_eq!(event.id.len(), 36, "generated id should be UUID-shaped");
        assert_eq!(event.event_type, "OrderCreated");
        assert_eq!(event.aggregate_id, "order-1");
        assert_eq!(event.version, 1);
        assert!(event.payload.is_empty());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = Event::new("OrderCreated", "order-1");
        let b = Event::new("OrderCreated", "order-1");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn payload_accessors_read_typed_fields() {
        let event = Event::new("OrderCreated", "order-1")
            .with_payload_field("customerId", json!("cust-7"))
            .with_payload_field("totalAmount", json!(42.5))
            .with_payload_field("items", json!([{"sku": "A"}]));

        assert_eq!(event.payload_str("customerId"), Some("cust-7"));
        assert_eq!(event.payload_f64("totalAmount"), Some(42.5));
        assert_eq!(event.payload_array("items").map(Vec::len), Some(1));
    }

    #[test]
    fn payload_accessors_return_none_for_wrong_type() {
        let event =
            Event::new("OrderCreated", "order-1").with_payload_field("customerId", json!(123));

        assert_eq!(event.payload_str("customerId"), None);
        assert_eq!(event.payload_str("missing"), None);
        assert_eq!(event.payload_f64("customerId"), Some(123.0));
        assert!(event.payload_array("customerId").is_none());
    }

    #[test]
    fn serializes_to_wire_field_names() {
        let event = Event::new("OrderCreated", "order-9")
            .with_id("evt-1")
            .with_payload_field("customerId", json!("c1"));

        let wire = serde_json::to_value(&event).unwrap();

        assert_eq!(wire["eventId"], "evt-1");
        assert_eq!(wire["eventType"], "OrderCreated");
        assert_eq!(wire["aggregateId"], "order-9");
        assert_eq!(wire["version"], 1);
        assert!(wire["occurredAt"].is_string());
        assert_eq!(wire["data"]["customerId"], "c1");
    }

    #[test]
    fn event_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Event>();
    }
}
