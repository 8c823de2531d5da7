//! Order creation strategy
//!
//! Runs `OrderCreated` events through five ordered stages: validate,
//! check-availability, reserve-inventory, authorize-payment, confirm-order.
//! A later stage never starts before the previous one completed; the first
//! failing stage aborts the rest and its error propagates to the caller.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use virta_core::{Event, ProcessError, ProcessingStrategy};

/// Simulated downstream latency per stage
const STAGE_LATENCY: Duration = Duration::from_millis(10);

/// Confirms new orders after availability, inventory and payment checks
pub struct OrderCreatedStrategy {
    /// Metrics: orders fully confirmed
    confirmed: AtomicU64,
}

impl OrderCreatedStrategy {
    /// Create the strategy
    pub fn new() -> Self {
        Self {
            confirmed: AtomicU64::new(0),
        }
    }

    /// Orders that made it through every stage
    pub fn confirmed(&self) -> u64 {
        self.confirmed.load(Ordering::Relaxed)
    }

    /// Required-field checks on the order payload
    ///
    /// Each rejection carries its own message so an operator can tell from
    /// the dead-letter entry which field was at fault.
    fn validate(&self, event: &Event) -> Result<(), ProcessError> {
        if event.payload_str("customerId").map_or(true, str::is_empty) {
            return Err(ProcessError::Validation("missing customerId".into()));
        }

        match event.payload_f64("totalAmount") {
            Some(total) if total > 0.0 => {}
            _ => {
                return Err(ProcessError::Validation(
                    "totalAmount must be a positive number".into(),
                ));
            }
        }

        match event.payload_array("items") {
            Some(items) if !items.is_empty() => {}
            _ => {
                return Err(ProcessError::Validation(
                    "order must contain at least one item".into(),
                ));
            }
        }

        Ok(())
    }

    async fn check_availability(&self, event: &Event) -> Result<(), ProcessError> {
        tokio::time::sleep(STAGE_LATENCY).await;
        tracing::debug!(event_id = %event.id, "availability checked");
        Ok(())
    }

    async fn reserve_inventory(&self, event: &Event) -> Result<(), ProcessError> {
        tokio::time::sleep(STAGE_LATENCY).await;
        tracing::debug!(event_id = %event.id, "inventory reserved");
        Ok(())
    }

    async fn authorize_payment(&self, event: &Event) -> Result<(), ProcessError> {
        tokio::time::sleep(STAGE_LATENCY).await;
        tracing::debug!(event_id = %event.id, "payment authorized");
        Ok(())
    }

    async fn confirm_order(&self, event: &Event) -> Result<(), ProcessError> {
        tokio::time::sleep(STAGE_LATENCY).await;
        tracing::info!(
            event_id = %event.id,
            aggregate_id = %event.aggregate_id,
            "order confirmed"
        );
        Ok(())
    }
}

impl Default for OrderCreatedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessingStrategy for OrderCreatedStrategy {
    fn name(&self) -> &'static str {
        "order-created"
    }

    fn can_handle(&self, event_type: &str) -> bool {
        event_type == "OrderCreated"
    }

    async fn process(&self, event: &Event) -> Result<(), ProcessError> {
        self.validate(event)?;
        self.check_availability(event).await?;
        self.reserve_inventory(event).await?;
        self.authorize_payment(event).await?;
        self.confirm_order(event).await?;
        self.confirmed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_order_event() -> Event {
        Event::new("OrderCreated", "order-123")
            .with_payload_field("customerId", json!("cust-9"))
            .with_payload_field("totalAmount", json!(59.90))
            .with_payload_field("items", json!([{ "sku": "SKU-1", "quantity": 2 }]))
    }

    #[tokio::test(start_paused = true)]
    async fn valid_order_runs_all_stages() {
        let strategy = OrderCreatedStrategy::new();

        let result = strategy.process(&valid_order_event()).await;

        assert!(result.is_ok());
        assert_eq!(strategy.confirmed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_customer_id_is_rejected() {
        let strategy = OrderCreatedStrategy::new();
        let event = Event::new("OrderCreated", "order-123")
            .with_payload_field("totalAmount", json!(10.0))
            .with_payload_field("items", json!([{ "sku": "SKU-1" }]));

        let err = strategy.process(&event).await.unwrap_err();

        assert_eq!(err, ProcessError::Validation("missing customerId".into()));
        assert_eq!(strategy.confirmed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn non_positive_total_is_rejected() {
        let strategy = OrderCreatedStrategy::new();

        for bad_total in [json!(0), json!(-5.0), json!("free")] {
            let event = valid_order_event().with_payload_field("totalAmount", bad_total);
            let err = strategy.process(&event).await.unwrap_err();
            assert_eq!(
                err,
                ProcessError::Validation("totalAmount must be a positive number".into())
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn missing_or_empty_items_are_rejected() {
        let strategy = OrderCreatedStrategy::new();

        let no_items = Event::new("OrderCreated", "order-123")
            .with_payload_field("customerId", json!("cust-9"))
            .with_payload_field("totalAmount", json!(10.0));
        let empty_items = valid_order_event().with_payload_field("items", json!([]));

        for event in [no_items, empty_items] {
            let err = strategy.process(&event).await.unwrap_err();
            assert_eq!(
                err,
                ProcessError::Validation("order must contain at least one item".into())
            );
        }
    }

    #[test]
    fn handles_only_order_created() {
        let strategy = OrderCreatedStrategy::new();
        assert!(strategy.can_handle("OrderCreated"));
        assert!(!strategy.can_handle("OrderCancelled"));
    }
}
