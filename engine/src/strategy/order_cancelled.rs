//! Order cancellation strategy
//!
//! Runs `OrderCancelled` events through four ordered stages: validate,
//! restore-inventory, refund-payment, notify-cancellation. Stage semantics
//! mirror [`OrderCreatedStrategy`](super::OrderCreatedStrategy).

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use virta_core::{Event, ProcessError, ProcessingStrategy};

/// Simulated downstream latency per stage
const STAGE_LATENCY: Duration = Duration::from_millis(10);

/// Unwinds cancelled orders: inventory back, money back, customer told
pub struct OrderCancelledStrategy {
    /// Metrics: cancellations fully processed
    cancelled: AtomicU64,
}

impl OrderCancelledStrategy {
    /// Create the strategy
    pub fn new() -> Self {
        Self {
            cancelled: AtomicU64::new(0),
        }
    }

    /// Cancellations that made it through every stage
    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn validate(&self, event: &Event) -> Result<(), ProcessError> {
        if event.payload_str("reason").map_or(true, str::is_empty) {
            return Err(ProcessError::Validation(
                "missing cancellation reason".into(),
            ));
        }

        // refundAmount is optional; when present it must not be negative
        if let Some(refund) = event.payload_f64("refundAmount") {
            if refund < 0.0 {
                return Err(ProcessError::Validation(
                    "refundAmount must not be negative".into(),
                ));
            }
        }

        Ok(())
    }

    async fn restore_inventory(&self, event: &Event) -> Result<(), ProcessError> {
        tokio::time::sleep(STAGE_LATENCY).await;
        tracing::debug!(event_id = %event.id, "inventory restored");
        Ok(())
    }

    async fn refund_payment(&self, event: &Event) -> Result<(), ProcessError> {
        tokio::time::sleep(STAGE_LATENCY).await;
        let refund = event.payload_f64("refundAmount").unwrap_or(0.0);
        tracing::debug!(event_id = %event.id, refund, "payment refunded");
        Ok(())
    }

    async fn notify_cancellation(&self, event: &Event) -> Result<(), ProcessError> {
        tokio::time::sleep(STAGE_LATENCY).await;
        tracing::info!(
            event_id = %event.id,
            aggregate_id = %event.aggregate_id,
            "cancellation processed"
        );
        Ok(())
    }
}

impl Default for OrderCancelledStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessingStrategy for OrderCancelledStrategy {
    fn name(&self) -> &'static str {
        "order-cancelled"
    }

    fn can_handle(&self, event_type: &str) -> bool {
        event_type == "OrderCancelled"
    }

    async fn process(&self, event: &Event) -> Result<(), ProcessError> {
        self.validate(event)?;
        self.restore_inventory(event).await?;
        self.refund_payment(event).await?;
        self.notify_cancellation(event).await?;
        self.cancelled.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
