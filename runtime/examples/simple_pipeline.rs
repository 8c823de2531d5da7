//! Minimal VIRTA pipeline — demonstrates the runtime API.
//!
//! Feeds a few canned order events through an in-memory broker, then waits
//! for ctrl-c.
//!
//! ```bash
//! cargo run -p virta-runtime --example simple_pipeline
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use virta_runtime::prelude::*;

/// In-memory broker that delivers a few canned events once consumption starts.
struct DemoBroker {
    handler: Mutex<Option<Arc<dyn EventHandler>>>,
}

impl DemoBroker {
    fn new() -> Self {
        Self {
            handler: Mutex::new(None),
        }
    }

    fn order_created(n: u32) -> Bytes {
        let payload = serde_json::json!({
            "eventId": format!("demo-{n}"),
            "eventType": "OrderCreated",
            "aggregateId": format!("order-{n}"),
            "data": {
                "customerId": "cust-42",
                "totalAmount": 19.90 * f64::from(n),
                "items": [{"sku": "sku-1", "quantity": n}]
            }
        });
        Bytes::from(payload.to_string())
    }
}

#[async_trait]
impl Broker for DemoBroker {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn connect(&self) -> Result<(), ProcessError> {
        Ok(())
    }

    async fn register_handler(
        &self,
        _queue: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), ProcessError> {
        *self.handler.lock() = Some(handler);
        Ok(())
    }

    async fn consume(&self) -> Result<(), ProcessError> {
        let Some(handler) = self.handler.lock().clone() else {
            return Err(ProcessError::Broker("no handler registered".into()));
        };
        tokio::spawn(async move {
            for n in 1..=3 {
                match handler.handle(Self::order_created(n)).await {
                    Ok(()) => tracing::info!(n, "demo event acked"),
                    Err(e) => tracing::warn!(n, error = %e, "demo event rejected"),
                }
            }
        });
        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Bytes,
    ) -> Result<(), ProcessError> {
        tracing::info!(exchange, routing_key, bytes = payload.len(), "demo publish");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ProcessError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    virta_runtime::run(|pipeline| async move {
        Ok(pipeline
            .broker(Arc::new(DemoBroker::new()))
            .strategy("OrderCreated", OrderCreatedStrategy::new())
            .strategy("OrderCancelled", OrderCancelledStrategy::new())
            .observer(AuditTrailObserver::new()))
    })
    .await
}
