//! Power-user example — programmatic configuration, JSON logs.
//!
//! ```bash
//! cargo run -p virta-runtime --example custom_runtime
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use virta_runtime::prelude::*;

/// Broker that connects and then sits idle until shutdown.
struct IdleBroker;

#[async_trait]
impl Broker for IdleBroker {
    fn name(&self) -> &'static str {
        "idle"
    }

    async fn connect(&self) -> Result<(), ProcessError> {
        Ok(())
    }

    async fn register_handler(
        &self,
        _queue: &str,
        _handler: Arc<dyn EventHandler>,
    ) -> Result<(), ProcessError> {
        Ok(())
    }

    async fn consume(&self) -> Result<(), ProcessError> {
        Ok(())
    }

    async fn publish(
        &self,
        _exchange: &str,
        _routing_key: &str,
        _payload: Bytes,
    ) -> Result<(), ProcessError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ProcessError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    RuntimeBuilder::new()
        .config(Config {
            batch_size: 2,
            batch_interval_ms: 2_000,
            log_format: LogFormat::Json,
            ..Config::default()
        })
        .configure(|pipeline| async move {
            Ok(pipeline
                .broker(Arc::new(IdleBroker))
                .strategy("OrderCreated", OrderCreatedStrategy::new()))
        })
        .await
}
