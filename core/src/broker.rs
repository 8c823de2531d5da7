//! Broker abstraction
//!
//! The [`Broker`] trait is the seam between the processing core and the
//! queue infrastructure. VIRTA only ever talks to this trait — connection
//! and channel management, exchange/queue declaration, and the actual
//! ack/nack mechanics live in the implementation.

use crate::error::ProcessError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Per-message handler registered with a broker queue
///
/// The handler's return value drives the broker's acknowledgement:
///
/// * `Ok(())` — acknowledge the message
/// * `Err(_)` — reject **without requeue**; retry already happened inside
///   the pipeline and the event was dead-lettered if it exhausted attempts
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one raw delivery payload
    async fn handle(&self, payload: Bytes) -> Result<(), ProcessError>;
}

/// Broker trait - queue transport consumed at its interface boundary
///
/// # Implementation Requirements
///
/// - Implementations must be `Send + Sync`; the pipeline shares them via
///   `Arc` between the consumer path and the dead-letter publisher
/// - `consume` starts delivering to the registered handlers and returns;
///   delivery happens on the implementation's own tasks
/// - After `disconnect` returns, no handler invocation may still be in
///   flight — the pipeline relies on this for its graceful-shutdown drain
///
/// # Example
///
/// ```ignore
/// use virta_core::{Broker, EventHandler, ProcessError};
///
/// async fn wire(broker: &dyn Broker, handler: std::sync::Arc<dyn EventHandler>) -> Result<(), ProcessError> {
///     broker.connect().await?;
///     broker.register_handler("order-processing", handler).await?;
///     broker.consume().await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait Broker: Send + Sync {
    /// Returns the broker's name for identification and logging
    fn name(&self) -> &'static str;

    /// Establish the connection and any channels it needs
    async fn connect(&self) -> Result<(), ProcessError>;

    /// Register a handler for deliveries on `queue`
    ///
    /// Replaces any previous handler for the same queue.
    async fn register_handler(
        &self,
        queue: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), ProcessError>;

    /// Start consuming on all registered queues
    async fn consume(&self) -> Result<(), ProcessError>;

    /// Publish a payload to an exchange with a routing key
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Bytes,
    ) -> Result<(), ProcessError>;

    /// Stop consuming and close the connection
    ///
    /// Must not return while a delivery is mid-handler.
    async fn disconnect(&self) -> Result<(), ProcessError>;
}
