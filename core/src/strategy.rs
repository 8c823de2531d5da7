//! Processing strategy trait
//!
//! A [`ProcessingStrategy`] performs the actual multi-step business
//! processing for one or more event types. The batch aggregator looks the
//! strategy up by event type when a batch flushes and feeds it the batch's
//! events in submission order.

use crate::error::ProcessError;
use crate::event::Event;
use async_trait::async_trait;

/// Strategy trait - processes events of the types it handles
///
/// Each strategy owns the processing stages for its event types. Stages run
/// strictly in order inside [`process`](ProcessingStrategy::process); a
/// failing stage aborts the rest and the error propagates to the caller.
///
/// # Implementation Requirements
///
/// - Strategies must be `Send + Sync` for use across async tasks
/// - `process` must be idempotent-safe: the surrounding system may re-invoke
///   it for the same event when the handler retries
/// - Stages that simulate or perform I/O must suspend (`await`), never block
///   the executor
///
/// # Example
///
/// ```ignore
/// use virta_core::{Event, ProcessError, ProcessingStrategy};
/// use async_trait::async_trait;
///
/// struct OrderShippedStrategy;
///
/// #[async_trait]
/// impl ProcessingStrategy for OrderShippedStrategy {
///     fn name(&self) -> &'static str {
///         "order-shipped"
///     }
///
///     fn can_handle(&self, event_type: &str) -> bool {
///         event_type == "OrderShipped"
///     }
///
///     async fn process(&self, event: &Event) -> Result<(), ProcessError> {
///         // validate → book-carrier → notify, in order
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ProcessingStrategy: Send + Sync {
    /// Returns the strategy's name for identification and logging
    ///
    /// Short and descriptive: "order-created", "order-cancelled".
    fn name(&self) -> &'static str;

    /// Whether this strategy processes the given event type
    ///
    /// Diagnostics-oriented: steady-state dispatch goes through the
    /// registry's type map, which may bind a strategy to additional types.
    fn can_handle(&self, event_type: &str) -> bool;

    /// Process one event through this strategy's stages
    ///
    /// # Arguments
    ///
    /// * `event` - The event to process. Strategies never mutate it.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - All stages completed
    /// * `Err(ProcessError)` - A stage failed; later stages did not run
    async fn process(&self, event: &Event) -> Result<(), ProcessError>;
}
