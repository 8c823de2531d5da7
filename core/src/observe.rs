//! Event observer trait
//!
//! Observers are best-effort side-effect listeners notified after primary
//! processing. The fan-out invokes all interested observers concurrently
//! and swallows their failures — an observer can never fail an event.

use crate::error::ProcessError;
use crate::event::Event;
use async_trait::async_trait;

/// Observer trait - reacts to events after primary processing
///
/// # Implementation Requirements
///
/// - Observers must be `Send + Sync` for use across async tasks
/// - `interested_in` must be cheap and side-effect free; it runs on every
///   notification cycle
/// - `on_event` failures are logged and swallowed by the fan-out; an
///   observer that must not lose work needs its own durability
///
/// # Example
///
/// ```ignore
/// use virta_core::{Event, EventObserver, ProcessError};
/// use async_trait::async_trait;
///
/// struct LoyaltyPointsObserver;
///
/// #[async_trait]
/// impl EventObserver for LoyaltyPointsObserver {
///     fn name(&self) -> &'static str {
///         "loyalty-points"
///     }
///
///     fn interested_in(&self, event_type: &str) -> bool {
///         event_type == "OrderCreated"
///     }
///
///     async fn on_event(&self, event: &Event) -> Result<(), ProcessError> {
///         // credit points for the order
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait EventObserver: Send + Sync {
    /// Returns the observer's name for identification and logging
    fn name(&self) -> &'static str;

    /// Interest predicate over event type
    ///
    /// Only interested observers are invoked for an event.
    fn interested_in(&self, event_type: &str) -> bool;

    /// React to one event
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Side effect completed
    /// * `Err(ProcessError)` - Logged by the fan-out, never propagated
    async fn on_event(&self, event: &Event) -> Result<(), ProcessError>;
}
