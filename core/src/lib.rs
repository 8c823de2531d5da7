//! virta-core - Core types for the VIRTA order-event pipeline
//!
//! This crate provides the foundational types shared between the VIRTA
//! engine and external collaborators (broker implementations, custom
//! strategies, custom observers):
//!
//! - [`Event`] - the canonical, immutable order-lifecycle event
//! - [`WireEvent`] / [`DeadLetterEnvelope`] - the JSON shapes crossing the queue
//! - [`ProcessingStrategy`] trait - per-event-type business processing
//! - [`EventObserver`] trait - best-effort side-effect listeners
//! - [`Broker`] / [`EventHandler`] traits - the queue transport seam
//! - [`ProcessError`] - error type shared across all of the above
//!
//! # Why this crate exists
//!
//! A deployment wires its own broker implementation and often its own
//! strategies and observers. Without `virta-core`, those would depend on
//! `virta-engine`, while the engine also needs to call them — a cyclic
//! dependency. Extracting the seam types breaks the cycle:
//!
//! ```text
//! virta-core ◄── virta-engine
//!     ▲
//!     └────────── your broker / strategies / observers
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(missing_docs)]

mod broker;
mod error;
/// The canonical event type
pub mod event;
mod observe;
mod strategy;
/// Wire shapes for queue payloads
pub mod wire;

pub use broker::{Broker, EventHandler};
pub use error::ProcessError;
pub use event::Event;
pub use observe::EventObserver;
pub use strategy::ProcessingStrategy;
pub use wire::{DeadLetterEnvelope, DeadLetterMetadata, FailureInfo, WireEvent};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    // ==========================================================================
    // ProcessError Tests
    // ==========================================================================

    #[test]
    fn test_process_error_validation_display() {
        let err = ProcessError::Validation("customerId is required".to_string());
        assert_eq!(err.to_string(), "validation failed: customerId is required");
    }

    #[test]
    fn test_process_error_stage_display() {
        let err = ProcessError::Stage {
            stage: "reserve-inventory",
            message: "out of stock".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "stage 'reserve-inventory' failed: out of stock"
        );
    }

    #[test]
    fn test_process_error_malformed_display() {
        let err = ProcessError::Malformed("invalid JSON".to_string());
        assert_eq!(err.to_string(), "malformed message: invalid JSON");
    }

    #[test]
    fn test_process_error_broker_display() {
        let err = ProcessError::Broker("connection refused".to_string());
        assert_eq!(err.to_string(), "broker error: connection refused");
    }

    #[test]
    fn test_process_error_publish_display() {
        let err = ProcessError::Publish("exchange missing".to_string());
        assert_eq!(err.to_string(), "publish failed: exchange missing");
    }

    #[test]
    fn test_process_error_shutting_down_display() {
        assert_eq!(ProcessError::ShuttingDown.to_string(), "shutting down");
    }

    #[test]
    fn test_process_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProcessError>();
    }

    #[test]
    fn test_process_error_clone_preserves_equality() {
        let err = ProcessError::Validation("items must not be empty".to_string());
        assert_eq!(err.clone(), err);
    }

    // ==========================================================================
    // Strategy Trait Tests
    // ==========================================================================

    /// Test strategy that tracks calls for verification
    struct TestStrategy {
        processed: AtomicU64,
    }

    #[async_trait]
    impl ProcessingStrategy for TestStrategy {
        fn name(&self) -> &'static str {
            "test-strategy"
        }

        fn can_handle(&self, event_type: &str) -> bool {
            event_type == "OrderCreated"
        }

        async fn process(&self, _event: &Event) -> Result<(), ProcessError> {
            self.processed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_strategy_is_object_safe() {
        let strategy: Arc<dyn ProcessingStrategy> = Arc::new(TestStrategy {
            processed: AtomicU64::new(0),
        });

        assert_eq!(strategy.name(), "test-strategy");
        assert!(strategy.can_handle("OrderCreated"));
        assert!(!strategy.can_handle("OrderCancelled"));

        let event = Event::new("OrderCreated", "order-1");
        assert!(strategy.process(&event).await.is_ok());
    }

    // ==========================================================================
    // Observer Trait Tests
    // ==========================================================================

    struct TestObserver;

    #[async_trait]
    impl EventObserver for TestObserver {
        fn name(&self) -> &'static str {
            "test-observer"
        }

        fn interested_in(&self, event_type: &str) -> bool {
            event_type.starts_with("Order")
        }

        async fn on_event(&self, _event: &Event) -> Result<(), ProcessError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_observer_is_object_safe() {
        let observer: Arc<dyn EventObserver> = Arc::new(TestObserver);

        assert_eq!(observer.name(), "test-observer");
        assert!(observer.interested_in("OrderCreated"));
        assert!(!observer.interested_in("PaymentSettled"));

        let event = Event::new("OrderCreated", "order-1");
        assert!(observer.on_event(&event).await.is_ok());
    }

    // ==========================================================================
    // Handler Trait Tests
    // ==========================================================================

    struct RejectingHandler;

    #[async_trait]
    impl EventHandler for RejectingHandler {
        async fn handle(&self, _payload: bytes::Bytes) -> Result<(), ProcessError> {
            Err(ProcessError::Malformed("not JSON".to_string()))
        }
    }

    #[tokio::test]
    async fn test_handler_is_object_safe() {
        let handler: Arc<dyn EventHandler> = Arc::new(RejectingHandler);

        let result = handler.handle(bytes::Bytes::from_static(b"oops")).await;
        match result {
            Err(ProcessError::Malformed(msg)) => assert_eq!(msg, "not JSON"),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }
}
