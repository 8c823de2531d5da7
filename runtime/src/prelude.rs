//! Convenience re-exports for pipeline authors.
//!
//! ```rust
//! use virta_runtime::prelude::*;
//! ```

// Core contracts
pub use virta_core::{
    Broker, Event, EventHandler, EventObserver, ProcessError, ProcessingStrategy,
};

// Pipeline builder
pub use virta_engine::{Pipeline, PipelineHandle, PipelineRunner};

// Configuration
pub use virta_engine::{Config, LogFormat};

// Built-in strategies and observers
pub use virta_engine::{
    AuditTrailObserver, OrderCancelledStrategy, OrderCreatedStrategy, StrategyRegistry,
};

// Retry and dead-letter surface
pub use virta_engine::{
    BackoffPolicy, DeadLetterEscalator, DeadLetterRecord, DeadLetterStore, RetryRunner,
};

// Error types
pub use virta_engine::EngineError;

// Zero-copy payload
pub use bytes::Bytes;

// Runtime
pub use crate::RuntimeBuilder;
