//! VIRTA - Order Event Processing Engine
//!
//! Consumes order events from a message broker and drives them through
//! validation, batching, per-type strategies and observer fan-out, with
//! retry and dead-letter escalation around the whole submission path.
//!
//! # Pipeline
//!
//! ```text
//! Deliveries ──► Handler ──► Aggregator ──► Strategies
//!                   │
//!                   ├──► Observers (fan-out per event)
//!                   └──► Dead-letter exchange (after retries exhaust)
//! ```
//!
//! Strategies and observers are pluggable via traits from `virta-core`.
//! [`Pipeline`] assembles the whole thing; brokers are provided by the
//! runtime crate or by tests.

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod batch;
pub mod config;
pub mod dead_letter;
pub mod error;
pub mod handler;
pub mod observer;
pub mod pipeline;
pub mod retry;
pub mod strategy;

pub use batch::BatchAggregator;
pub use config::{Config, LogFormat};
pub use dead_letter::{
    DeadLetterEscalator, DeadLetterRecord, DeadLetterStore, DEFAULT_STORE_CAPACITY,
};
pub use error::{EngineError, ProcessError, Result};
pub use handler::PipelineHandler;
pub use observer::{AuditTrailObserver, ObserverSet};
pub use pipeline::{Pipeline, PipelineHandle, PipelineRunner};
pub use retry::{BackoffPolicy, RetryRunner};
pub use strategy::{OrderCancelledStrategy, OrderCreatedStrategy, StrategyRegistry};

// Core contracts, re-exported so downstream crates need only one import
pub use virta_core::{Broker, Event, EventHandler, EventObserver, ProcessingStrategy};
