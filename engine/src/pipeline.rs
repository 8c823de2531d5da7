//! Pipeline composition root
//!
//! [`Pipeline`] is a builder that assembles the engine in dependency order:
//! strategy registry, dead-letter escalator, retry runner, batch aggregator,
//! observer set, handler. No ambient registry, no globals; every component
//! receives its collaborators explicitly at build time.
//!
//! # Example
//!
//! ```ignore
//! let (runner, handle) = Pipeline::new(Config::from_env()?)
//!     .broker(broker)
//!     .strategy("OrderCreated", OrderCreatedStrategy::new())
//!     .strategy("OrderCancelled", OrderCancelledStrategy::new())
//!     .observer(AuditTrailObserver::new())
//!     .build()?;
//!
//! tokio::spawn(async move {
//!     shutdown_signal().await;
//!     handle.shutdown();
//! });
//! runner.run().await?;
//! ```
//!
//! # Shutdown
//!
//! [`PipelineHandle::shutdown`] asks the runner to stop. The runner then
//! disconnects the broker (no new deliveries, in-flight handler calls finish
//! their current attempt) and drains the aggregator, all bounded by
//! `max_wait_time_ms`.

use crate::batch::BatchAggregator;
use crate::config::Config;
use crate::dead_letter::DeadLetterEscalator;
use crate::error::{EngineError, Result};
use crate::handler::PipelineHandler;
use crate::observer::ObserverSet;
use crate::retry::{BackoffPolicy, RetryRunner};
use crate::strategy::StrategyRegistry;
use std::sync::Arc;
use tokio::sync::watch;
use virta_core::{Broker, EventObserver, ProcessingStrategy};

/// Builder for the event-processing pipeline
pub struct Pipeline {
    config: Config,
    broker: Option<Arc<dyn Broker>>,
    strategies: StrategyRegistry,
    observers: ObserverSet,
}

impl Pipeline {
    /// Start building a pipeline with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            broker: None,
            strategies: StrategyRegistry::new(),
            observers: ObserverSet::new(),
        }
    }

    /// Set the broker the pipeline consumes from and publishes to
    pub fn broker(mut self, broker: Arc<dyn Broker>) -> Self {
        self.broker = Some(broker);
        self
    }

    /// Register a strategy for an event type
    pub fn strategy<S>(self, event_type: impl Into<String>, strategy: S) -> Self
    where
        S: ProcessingStrategy + 'static,
    {
        self.strategy_arc(event_type, Arc::new(strategy))
    }

    /// Register a strategy for an event type (Arc version)
    ///
    /// Lets several event types share one strategy instance.
    pub fn strategy_arc(
        mut self,
        event_type: impl Into<String>,
        strategy: Arc<dyn ProcessingStrategy>,
    ) -> Self {
        self.strategies.register(event_type, strategy);
        self
    }

    /// Register an observer
    pub fn observer<O>(self, observer: O) -> Self
    where
        O: EventObserver + 'static,
    {
        self.observer_arc(Arc::new(observer))
    }

    /// Register an observer (Arc version)
    pub fn observer_arc(self, observer: Arc<dyn EventObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    /// Wire everything and hand back the runner plus its shutdown handle
    ///
    /// # Errors
    ///
    /// Fails when no broker is set or the configuration does not validate.
    pub fn build(self) -> Result<(PipelineRunner, PipelineHandle)> {
        let broker = self
            .broker
            .ok_or_else(|| EngineError::Config("no broker configured".into()))?;
        self.config.validate()?;

        if self.strategies.is_empty() {
            tracing::warn!("no strategies registered, every event will be dropped");
        }

        let strategies = Arc::new(self.strategies);
        let dead_letter = Arc::new(DeadLetterEscalator::new(
            broker.clone(),
            self.config.dead_letter_exchange.clone(),
            self.config.dead_letter_routing_key.clone(),
        ));
        let retry = Arc::new(
            RetryRunner::new(BackoffPolicy::from_config(&self.config))
                .with_dead_letter(dead_letter.clone()),
        );
        let aggregator = Arc::new(BatchAggregator::new(
            self.config.batch_size,
            self.config.batch_interval(),
            strategies.clone(),
        ));
        let observers = Arc::new(self.observers);
        let handler = Arc::new(PipelineHandler::new(
            retry,
            aggregator.clone(),
            observers.clone(),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let runner = PipelineRunner {
            config: self.config,
            broker,
            strategies,
            observers,
            aggregator,
            dead_letter,
            handler,
            shutdown: shutdown_rx,
        };
        let handle = PipelineHandle {
            shutdown: shutdown_tx,
        };
        Ok((runner, handle))
    }
}

/// Requests a graceful stop of a running pipeline
pub struct PipelineHandle {
    shutdown: watch::Sender<bool>,
}

impl PipelineHandle {
    /// Ask the runner to stop; [`PipelineRunner::run`] drains and returns
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// The built pipeline, ready to run
pub struct PipelineRunner {
    config: Config,
    broker: Arc<dyn Broker>,
    strategies: Arc<StrategyRegistry>,
    observers: Arc<ObserverSet>,
    aggregator: Arc<BatchAggregator>,
    dead_letter: Arc<DeadLetterEscalator>,
    handler: Arc<PipelineHandler>,
    shutdown: watch::Receiver<bool>,
}

impl PipelineRunner {
    /// The batch aggregator, for inspection
    pub fn aggregator(&self) -> Arc<BatchAggregator> {
        self.aggregator.clone()
    }

    /// The dead-letter escalator, for inspecting escalated events
    pub fn dead_letter(&self) -> Arc<DeadLetterEscalator> {
        self.dead_letter.clone()
    }

    /// Connect, consume and process until the handle requests shutdown
    pub async fn run(mut self) -> Result<()> {
        tracing::info!(
            broker = self.broker.name(),
            queue = %self.config.order_events_queue,
            batch_size = self.config.batch_size,
            batch_interval_ms = self.config.batch_interval_ms,
            max_attempts = self.config.max_attempts,
            strategies = ?self.strategies.event_types(),
            observers = ?self.observers.names(),
            "starting pipeline"
        );

        self.broker.connect().await?;
        self.broker
            .register_handler(&self.config.order_events_queue, self.handler.clone())
            .await?;
        self.broker.consume().await?;
        tracing::info!("pipeline running");

        // Err means every handle was dropped; treat it as a stop request too
        let _ = self.shutdown.wait_for(|stop| *stop).await;

        self.drain().await
    }

    /// Stop deliveries, then flush everything the aggregator still holds
    async fn drain(&self) -> Result<()> {
        tracing::info!(
            pending = self.aggregator.pending_total(),
            max_wait_time_ms = self.config.max_wait_time_ms,
            "draining pipeline"
        );

        let drain = async {
            // Disconnect first so the aggregator sees no new submissions
            self.broker.disconnect().await?;
            self.aggregator.shutdown().await;
            Ok::<(), EngineError>(())
        };

        match tokio::time::timeout(self.config.max_wait_time(), drain).await {
            Ok(result) => {
                result?;
                tracing::info!("pipeline stopped");
                Ok(())
            }
            Err(_) => {
                tracing::error!(
                    pending = self.aggregator.pending_total(),
                    timeout_ms = self.config.max_wait_time_ms,
                    "drain did not finish in time"
                );
                Err(EngineError::ShutdownTimeout {
                    timeout_ms: self.config.max_wait_time_ms,
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::observer::AuditTrailObserver;
    use crate::strategy::OrderCreatedStrategy;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::result::Result;
    use virta_core::{EventHandler, ProcessError};

    struct NullBroker;

    #[async_trait]
    impl Broker for NullBroker {
        fn name(&self) -> &'static str {
            "null"
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

    /// Broker whose disconnect never returns
    struct WedgedBroker;

    #[async_trait]
    impl Broker for WedgedBroker {
        fn name(&self) -> &'static str {
            "wedged"
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
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[test]
    fn build_requires_a_broker() {
        let result = Pipeline::new(Config::default())
            .strategy("OrderCreated", OrderCreatedStrategy::new())
            .build();

        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn build_validates_config() {
        let config = Config {
            batch_size: 0,
            ..Config::default()
        };
        let result = Pipeline::new(config).broker(Arc::new(NullBroker)).build();

        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn build_wires_all_components() {
        let (runner, _handle) = Pipeline::new(Config::default())
            .broker(Arc::new(NullBroker))
            .strategy("OrderCreated", OrderCreatedStrategy::new())
            .observer(AuditTrailObserver::new())
            .build()
            .unwrap();

        assert_eq!(runner.aggregator().pending_total(), 0);
        assert!(runner.dead_letter().store().is_empty());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let (runner, handle) = Pipeline::new(Config::default())
            .broker(Arc::new(NullBroker))
            .strategy("OrderCreated", OrderCreatedStrategy::new())
            .build()
            .unwrap();

        let running = tokio::spawn(runner.run());
        handle.shutdown();

        let result = running.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_is_bounded_by_max_wait_time() {
        let config = Config {
            max_wait_time_ms: 50,
            ..Config::default()
        };
        let (runner, handle) = Pipeline::new(config)
            .broker(Arc::new(WedgedBroker))
            .strategy("OrderCreated", OrderCreatedStrategy::new())
            .build()
            .unwrap();

        handle.shutdown();
        let result = runner.run().await;

        assert!(matches!(
            result,
            Err(EngineError::ShutdownTimeout { timeout_ms: 50 })
        ));
    }
}
