//! VIRTA Runtime — process wiring for pipelines
//!
//! Everything a VIRTA binary needs around the pipeline itself: config
//! loading, tracing setup, and signal-driven graceful shutdown. [`run()`]
//! covers the common case; [`RuntimeBuilder`] is for processes that build
//! their [`Config`](virta_engine::config::Config) in code.
//!
//! # Quick start
//!
//! ```ignore
//! use virta_runtime::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     virta_runtime::run(|pipeline| async move {
//!         Ok(pipeline
//!             .broker(my_broker)
//!             .strategy("OrderCreated", OrderCreatedStrategy::new())
//!             .strategy("OrderCancelled", OrderCancelledStrategy::new())
//!             .observer(AuditTrailObserver::new()))
//!     }).await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod prelude;

use std::future::Future;
use tokio::signal;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use virta_engine::config::{Config, LogFormat};
use virta_engine::pipeline::Pipeline;

/// Run a VIRTA pipeline with default settings.
///
/// Loads configuration from environment variables, initialises tracing,
/// calls your closure to wire up the pipeline, then runs it with graceful
/// shutdown on ctrl-c or SIGTERM.
///
/// # Example
///
/// ```ignore
/// virta_runtime::run(|pipeline| async move {
///     Ok(pipeline
///         .broker(my_broker)
///         .strategy("OrderCreated", OrderCreatedStrategy::new())
///         .observer(AuditTrailObserver::new()))
/// }).await
/// ```
pub async fn run<F, Fut>(configure: F) -> anyhow::Result<()>
where
    F: FnOnce(Pipeline) -> Fut,
    Fut: Future<Output = anyhow::Result<Pipeline>>,
{
    RuntimeBuilder::new().configure(configure).await
}

/// Builder variant of [`run()`] for processes that assemble their own
/// [`Config`] instead of reading the environment.
///
/// # Example
///
/// ```ignore
/// RuntimeBuilder::new()
///     .config(Config {
///         batch_size: 5,
///         ..Config::default()
///     })
///     .configure(|pipeline| async move {
///         Ok(pipeline.broker(my_broker))
///     })
///     .await
/// ```
pub struct RuntimeBuilder {
    config: Option<Config>,
}

impl RuntimeBuilder {
    /// Create a new builder; configuration defaults to environment variables.
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Supply configuration directly instead of reading the environment.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Wire the pipeline and drive it until shutdown completes.
    ///
    /// Consumes the builder; the call returns once the drain has finished.
    pub async fn configure<F, Fut>(self, configure: F) -> anyhow::Result<()>
    where
        F: FnOnce(Pipeline) -> Fut,
        Fut: Future<Output = anyhow::Result<Pipeline>>,
    {
        // ── 1. Resolve config ────────────────────────────────────
        let config = match self.config {
            Some(config) => config,
            None => Config::from_env()?,
        };

        // ── 2. Install tracing ───────────────────────────────────
        init_tracing(&config);

        info!(
            queue = %config.order_events_queue,
            batch_size = config.batch_size,
            max_attempts = config.max_attempts,
            "Starting VIRTA"
        );

        // ── 3. Pre-configure the pipeline from config ────────────
        let pipeline = Pipeline::new(config);

        // ── 4. User wires broker, strategies, observers ──────────
        let pipeline = configure(pipeline).await?;

        // ── 5. Build and arm the signal handler ──────────────────
        let (runner, handle) = pipeline.build()?;

        tokio::spawn(async move {
            shutdown_signal().await;
            handle.shutdown();
        });

        // ── 6. Run to completion ─────────────────────────────────
        runner.run().await?;
        info!("VIRTA shutdown complete");

        Ok(())
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured log level applies.
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_level.clone().into());

    let base = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => base.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => base.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Resolve when the process is asked to stop (ctrl-c or SIGTERM).
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = ?e, "cannot listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("ctrl-c received, shutting down"),
        _ = sigterm => info!("SIGTERM received, shutting down"),
    }
}
