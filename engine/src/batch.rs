//! Batch aggregation keyed by event type
//!
//! Events buffer per event type until either the batch reaches `batch_size`
//! or the per-batch interval timer fires, whichever comes first. The timer
//! starts when the first event lands in an empty batch and is cancelled when
//! a size-triggered flush takes the batch away early.
//!
//! A flush swaps the buffer out *before* invoking the strategy, so
//! submissions arriving mid-flush start a fresh batch instead of racing the
//! in-flight one. At most one flush per event type runs at a time; a flush
//! that finds another in flight for the same key is skipped, not queued.
//!
//! # Failure Behavior
//!
//! Strategy errors during a flush are logged with the batch size and event
//! type, then swallowed. The batch counts as consumed either way and events
//! are not re-enqueued. Only failures earlier in the path (parsing and
//! validation in the handler) are visible to the retry engine.
//!
//! # Shutdown
//!
//! Call [`BatchAggregator::shutdown`] before dropping. It stops new
//! submissions, cancels pending timers, waits out in-flight flushes and
//! drains every non-empty batch.

use crate::strategy::StrategyRegistry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use virta_core::{Event, ProcessError};

/// A buffered batch plus its interval timer
struct BatchSlot {
    events: Vec<Event>,
    /// Timer task that flushes this batch when the interval elapses
    timer: JoinHandle<()>,
}

/// Collects events per event type and flushes them through the registry
///
/// # Example
///
/// ```ignore
/// let aggregator = Arc::new(BatchAggregator::new(
///     3,
///     Duration::from_secs(10),
///     registry.clone(),
/// ));
/// aggregator.submit(&event).await?;
/// ```
pub struct BatchAggregator {
    batch_size: usize,
    batch_interval: Duration,
    strategies: Arc<StrategyRegistry>,
    slots: Mutex<HashMap<String, BatchSlot>>,
    /// One in-progress flag per event type, held for the whole flush
    in_flight: Mutex<HashMap<String, Arc<AtomicBool>>>,
    closed: AtomicBool,
}

impl BatchAggregator {
    /// Create an aggregator with the given batch tuning
    ///
    /// # Panics
    ///
    /// Panics if batch_size is 0.
    pub fn new(
        batch_size: usize,
        batch_interval: Duration,
        strategies: Arc<StrategyRegistry>,
    ) -> Self {
        assert!(batch_size > 0, "batch_size must be > 0");
        Self {
            batch_size,
            batch_interval,
            strategies,
            slots: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Buffer an event in the batch for its type
    ///
    /// Flushes synchronously when the batch reaches `batch_size`; strategy
    /// failures inside that flush are swallowed, so a full batch still
    /// returns `Ok`. Events with no registered strategy are dropped with a
    /// warning rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::ShuttingDown`] after [`shutdown`] has begun.
    ///
    /// [`shutdown`]: BatchAggregator::shutdown
    pub async fn submit(self: &Arc<Self>, event: &Event) -> Result<(), ProcessError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ProcessError::ShuttingDown);
        }

        if self.strategies.strategy_for(&event.event_type).is_none() {
            tracing::warn!(
                event_type = %event.event_type,
                event_id = %event.id,
                "no strategy registered, dropping event"
            );
            return Ok(());
        }

        let should_flush = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(event.event_type.clone()).or_insert_with(|| BatchSlot {
                events: Vec::with_capacity(self.batch_size),
                timer: self.start_timer(event.event_type.clone()),
            });
            slot.events.push(event.clone());
            slot.events.len() >= self.batch_size
        };

        if should_flush {
            self.flush(&event.event_type).await;
        }

        Ok(())
    }

    /// Flush the batch for one event type, if any is buffered
    pub async fn flush(&self, event_type: &str) {
        self.run_flush(event_type, true).await;
    }

    /// Flush every non-empty batch
    pub async fn flush_all(&self) {
        let keys: Vec<String> = {
            let slots = self.slots.lock();
            slots.keys().cloned().collect()
        };
        for key in keys {
            self.run_flush(&key, true).await;
        }
    }

    /// Stop accepting events, cancel timers and drain every batch
    ///
    /// Waits for in-flight flushes to finish so no buffered event is lost.
    /// The caller bounds this with a timeout if it must not block forever.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);

        loop {
            self.flush_all().await;
            let drained = self.slots.lock().is_empty() && !self.any_flush_in_flight();
            if drained {
                return;
            }
            // An in-flight flush holds its key's flag; give it time to finish
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Buffered event count for one event type
    pub fn pending(&self, event_type: &str) -> usize {
        self.slots
            .lock()
            .get(event_type)
            .map(|slot| slot.events.len())
            .unwrap_or(0)
    }

    /// Buffered event count across all types
    pub fn pending_total(&self) -> usize {
        self.slots.lock().values().map(|slot| slot.events.len()).sum()
    }

    /// Spawn the interval timer for a freshly created batch
    fn start_timer(self: &Arc<Self>, event_type: String) -> JoinHandle<()> {
        let aggregator = Arc::clone(self);
        let interval = self.batch_interval;
        tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            tracing::debug!(event_type = %event_type, "batch interval elapsed");
            // abort_timer = false: the slot's timer handle is this task
            aggregator.run_flush(&event_type, false).await;
        })
    }

    /// Claim the key's in-progress flag, swap the batch out and process it
    ///
    /// `abort_timer` is false only on the timer-fired path, where the slot's
    /// timer handle refers to the task running this very flush.
    async fn run_flush(&self, event_type: &str, abort_timer: bool) {
        let flag = self.in_flight_flag(event_type);
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            tracing::debug!(event_type, "flush already in flight, skipping");
            return;
        }

        // Swap before invoking the strategy so concurrent submissions start
        // a fresh batch
        let slot = self.slots.lock().remove(event_type);

        let Some(slot) = slot else {
            flag.store(false, Ordering::Release);
            return;
        };

        if abort_timer {
            slot.timer.abort();
        }

        self.process_batch(event_type, slot.events).await;
        flag.store(false, Ordering::Release);
    }

    /// Run the registered strategy over a batch, sequentially and in
    /// submission order
    ///
    /// A failing event is logged and the rest of the batch still runs.
    async fn process_batch(&self, event_type: &str, events: Vec<Event>) {
        let Some(strategy) = self.strategies.strategy_for(event_type) else {
            tracing::warn!(
                event_type,
                count = events.len(),
                "no strategy for buffered batch, dropping"
            );
            return;
        };

        let batch_size = events.len();
        tracing::debug!(
            event_type,
            count = batch_size,
            strategy = strategy.name(),
            "flushing batch"
        );

        for event in &events {
            if let Err(e) = strategy.process(event).await {
                tracing::error!(
                    event_type,
                    batch_size,
                    event_id = %event.id,
                    error = %e,
                    "strategy failed during flush"
                );
            }
        }
    }

    fn in_flight_flag(&self, event_type: &str) -> Arc<AtomicBool> {
        let mut flags = self.in_flight.lock();
        flags
            .entry(event_type.to_string())
            .or_insert_with(|| Arc::new(AtomicBool::new(false)))
            .clone()
    }

    fn any_flush_in_flight(&self) -> bool {
        self.in_flight
            .lock()
            .values()
            .any(|flag| flag.load(Ordering::Acquire))
    }
}

impl Drop for BatchAggregator {
    fn drop(&mut self) {
        let slots = self.slots.lock();
        let pending: usize = slots.values().map(|slot| slot.events.len()).sum();
        for slot in slots.values() {
            slot.timer.abort();
        }
        if pending > 0 {
            tracing::warn!(
                pending,
                "aggregator dropped with buffered events, call shutdown() first to avoid data loss"
            );
        }
    }
}
