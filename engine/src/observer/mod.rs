//! Observer fan-out
//!
//! Observers react to events after batching (audit trails, notifications,
//! projections). Fan-out is best-effort, not transactional: interested
//! observers run concurrently, a failing or panicking observer is logged
//! without disturbing its siblings, and [`ObserverSet::notify`] never fails
//! back to its caller.

mod audit;

pub use audit::AuditTrailObserver;

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinSet;
use virta_core::{Event, EventObserver};

/// Ordered list of observers with interest-filtered concurrent dispatch
///
/// # Example
///
/// ```ignore
/// let observers = ObserverSet::new();
/// observers.add(Arc::new(AuditTrailObserver::new()));
/// observers.notify(&event).await;
/// ```
pub struct ObserverSet {
    observers: RwLock<Vec<Arc<dyn EventObserver>>>,
}

impl ObserverSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Register an observer at the end of the list
    pub fn add(&self, observer: Arc<dyn EventObserver>) {
        tracing::info!(observer = observer.name(), "registered observer");
        self.observers.write().push(observer);
    }

    /// Remove every observer with the given name
    ///
    /// Returns true when at least one observer was removed.
    pub fn remove(&self, name: &str) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|observer| observer.name() != name);
        before != observers.len()
    }

    /// Registered observer names, in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.observers.read().iter().map(|o| o.name()).collect()
    }

    /// Number of registered observers
    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    /// Check if no observers are registered
    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Notify every observer interested in the event's type
    ///
    /// Interested observers run concurrently; the call returns once all of
    /// them finished. Observer errors and panics are logged and swallowed.
    /// With no interested observer this is an immediate no-op.
    pub async fn notify(&self, event: &Event) {
        let interested: Vec<Arc<dyn EventObserver>> = {
            let observers = self.observers.read();
            observers
                .iter()
                .filter(|observer| observer.interested_in(&event.event_type))
                .cloned()
                .collect()
        };

        if interested.is_empty() {
            return;
        }

        let mut tasks = JoinSet::new();
        for observer in interested {
            let event = event.clone();
            tasks.spawn(async move {
                if let Err(e) = observer.on_event(&event).await {
                    tracing::warn!(
                        observer = observer.name(),
                        event_id = %event.id,
                        error = %e,
                        "observer failed"
                    );
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "observer task aborted");
            }
        }
    }
}

impl Default for ObserverSet {
    fn default() -> Self {
        Self::new()
    }
}
