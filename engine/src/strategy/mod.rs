//! Strategy registration and the built-in order strategies
//!
//! The registry maps event-type strings to [`ProcessingStrategy`] instances.
//! It is populated at wiring time and read-only afterwards, so lookups take
//! `&self` and the whole registry is shared behind an `Arc`. Several event
//! types may map to the same strategy instance.

mod order_cancelled;
mod order_created;

pub use order_cancelled::OrderCancelledStrategy;
pub use order_created::OrderCreatedStrategy;

use std::collections::HashMap;
use std::sync::Arc;
use virta_core::ProcessingStrategy;

/// Event-type to strategy mapping, frozen after wiring
///
/// # Example
///
/// ```ignore
/// let mut registry = StrategyRegistry::new();
/// registry.register("OrderCreated", Arc::new(OrderCreatedStrategy::new()));
/// let registry = Arc::new(registry);
/// ```
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn ProcessingStrategy>>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Associate a strategy with an event type
    ///
    /// The last registration for a type wins; replacing an existing
    /// registration logs a warning.
    pub fn register(
        &mut self,
        event_type: impl Into<String>,
        strategy: Arc<dyn ProcessingStrategy>,
    ) {
        let event_type = event_type.into();
        match self.strategies.insert(event_type.clone(), strategy.clone()) {
            Some(previous) => {
                tracing::warn!(
                    event_type = %event_type,
                    previous = previous.name(),
                    replacement = strategy.name(),
                    "replaced strategy registration"
                );
            }
            None => {
                tracing::info!(
                    event_type = %event_type,
                    strategy = strategy.name(),
                    "registered strategy"
                );
            }
        }
    }

    /// Look up the strategy for an event type
    pub fn strategy_for(&self, event_type: &str) -> Option<Arc<dyn ProcessingStrategy>> {
        self.strategies.get(event_type).cloned()
    }

    /// Registered event types, sorted for stable logging
    pub fn event_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Number of registered event types
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if no strategies are registered
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
