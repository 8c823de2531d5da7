//! Engine configuration
//!
//! All tuning knobs and broker names come from the environment with stated
//! defaults, so a deployment can run unconfigured and still behave sanely.
//! Invalid values fail fast at startup with the offending variable named.

use crate::error::{EngineError, Result};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output for development
    #[default]
    Pretty,
    /// One JSON object per line for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

/// Engine configuration, sourced from environment variables
///
/// # Example
///
/// ```ignore
/// let config = Config::from_env()?;
/// assert!(config.batch_size >= 1);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Events per batch before a size-triggered flush (`VIRTA_BATCH_SIZE`)
    pub batch_size: usize,
    /// Flush timer for partial batches, ms (`VIRTA_BATCH_INTERVAL_MS`)
    pub batch_interval_ms: u64,
    /// Upper bound on the graceful-shutdown drain, ms (`VIRTA_MAX_WAIT_TIME_MS`)
    pub max_wait_time_ms: u64,
    /// Retry attempts per message (`VIRTA_MAX_ATTEMPTS`)
    pub max_attempts: u32,
    /// Delay before the second attempt, ms (`VIRTA_INITIAL_DELAY_MS`)
    pub initial_delay_ms: u64,
    /// Backoff cap, ms (`VIRTA_MAX_DELAY_MS`)
    pub max_delay_ms: u64,
    /// Backoff multiplier per failed attempt (`VIRTA_BACKOFF_FACTOR`)
    pub backoff_factor: f64,
    /// Exchange order events arrive on (`VIRTA_ORDER_EXCHANGE`)
    pub order_events_exchange: String,
    /// Queue this engine consumes (`VIRTA_ORDER_QUEUE`)
    pub order_events_queue: String,
    /// Binding key for the order queue (`VIRTA_ORDER_ROUTING_KEY`)
    pub order_events_routing_key: String,
    /// Exchange dead-lettered events are published to (`VIRTA_DEAD_LETTER_EXCHANGE`)
    pub dead_letter_exchange: String,
    /// Dead-letter queue name (`VIRTA_DEAD_LETTER_QUEUE`)
    pub dead_letter_queue: String,
    /// Routing key for dead-letter publishes (`VIRTA_DEAD_LETTER_ROUTING_KEY`)
    pub dead_letter_routing_key: String,
    /// Default log level when `RUST_LOG` is unset (`VIRTA_LOG_LEVEL`)
    pub log_level: String,
    /// Log output format (`VIRTA_LOG_FORMAT`: "pretty" or "json")
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: 3,
            batch_interval_ms: 10_000,
            max_wait_time_ms: 30_000,
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_factor: 2.0,
            order_events_exchange: "order.events".to_string(),
            order_events_queue: "order-processing".to_string(),
            order_events_routing_key: "order.#".to_string(),
            dead_letter_exchange: "order.events.dlx".to_string(),
            dead_letter_queue: "order-processing-dlq".to_string(),
            dead_letter_routing_key: "order.dead".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, validating values
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let config = Config {
            batch_size: env_parse("VIRTA_BATCH_SIZE", defaults.batch_size)?,
            batch_interval_ms: env_parse("VIRTA_BATCH_INTERVAL_MS", defaults.batch_interval_ms)?,
            max_wait_time_ms: env_parse("VIRTA_MAX_WAIT_TIME_MS", defaults.max_wait_time_ms)?,
            max_attempts: env_parse("VIRTA_MAX_ATTEMPTS", defaults.max_attempts)?,
            initial_delay_ms: env_parse("VIRTA_INITIAL_DELAY_MS", defaults.initial_delay_ms)?,
            max_delay_ms: env_parse("VIRTA_MAX_DELAY_MS", defaults.max_delay_ms)?,
            backoff_factor: env_parse("VIRTA_BACKOFF_FACTOR", defaults.backoff_factor)?,
            order_events_exchange: env_string(
                "VIRTA_ORDER_EXCHANGE",
                defaults.order_events_exchange,
            ),
            order_events_queue: env_string("VIRTA_ORDER_QUEUE", defaults.order_events_queue),
            order_events_routing_key: env_string(
                "VIRTA_ORDER_ROUTING_KEY",
                defaults.order_events_routing_key,
            ),
            dead_letter_exchange: env_string(
                "VIRTA_DEAD_LETTER_EXCHANGE",
                defaults.dead_letter_exchange,
            ),
            dead_letter_queue: env_string("VIRTA_DEAD_LETTER_QUEUE", defaults.dead_letter_queue),
            dead_letter_routing_key: env_string(
                "VIRTA_DEAD_LETTER_ROUTING_KEY",
                defaults.dead_letter_routing_key,
            ),
            log_level: env_string("VIRTA_LOG_LEVEL", defaults.log_level),
            log_format: env_parse("VIRTA_LOG_FORMAT", defaults.log_format)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EngineError::Config("VIRTA_BATCH_SIZE must be >= 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(EngineError::Config("VIRTA_MAX_ATTEMPTS must be >= 1".into()));
        }
        if self.backoff_factor < 1.0 {
            return Err(EngineError::Config(
                "VIRTA_BACKOFF_FACTOR must be >= 1.0".into(),
            ));
        }
        Ok(())
    }

    /// Flush timer duration for partial batches
    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }

    /// Delay before the second retry attempt
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Backoff cap
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Graceful-shutdown drain bound
    pub fn max_wait_time(&self) -> Duration {
        Duration::from_millis(self.max_wait_time_ms)
    }
}

/// Parse an env var, falling back to `default` when unset
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| EngineError::Config(format!("invalid {key}='{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}

/// Read a string env var, falling back to `default` when unset
fn env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}
