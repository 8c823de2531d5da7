//! Error types for VIRTA processing components

use thiserror::Error;

/// Error type for event-processing operations
///
/// This is the standard error type crossing the seams of the VIRTA
/// pipeline: strategies, observers, the message handler, and broker
/// implementations all speak it. It is `Clone` because the retry engine
/// hands the terminal error to the dead-letter escalator while still
/// re-raising it to the caller.
///
/// # Example
///
/// ```
/// use virta_core::ProcessError;
///
/// fn check_total(total: f64) -> Result<(), ProcessError> {
///     if total <= 0.0 {
///         return Err(ProcessError::Validation(
///             "totalAmount must be a positive number".to_string(),
///         ));
///     }
///     Ok(())
/// }
///
/// match check_total(-1.0) {
///     Err(ProcessError::Validation(msg)) => println!("rejected: {}", msg),
///     other => println!("{:?}", other),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// Payload failed a required-field check
    ///
    /// Raised by strategies (and the handler's structural check) when an
    /// event is missing a required field or carries an unusable value.
    /// Validation errors are retried like any other failure; the retry
    /// engine does not classify errors by kind.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A processing stage failed
    ///
    /// Raised when a named strategy stage (reserve-inventory,
    /// authorize-payment, ...) fails. Aborts the remaining stages.
    #[error("stage '{stage}' failed: {message}")]
    Stage {
        /// Name of the stage that failed
        stage: &'static str,
        /// What went wrong
        message: String,
    },

    /// The raw wire message could not be decoded
    ///
    /// Examples: invalid JSON, a non-object payload, missing eventType.
    /// Surfaces before the retry wrapper — a malformed message never
    /// becomes well-formed by retrying.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Broker operation failed
    ///
    /// Examples: connection refused, channel closed, consume error.
    #[error("broker error: {0}")]
    Broker(String),

    /// Publish to an exchange failed
    ///
    /// Examples: exchange missing, connection dropped mid-publish.
    #[error("publish failed: {0}")]
    Publish(String),

    /// The component is shutting down and no longer accepts work
    #[error("shutting down")]
    ShuttingDown,
}
