//! Error types for the VIRTA engine

use thiserror::Error;

// Re-export ProcessError from virta-core
pub use virta_core::ProcessError;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the VIRTA engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Processing error from a pipeline component
    #[error("processing error: {0}")]
    Process(#[from] ProcessError),

    /// Graceful shutdown drain did not complete in time
    #[error("shutdown drain exceeded {timeout_ms}ms")]
    ShutdownTimeout {
        /// The configured drain bound
        timeout_ms: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_error_converts() {
        let err: EngineError = ProcessError::Validation("customerId is required".into()).into();
        assert!(matches!(err, EngineError::Process(_)));
        assert_eq!(
            err.to_string(),
            "processing error: validation failed: customerId is required"
        );
    }

    #[test]
    fn test_shutdown_timeout_display() {
        let err = EngineError::ShutdownTimeout { timeout_ms: 30000 };
        assert_eq!(err.to_string(), "shutdown drain exceeded 30000ms");
    }
}
