//! Error types for split computation and ranking.
//!
//! All errors implement `std::error::Error` and carry enough structured context to
//! tell a configuration mistake apart from a failing collaborator.
//!
//! ## Error Categories
//!
//! - **Configuration Errors**: structurally invalid race configuration, rejected at save time
//! - **Parse Errors**: malformed YAML configuration or engine settings
//! - **Source Errors**: the query collaborator could not supply detections or splits
//! - **Sink Errors**: the persistence collaborator rejected a write
//! - **Lookup Errors**: an explicit recompute named an event that is not scoreable
//!
//! Absence of detections and status guard rejections are *not* errors.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use finishline::TimingError;
//!
//! let error = TimingError::sink_failed("bulk upsert", "connection reset");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type alias for timing operations.
pub type Result<T, E = TimingError> = std::result::Result<T, E>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for timing operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TimingError {
    #[error("Invalid {entity} configuration ({id}): {reason}")]
    Config { entity: &'static str, id: String, reason: String },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Result source failed during {operation}")]
    Source {
        operation: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Result sink failed during {operation}")]
    Sink {
        operation: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Event {event_id} is not launched or does not exist")]
    EventNotFound { event_id: String },
}

impl TimingError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// The engine itself never retries; this is guidance for the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            TimingError::Source { .. } => true,
            TimingError::Sink { .. } => true,
            TimingError::Config { .. } => false,
            TimingError::Parse { .. } => false,
            TimingError::EventNotFound { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TimingError::Config { .. } => vec![
                "Check that every split references a reader of the same race",
                "Check previous-lap links point at splits of the same event",
                "Ensure each event has exactly one start split",
            ],
            TimingError::Parse { .. } => vec![
                "Check the YAML document structure",
                "Verify durations are given in seconds",
                "Verify ids are valid UUIDs",
            ],
            TimingError::Source { .. } => vec![
                "Check connectivity to the results database",
                "Retry the recomputation",
            ],
            TimingError::Sink { .. } => vec![
                "Check connectivity to the results database",
                "Retry the recomputation; results are recomputed idempotently",
            ],
            TimingError::EventNotFound { .. } => vec![
                "Verify the event id",
                "Launch at least one wave of the event before scoring it",
            ],
        }
    }

    /// Helper constructor for configuration errors.
    pub fn invalid_config(
        entity: &'static str,
        id: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        TimingError::Config { entity, id: id.to_string(), reason: reason.into() }
    }

    /// Helper constructor for query collaborator failures.
    pub fn source_failed(operation: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        TimingError::Source { operation: operation.into(), source: source.into() }
    }

    /// Helper constructor for persistence collaborator failures.
    pub fn sink_failed(operation: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        TimingError::Sink { operation: operation.into(), source: source.into() }
    }

    /// Helper constructor for unknown or unlaunched events.
    pub fn event_not_found(event_id: impl ToString) -> Self {
        TimingError::EventNotFound { event_id: event_id.to_string() }
    }
}

impl From<serde_yaml_ng::Error> for TimingError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        TimingError::Parse { context: "YAML deserialization".to_string(), details: err.to_string() }
    }
}
