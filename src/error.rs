//! Error types for missioncast.
//!
//! All errors are strongly typed using thiserror so callers (and the
//! transport layer) can match on specific conditions.

use thiserror::Error;

/// Validation errors raised before any computation runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid distribution '{name}': {reason}")]
    InvalidDistribution {
        name: String,
        reason: String,
    },

    #[error("Parameter '{field}' must be finite and non-negative (got {value})")]
    InvalidParameter {
        field: String,
        value: f64,
    },

    #[error("Parameter '{field}' must lie within [{min}, {max}] (got {value})")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    FieldTooLong {
        field: String,
        max_length: usize,
    },

    #[error("Invalid configuration '{field}': {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },
}

/// Execution errors raised while a simulation or prediction runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("Duration is undefined for iteration {iteration_index}: effective speed is zero")]
    UndefinedDuration {
        iteration_index: usize,
    },

    #[error("Iteration count {requested} exceeds configured maximum {max}")]
    IterationCountExceeded {
        requested: usize,
        max: usize,
    },

    #[error("Iteration count must be greater than zero")]
    ZeroIterations,

    #[error("Cannot summarize an empty result set")]
    EmptyResultSet,

    #[error("Queue full on {pool} pool (capacity {capacity})")]
    QueueFull {
        pool: String,
        capacity: usize,
    },

    #[error("Worker pool {pool} disconnected")]
    Disconnected {
        pool: String,
    },

    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Worker panicked while executing request: {message}")]
    WorkerPanicked {
        message: String,
    },
}

/// Transport errors for client-server communication.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        message: String,
    },

    #[error("Failed to serialize response: {message}")]
    SerializationFailed {
        message: String,
    },

    #[error("Server error (code {code}): {message}")]
    ServerError {
        code: u32,
        message: String,
    },
}

/// Top-level error type for missioncast.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl ForecastError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Internal { .. } => false,
            Self::Execution(e) => matches!(
                e,
                ExecutionError::Timeout { .. } | ExecutionError::QueueFull { .. }
            ),
            Self::Transport(e) => match e {
                TransportError::ConnectionFailed { .. } => true,
                TransportError::ServerError { code, .. } => *code >= 500,
                TransportError::SerializationFailed { .. } => false,
            },
        }
    }
}

/// Result type alias for missioncast operations.
pub type ForecastResult<T> = Result<T, ForecastError>;
