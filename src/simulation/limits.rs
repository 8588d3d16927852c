//! Simulation limits (run-cost bounds).

use serde::{Deserialize, Serialize};

use crate::error::{ExecutionError, ValidationError};

/// What to do with a sample whose duration is undefined (zero effective speed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UndefinedDurationPolicy {
    /// Keep the record; it is excluded from duration statistics.
    Record,
    /// Redraw conditions up to `max_attempts` times, then keep the last record.
    Redraw {
        /// Redraw budget per iteration.
        max_attempts: u32,
    },
}

impl Default for UndefinedDurationPolicy {
    fn default() -> Self {
        Self::Record
    }
}

/// Limits that bound the cost of a scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationLimits {
    /// Iterations used when a request does not name a count.
    pub default_iterations: usize,
    /// Hard cap on iterations per request.
    pub max_iterations: usize,
    /// Worker threads used to split a single run.
    pub workers: usize,
    /// Runs below this many iterations stay on the calling thread.
    pub parallel_threshold: usize,
    /// Handling of zero-speed samples.
    pub undefined_duration: UndefinedDurationPolicy,
}

impl Default for SimulationLimits {
    fn default() -> Self {
        Self {
            default_iterations: 1000,
            max_iterations: 10_000,
            workers: 4,
            parallel_threshold: 512,
            undefined_duration: UndefinedDurationPolicy::Record,
        }
    }
}

impl SimulationLimits {
    /// Validate limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |field: &str, reason: &str| ValidationError::InvalidConfig {
            field: format!("simulation.{field}"),
            reason: reason.to_string(),
        };
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be > 0"));
        }
        if self.default_iterations == 0 {
            return Err(invalid("default_iterations", "must be > 0"));
        }
        if self.default_iterations > self.max_iterations {
            return Err(invalid("default_iterations", "must not exceed max_iterations"));
        }
        if self.workers == 0 {
            return Err(invalid("workers", "must be > 0"));
        }
        if let UndefinedDurationPolicy::Redraw { max_attempts: 0 } = self.undefined_duration {
            return Err(invalid("undefined_duration.max_attempts", "must be > 0"));
        }
        Ok(())
    }

    /// Resolves a requested iteration count against the limits.
    ///
    /// `None` selects the default count. Counts above the cap are rejected,
    /// never clamped.
    pub fn resolve_iterations(&self, requested: Option<usize>) -> Result<usize, ExecutionError> {
        let count = requested.unwrap_or(self.default_iterations);
        if count == 0 {
            return Err(ExecutionError::ZeroIterations);
        }
        if count > self.max_iterations {
            return Err(ExecutionError::IterationCountExceeded {
                requested: count,
                max: self.max_iterations,
            });
        }
        Ok(count)
    }
}
