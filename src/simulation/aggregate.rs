//! Summary statistics over outcome records.
//!
//! Records with an undefined duration are left out of the duration
//! statistics only; they still count for energy, risk and the risk
//! threshold counters.

use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::labels::Thresholds;

use super::composer::OutcomeRecord;

/// Mean, extrema and population standard deviation of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Arithmetic mean.
    pub mean: f64,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// Population standard deviation (divides by N).
    pub std_dev: f64,
    /// Number of values summarized.
    pub samples: usize,
}

impl MetricSummary {
    /// Summarizes a set of values; `None` when empty.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Some(Self {
            mean,
            min,
            max,
            std_dev: variance.sqrt(),
            samples: values.len(),
        })
    }
}

/// Aggregate view of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    /// Records summarized.
    pub iterations: usize,
    /// Duration statistics over records with a defined duration.
    pub duration_s: Option<MetricSummary>,
    /// Energy statistics over all records.
    pub energy_wh: MetricSummary,
    /// Risk statistics over all records.
    pub risk_score: MetricSummary,
    /// Records with risk strictly above the high-risk threshold.
    pub high_risk_count: usize,
    /// Records with risk strictly below the low-risk threshold.
    pub low_risk_count: usize,
    /// Records excluded from duration statistics.
    pub undefined_duration_count: usize,
}

/// Reduces records into a [`SimulationSummary`].
pub fn summarize(
    records: &[OutcomeRecord],
    thresholds: &Thresholds,
) -> Result<SimulationSummary, ExecutionError> {
    let durations: Vec<f64> = records.iter().filter_map(|r| r.duration_s).collect();
    let energies: Vec<f64> = records.iter().map(|r| r.energy_wh).collect();
    let risks: Vec<f64> = records.iter().map(|r| r.risk_score).collect();

    let energy_wh = MetricSummary::from_values(&energies).ok_or(ExecutionError::EmptyResultSet)?;
    let risk_score = MetricSummary::from_values(&risks).ok_or(ExecutionError::EmptyResultSet)?;

    Ok(SimulationSummary {
        iterations: records.len(),
        duration_s: MetricSummary::from_values(&durations),
        energy_wh,
        risk_score,
        high_risk_count: risks.iter().filter(|r| thresholds.is_high_risk(**r)).count(),
        low_risk_count: risks.iter().filter(|r| thresholds.is_low_risk(**r)).count(),
        undefined_duration_count: records.len() - durations.len(),
    })
}
