//! Monte Carlo scenario simulation.
//!
//! Per iteration: draw weather, traffic, battery and payload from their
//! categorical distributions, compose them with the route distance into an
//! [`OutcomeRecord`], then reduce all records into a [`SimulationSummary`].

pub mod aggregate;
pub mod composer;
pub mod distribution;
pub mod engine;
pub mod limits;

pub use aggregate::{summarize, MetricSummary, SimulationSummary};
pub use composer::{OutcomeModel, OutcomeRecord, SampledConditions};
pub use distribution::{CategoricalDistribution, ConditionSamplers, LabelSampler, ScenarioDistributions};
pub use engine::{derive_seed, ScenarioEngine, ScenarioReport, ScenarioSpec};
pub use limits::{SimulationLimits, UndefinedDurationPolicy};
