//! Scenario engine: drives independent sample-and-compose iterations.
//!
//! Two entry points share the same per-iteration step:
//! - [`ScenarioEngine::run`] draws every iteration from one caller-owned RNG.
//! - [`ScenarioEngine::run_seeded`] gives iteration `i` its own ChaCha stream
//!   (`seed`, stream `i`), so the work can be split across threads and the
//!   records are identical for any worker count.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ForecastConfig;
use crate::error::{ExecutionError, ForecastResult};
use crate::mission::{validate_route, MissionParameters, Waypoint};
use crate::runtime::panic_message;

use super::aggregate::{summarize, SimulationSummary};
use super::composer::OutcomeRecord;
use super::distribution::{ConditionSamplers, ScenarioDistributions};
use super::limits::UndefinedDurationPolicy;

const SEED_CONTEXT: &str = "missioncast 2024 scenario seed";

/// Derives a stable run seed from a mission identifier.
#[must_use]
pub fn derive_seed(mission_id: &str) -> u64 {
    let key = blake3::derive_key(SEED_CONTEXT, mission_id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&key[..8]);
    u64::from_le_bytes(bytes)
}

fn iteration_rng(seed: u64, iteration_index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(iteration_index as u64);
    rng
}

/// Everything needed to run and summarize one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Route to simulate.
    pub waypoints: Vec<Waypoint>,
    /// Mission parameters.
    pub parameters: MissionParameters,
    /// Distribution overrides; configured tables are used when absent.
    #[serde(default)]
    pub distributions: Option<ScenarioDistributions>,
    /// Iteration count; the configured default is used when absent.
    #[serde(default)]
    pub iterations: Option<usize>,
    /// Base seed for the per-iteration streams.
    pub seed: u64,
}

/// Result of [`ScenarioEngine::simulate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Identifier of this run.
    pub run_id: Uuid,
    /// Seed the records were drawn with.
    pub seed: u64,
    /// Route distance used by every iteration.
    pub distance_m: f64,
    /// Aggregate statistics.
    pub summary: SimulationSummary,
    /// Records in submission order.
    pub records: Vec<OutcomeRecord>,
}

/// Stateless Monte Carlo driver over an immutable configuration.
#[derive(Debug, Clone)]
pub struct ScenarioEngine {
    config: Arc<ForecastConfig>,
}

impl ScenarioEngine {
    /// Creates an engine over a validated configuration.
    #[must_use]
    pub fn new(config: Arc<ForecastConfig>) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Validates a run and returns the route length in meters.
    fn check_inputs(
        &self,
        waypoints: &[Waypoint],
        params: &MissionParameters,
        iterations: usize,
    ) -> ForecastResult<f64> {
        self.config.simulation.resolve_iterations(Some(iterations))?;
        params.validate()?;
        validate_route(waypoints)?;
        Ok(self.config.geometry.checked_route_distance_m(waypoints)?)
    }

    fn iterate<R: Rng + ?Sized>(
        &self,
        samplers: &ConditionSamplers<'_>,
        iteration_index: usize,
        distance_m: f64,
        params: &MissionParameters,
        rng: &mut R,
    ) -> OutcomeRecord {
        let compose = |rng: &mut R| {
            self.config.outcome.compose(
                &self.config.risk,
                iteration_index,
                samplers.draw(rng),
                distance_m,
                params,
            )
        };

        let mut record = compose(&mut *rng);
        if let UndefinedDurationPolicy::Redraw { max_attempts } = self.config.simulation.undefined_duration {
            let mut attempts = 0;
            while record.has_undefined_duration() && attempts < max_attempts {
                attempts += 1;
                record = compose(&mut *rng);
            }
        }
        record
    }

    fn log_undefined(records: &[OutcomeRecord]) {
        let undefined = records.iter().filter(|r| r.has_undefined_duration()).count();
        if undefined > 0 {
            warn!(undefined, total = records.len(), "samples with undefined duration");
        }
    }

    /// Runs `iterations` iterations drawing from the caller's RNG.
    ///
    /// Inputs are validated before any draw; a rejected request produces no records.
    pub fn run<R: Rng + ?Sized>(
        &self,
        waypoints: &[Waypoint],
        params: &MissionParameters,
        distributions: &ScenarioDistributions,
        iterations: usize,
        rng: &mut R,
    ) -> ForecastResult<Vec<OutcomeRecord>> {
        let distance_m = self.check_inputs(waypoints, params, iterations)?;
        let samplers = distributions.samplers()?;

        debug!(iterations, distance_m, "running scenario on caller rng");
        let records: Vec<_> = (0..iterations)
            .map(|i| self.iterate(&samplers, i, distance_m, params, &mut *rng))
            .collect();
        Self::log_undefined(&records);
        Ok(records)
    }

    /// Runs `iterations` iterations on independent per-iteration streams.
    ///
    /// Large runs are split across the configured worker threads; output
    /// order and content do not depend on the split.
    pub fn run_seeded(
        &self,
        waypoints: &[Waypoint],
        params: &MissionParameters,
        distributions: &ScenarioDistributions,
        iterations: usize,
        seed: u64,
    ) -> ForecastResult<Vec<OutcomeRecord>> {
        let distance_m = self.check_inputs(waypoints, params, iterations)?;
        let samplers = distributions.samplers()?;
        let limits = &self.config.simulation;

        let run_range = |range: std::ops::Range<usize>| -> Vec<OutcomeRecord> {
            range
                .map(|i| {
                    let mut rng = iteration_rng(seed, i);
                    self.iterate(&samplers, i, distance_m, params, &mut rng)
                })
                .collect()
        };

        let workers = limits.workers.max(1);
        let records = if workers == 1 || iterations < limits.parallel_threshold {
            debug!(iterations, seed, "running scenario on calling thread");
            run_range(0..iterations)
        } else {
            let chunk = iterations.div_ceil(workers);
            debug!(iterations, seed, workers, chunk, "running scenario on worker threads");
            std::thread::scope(|scope| -> ForecastResult<Vec<OutcomeRecord>> {
                let run_range = &run_range;
                let handles: Vec<_> = (0..iterations)
                    .step_by(chunk)
                    .map(|start| {
                        let end = (start + chunk).min(iterations);
                        scope.spawn(move || run_range(start..end))
                    })
                    .collect();

                let mut out = Vec::with_capacity(iterations);
                for handle in handles {
                    let part = handle.join().map_err(|payload| ExecutionError::WorkerPanicked {
                        message: panic_message(payload.as_ref()),
                    })?;
                    out.extend(part);
                }
                Ok(out)
            })?
        };

        Self::log_undefined(&records);
        Ok(records)
    }

    /// Runs a scenario and summarizes it.
    pub fn simulate(&self, spec: &ScenarioSpec) -> ForecastResult<ScenarioReport> {
        let iterations = self.config.simulation.resolve_iterations(spec.iterations)?;
        let distributions = spec
            .distributions
            .as_ref()
            .unwrap_or(&self.config.distributions);

        let records = self.run_seeded(
            &spec.waypoints,
            &spec.parameters,
            distributions,
            iterations,
            spec.seed,
        )?;
        let summary = summarize(&records, &self.config.thresholds)?;
        let run_id = Uuid::new_v4();

        info!(
            %run_id,
            iterations,
            seed = spec.seed,
            high_risk = summary.high_risk_count,
            low_risk = summary.low_risk_count,
            undefined_duration = summary.undefined_duration_count,
            "scenario run complete"
        );

        Ok(ScenarioReport {
            run_id,
            seed: spec.seed,
            distance_m: self.config.geometry.route_distance_m(&spec.waypoints),
            summary,
            records,
        })
    }
}
