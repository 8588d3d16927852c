//! Forecast configuration.
//!
//! Every table, threshold and limit used by the engine and the scorers is a
//! field here, so deployments can override them without code changes.
//!
//! Resolution order (highest priority first):
//! 1. Environment variables (`MISSIONCAST_*`)
//! 2. TOML file passed to [`ForecastConfig::load`]
//! 3. Compiled defaults

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::labels::Thresholds;
use crate::mission::{total_distance, Waypoint};
use crate::runtime::RuntimeConfig;
use crate::scoring::ScoringModel;
use crate::simulation::{OutcomeModel, ScenarioDistributions, SimulationLimits};
use crate::tables::RiskTables;

/// Environment variable overriding `simulation.max_iterations`.
pub const ENV_MAX_ITERATIONS: &str = "MISSIONCAST_MAX_ITERATIONS";
/// Environment variable overriding `simulation.workers`.
pub const ENV_WORKERS: &str = "MISSIONCAST_WORKERS";

/// Route geometry scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Multiplier from planar degree distance to meters.
    ///
    /// Not a geodesic conversion; kept at 1000 for compatibility.
    pub meters_per_degree: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            meters_per_degree: 1000.0,
        }
    }
}

impl GeometryConfig {
    /// Route length in meters.
    #[must_use]
    pub fn route_distance_m(&self, waypoints: &[Waypoint]) -> f64 {
        total_distance(waypoints) * self.meters_per_degree
    }

    /// Route length in meters, rejecting a scaled length that overflows.
    pub fn checked_route_distance_m(&self, waypoints: &[Waypoint]) -> Result<f64, ValidationError> {
        let distance_m = self.route_distance_m(waypoints);
        if !distance_m.is_finite() {
            return Err(ValidationError::InvalidParameter {
                field: "route distance".to_string(),
                value: distance_m,
            });
        }
        Ok(distance_m)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ForecastConfig {
    /// Route distance scaling.
    pub geometry: GeometryConfig,
    /// Speed and energy factors for composed outcomes.
    pub outcome: OutcomeModel,
    /// Per-condition risk weights.
    pub risk: RiskTables,
    /// Point-estimate coefficients.
    pub scoring: ScoringModel,
    /// Classification cut-offs.
    pub thresholds: Thresholds,
    /// Default scenario condition distributions.
    pub distributions: ScenarioDistributions,
    /// Iteration and worker limits.
    pub simulation: SimulationLimits,
    /// Request worker pool.
    pub runtime: RuntimeConfig,
}

impl ForecastConfig {
    /// Loads a TOML file, applies environment overrides and validates.
    pub fn load(path: &Path) -> Result<Self, ValidationError> {
        let text = std::fs::read_to_string(path).map_err(|e| ValidationError::InvalidConfig {
            field: path.display().to_string(),
            reason: format!("failed to read: {e}"),
        })?;
        let mut config = Self::parse(&text, &path.display().to_string())?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Compiled defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ValidationError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ValidationError> {
        let config = Self::parse(toml_str, "<string>")?;
        config.validate()?;
        Ok(config)
    }

    fn parse(text: &str, origin: &str) -> Result<Self, ValidationError> {
        toml::from_str(text).map_err(|e| ValidationError::InvalidConfig {
            field: origin.to_string(),
            reason: e.to_string(),
        })
    }

    fn apply_env_overrides(&mut self) -> Result<(), ValidationError> {
        if let Some(v) = env_usize(ENV_MAX_ITERATIONS)? {
            self.simulation.max_iterations = v;
        }
        if let Some(v) = env_usize(ENV_WORKERS)? {
            self.simulation.workers = v;
        }
        Ok(())
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.geometry.meters_per_degree.is_finite() || self.geometry.meters_per_degree <= 0.0 {
            return Err(ValidationError::InvalidConfig {
                field: "geometry.meters_per_degree".to_string(),
                reason: "must be a positive number".to_string(),
            });
        }
        self.outcome.validate()?;
        self.risk.validate()?;
        self.scoring.validate()?;
        self.distributions.validate()?;
        self.simulation.validate()?;
        self.runtime.validate()?;
        validate_thresholds(&self.thresholds)
    }
}

fn env_usize(name: &str) -> Result<Option<usize>, ValidationError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ValidationError::InvalidConfig {
                field: name.to_string(),
                reason: format!("'{raw}' is not a non-negative integer"),
            }),
        Err(_) => Ok(None),
    }
}

fn validate_thresholds(t: &Thresholds) -> Result<(), ValidationError> {
    let ordered = |field: &str, lo: f64, hi: f64| {
        if lo.is_finite() && hi.is_finite() && lo <= hi {
            Ok(())
        } else {
            Err(ValidationError::InvalidConfig {
                field: format!("thresholds.{field}"),
                reason: format!("expected {lo} <= {hi}"),
            })
        }
    };
    ordered("risk_low_below", t.risk_low_below, t.risk_medium_below)?;
    ordered("low_risk_below", t.low_risk_below, t.high_risk_above)?;
    ordered("battery_medium_above", t.battery_medium_above, t.battery_high_above)?;
    ordered("payload_light_below", t.payload_light_below, t.payload_medium_below)?;
    ordered(
        "maintenance_recommended_at",
        t.maintenance_recommended_at,
        t.maintenance_required_at,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::simulation::UndefinedDurationPolicy;

    #[test]
    fn defaults_are_valid() {
        ForecastConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = ForecastConfig::from_toml("").unwrap();
        assert_eq!(config, ForecastConfig::default());
    }

    #[test]
    fn partial_toml_overrides_named_fields_only() {
        let config = ForecastConfig::from_toml(
            r#"
            [simulation]
            max_iterations = 500
            default_iterations = 100
            undefined_duration = { mode = "redraw", max_attempts = 3 }

            [thresholds]
            high_risk_above = 0.7

            [risk.weather]
            default = 0.6
            entries = { CLEAR = 0.05, STORM = 1.0 }
            "#,
        )
        .unwrap();
        assert_eq!(config.simulation.max_iterations, 500);
        assert_eq!(config.simulation.workers, SimulationLimits::default().workers);
        assert_eq!(
            config.simulation.undefined_duration,
            UndefinedDurationPolicy::Redraw { max_attempts: 3 }
        );
        assert_eq!(config.thresholds.high_risk_above, 0.7);
        assert_eq!(config.thresholds.low_risk_below, 0.3);
        assert_eq!(config.risk.weather.get("storm"), 1.0);
        assert_eq!(config.risk.weather.get("RAINY"), 0.6);
        assert_eq!(config.risk.traffic, RiskTables::default().traffic);
    }

    #[test]
    fn invalid_distribution_in_toml_is_rejected() {
        let err = ForecastConfig::from_toml(
            r#"
            [distributions.weather]
            labels = ["CLEAR", "STORM"]
            weights = [0.0, 0.0]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDistribution { .. }));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = ForecastConfig::from_toml("[simulation\nmax_iterations = ").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidConfig { .. }));
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        let mut config = ForecastConfig::default();
        config.thresholds.risk_low_below = 0.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missioncast.toml");
        std::fs::write(&path, "[geometry]\nmeters_per_degree = 111320.0\n").unwrap();
        let config = ForecastConfig::load(&path).unwrap();
        assert_eq!(config.geometry.meters_per_degree, 111_320.0);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ForecastConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidConfig { .. }));
    }

    #[test]
    fn route_distance_scales_planar_degrees() {
        let g = GeometryConfig::default();
        let route = [Waypoint::new(0.0, 0.0), Waypoint::new(0.0, 1.0)];
        assert_eq!(g.route_distance_m(&route), 1000.0);
        assert_eq!(g.route_distance_m(&route[..1]), 0.0);
    }

    #[test]
    fn checked_route_distance_rejects_overflow() {
        let g = GeometryConfig {
            meters_per_degree: f64::MAX,
        };
        let route = [Waypoint::new(0.0, 0.0), Waypoint::new(0.0, 2.0)];
        let err = g.checked_route_distance_m(&route).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidParameter { ref field, .. } if field == "route distance"));
        assert_eq!(GeometryConfig::default().checked_route_distance_m(&route).unwrap(), 2000.0);
    }
}
