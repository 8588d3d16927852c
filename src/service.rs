//! Prediction service.
//!
//! Plain request/response structures for every prediction operation. The gRPC
//! transport converts its messages into these; callers embedding the crate can
//! use them directly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::ForecastConfig;
use crate::error::{ForecastResult, ValidationError};
use crate::explain;
use crate::labels::{BatteryLevel, MaintenanceLevel, RiskLevel};
use crate::mission::{validate_route, MissionParameters, Waypoint, MAX_LABEL_LEN};
use crate::runtime::ScenarioRuntime;
use crate::scoring::PointScorer;
use crate::simulation::{derive_seed, ScenarioDistributions, ScenarioEngine, ScenarioReport, ScenarioSpec};

/// Maximum mission identifier length in bytes.
pub const MAX_MISSION_ID_LEN: usize = 256;

fn validate_mission_id(mission_id: &str) -> Result<(), ValidationError> {
    if mission_id.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: "mission_id".to_string(),
        });
    }
    if mission_id.len() > MAX_MISSION_ID_LEN {
        return Err(ValidationError::FieldTooLong {
            field: "mission_id".to_string(),
            max_length: MAX_MISSION_ID_LEN,
        });
    }
    Ok(())
}

fn validate_label(field: &str, label: &str) -> Result<(), ValidationError> {
    if label.len() > MAX_LABEL_LEN {
        return Err(ValidationError::FieldTooLong {
            field: field.to_string(),
            max_length: MAX_LABEL_LEN,
        });
    }
    Ok(())
}

fn validate_quantity(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidParameter {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn validate_common(mission_id: &str, waypoints: &[Waypoint]) -> Result<(), ValidationError> {
    validate_mission_id(mission_id)?;
    validate_route(waypoints)
}

/// Mission risk request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionRiskRequest {
    /// Caller-assigned mission identifier.
    pub mission_id: String,
    /// Free-form mission category, echoed back.
    #[serde(default)]
    pub mission_type: String,
    /// Mission parameters.
    pub parameters: MissionParameters,
    /// Planned route.
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

/// Mission risk response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionRiskResponse {
    /// Caller-assigned mission identifier.
    pub mission_id: String,
    /// Free-form mission category, echoed back.
    pub mission_type: String,
    /// Mean of the four risk factors, in `[0, 1]`.
    pub risk_score: f64,
    /// Classified risk score.
    pub risk_level: RiskLevel,
    /// Human-readable explanation.
    pub analysis: String,
    /// When the prediction was made.
    pub predicted_at: DateTime<Utc>,
}

/// Battery level request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryLevelRequest {
    /// Caller-assigned mission identifier.
    pub mission_id: String,
    /// Current battery voltage.
    pub voltage: f64,
    /// Payload mass.
    #[serde(default)]
    pub payload_kg: f64,
    /// Planned route.
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

/// Battery level response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryLevelResponse {
    /// Caller-assigned mission identifier.
    pub mission_id: String,
    /// Voltage expected at mission end.
    pub predicted_voltage: f64,
    /// Classified end-of-mission voltage.
    pub battery_level: BatteryLevel,
    /// Human-readable explanation.
    pub analysis: String,
    /// When the prediction was made.
    pub predicted_at: DateTime<Utc>,
}

/// Energy consumption request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyRequest {
    /// Caller-assigned mission identifier.
    pub mission_id: String,
    /// Payload mass.
    #[serde(default)]
    pub payload_kg: f64,
    /// Planned route.
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

/// Energy consumption response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyResponse {
    /// Caller-assigned mission identifier.
    pub mission_id: String,
    /// Predicted consumption in watt-hours.
    pub energy_wh: f64,
    /// Human-readable explanation.
    pub analysis: String,
    /// When the prediction was made.
    pub predicted_at: DateTime<Utc>,
}

/// Weather or traffic impact request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRequest {
    /// Caller-assigned mission identifier.
    pub mission_id: String,
    /// Weather or traffic label, depending on the operation.
    pub condition: String,
    /// Planned route.
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

/// Weather or traffic impact response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResponse {
    /// Caller-assigned mission identifier.
    pub mission_id: String,
    /// Condition label the impact was computed for.
    pub condition: String,
    /// Expected delay in seconds.
    pub delay_s: f64,
    /// Fractional energy increase.
    pub energy_increase: f64,
    /// Human-readable explanation.
    pub analysis: String,
    /// When the prediction was made.
    pub predicted_at: DateTime<Utc>,
}

/// Maintenance request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    /// Caller-assigned mission identifier.
    pub mission_id: String,
    /// Payload mass.
    #[serde(default)]
    pub payload_kg: f64,
    /// Planned route.
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

/// Maintenance response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceResponse {
    /// Caller-assigned mission identifier.
    pub mission_id: String,
    /// Maintenance probability, in `[0, 1]`.
    pub probability: f64,
    /// Classified maintenance probability.
    pub recommendation: MaintenanceLevel,
    /// Human-readable explanation.
    pub analysis: String,
    /// When the prediction was made.
    pub predicted_at: DateTime<Utc>,
}

/// Scenario run request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    /// Caller-assigned mission identifier.
    pub mission_id: String,
    /// Mission parameters.
    pub parameters: MissionParameters,
    /// Planned route.
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    /// Iteration count; the configured default when absent.
    #[serde(default)]
    pub iterations: Option<usize>,
    /// Run seed; derived from `mission_id` when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Per-request distribution overrides.
    #[serde(default)]
    pub distributions: Option<ScenarioDistributions>,
    /// Keep per-iteration records in the response.
    #[serde(default)]
    pub include_records: bool,
}

/// Scenario run response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResponse {
    /// Caller-assigned mission identifier.
    pub mission_id: String,
    /// Summary and, when requested, records.
    pub report: ScenarioReport,
    /// Human-readable explanation.
    pub analysis: String,
    /// When the prediction was made.
    pub predicted_at: DateTime<Utc>,
}

/// Stateless prediction service over one configuration.
#[derive(Debug)]
pub struct ForecastService {
    config: Arc<ForecastConfig>,
    scorer: PointScorer,
    runtime: ScenarioRuntime,
}

impl ForecastService {
    /// Validates `config` and starts the scenario workers.
    pub fn new(config: ForecastConfig) -> ForecastResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let engine = ScenarioEngine::new(Arc::clone(&config));
        let runtime = ScenarioRuntime::new(engine, &config.runtime)?;
        Ok(Self {
            scorer: PointScorer::new(Arc::clone(&config)),
            config,
            runtime,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    fn distance_m(&self, waypoints: &[Waypoint]) -> ForecastResult<f64> {
        Ok(self.config.geometry.checked_route_distance_m(waypoints)?)
    }

    /// Four-factor mission risk.
    pub fn predict_mission_risk(&self, req: MissionRiskRequest) -> ForecastResult<MissionRiskResponse> {
        validate_common(&req.mission_id, &req.waypoints)?;
        validate_label("mission_type", &req.mission_type)?;
        req.parameters.validate()?;

        let estimate = self.scorer.mission_risk(&req.parameters);
        debug!(mission_id = %req.mission_id, score = estimate.score, level = %estimate.level, "mission risk");
        Ok(MissionRiskResponse {
            analysis: explain::risk(&estimate),
            mission_id: req.mission_id,
            mission_type: req.mission_type,
            risk_score: estimate.score,
            risk_level: estimate.level,
            predicted_at: Utc::now(),
        })
    }

    /// Battery voltage after the route.
    pub fn predict_battery_level(&self, req: BatteryLevelRequest) -> ForecastResult<BatteryLevelResponse> {
        validate_common(&req.mission_id, &req.waypoints)?;
        validate_quantity("voltage", req.voltage)?;
        validate_quantity("payload_kg", req.payload_kg)?;

        let distance_m = self.distance_m(&req.waypoints)?;
        let estimate = self.scorer.battery(req.voltage, req.payload_kg, distance_m);
        debug!(mission_id = %req.mission_id, voltage = estimate.voltage, "battery level");
        Ok(BatteryLevelResponse {
            analysis: explain::battery(&estimate, req.payload_kg, distance_m),
            mission_id: req.mission_id,
            predicted_voltage: estimate.voltage,
            battery_level: estimate.level,
            predicted_at: Utc::now(),
        })
    }

    /// Energy for the route and payload.
    pub fn predict_energy_consumption(&self, req: EnergyRequest) -> ForecastResult<EnergyResponse> {
        validate_common(&req.mission_id, &req.waypoints)?;
        validate_quantity("payload_kg", req.payload_kg)?;

        let distance_m = self.distance_m(&req.waypoints)?;
        let energy_wh = self.scorer.energy_wh(distance_m, req.payload_kg);
        debug!(mission_id = %req.mission_id, energy_wh, "energy consumption");
        Ok(EnergyResponse {
            analysis: explain::energy(energy_wh, req.payload_kg, distance_m),
            mission_id: req.mission_id,
            energy_wh,
            predicted_at: Utc::now(),
        })
    }

    /// Delay and energy increase caused by a weather condition.
    pub fn predict_weather_impact(&self, req: ImpactRequest) -> ForecastResult<ImpactResponse> {
        validate_common(&req.mission_id, &req.waypoints)?;
        validate_label("weather_condition", &req.condition)?;

        let estimate = self.scorer.weather_impact(&req.condition, self.distance_m(&req.waypoints)?);
        debug!(mission_id = %req.mission_id, condition = %req.condition, delay_s = estimate.delay_s, "weather impact");
        Ok(ImpactResponse {
            analysis: explain::weather_impact(&req.condition, &estimate),
            mission_id: req.mission_id,
            condition: req.condition,
            delay_s: estimate.delay_s,
            energy_increase: estimate.energy_increase,
            predicted_at: Utc::now(),
        })
    }

    /// Delay and energy increase caused by a traffic condition.
    pub fn predict_traffic_impact(&self, req: ImpactRequest) -> ForecastResult<ImpactResponse> {
        validate_common(&req.mission_id, &req.waypoints)?;
        validate_label("traffic_condition", &req.condition)?;

        let estimate = self.scorer.traffic_impact(&req.condition, self.distance_m(&req.waypoints)?);
        debug!(mission_id = %req.mission_id, condition = %req.condition, delay_s = estimate.delay_s, "traffic impact");
        Ok(ImpactResponse {
            analysis: explain::traffic_impact(&req.condition, &estimate),
            mission_id: req.mission_id,
            condition: req.condition,
            delay_s: estimate.delay_s,
            energy_increase: estimate.energy_increase,
            predicted_at: Utc::now(),
        })
    }

    /// Maintenance probability and recommendation.
    pub fn predict_maintenance(&self, req: MaintenanceRequest) -> ForecastResult<MaintenanceResponse> {
        validate_common(&req.mission_id, &req.waypoints)?;
        validate_quantity("payload_kg", req.payload_kg)?;

        let distance_m = self.distance_m(&req.waypoints)?;
        let estimate = self.scorer.maintenance(distance_m, req.payload_kg);
        let payload = self.config.thresholds.payload_level(req.payload_kg);
        debug!(mission_id = %req.mission_id, probability = estimate.probability, "maintenance");
        Ok(MaintenanceResponse {
            analysis: explain::maintenance(&estimate, distance_m, payload.as_str()),
            mission_id: req.mission_id,
            probability: estimate.probability,
            recommendation: estimate.level,
            predicted_at: Utc::now(),
        })
    }

    /// Runs a Monte Carlo scenario on the worker pool.
    ///
    /// Blocks until the run completes or the configured request timeout passes.
    #[instrument(skip_all, fields(mission_id = %req.mission_id))]
    pub fn run_scenario(&self, req: ScenarioRequest) -> ForecastResult<ScenarioResponse> {
        validate_common(&req.mission_id, &req.waypoints)?;
        req.parameters.validate()?;
        if let Some(d) = &req.distributions {
            d.validate()?;
        }

        let seed = req.seed.unwrap_or_else(|| derive_seed(&req.mission_id));
        let spec = ScenarioSpec {
            waypoints: req.waypoints,
            parameters: req.parameters,
            distributions: req.distributions,
            iterations: req.iterations,
            seed,
        };
        let mut report = self.runtime.execute(spec)?;
        if !req.include_records {
            report.records = Vec::new();
        }
        Ok(ScenarioResponse {
            analysis: explain::simulation(&report.summary),
            mission_id: req.mission_id,
            report,
            predicted_at: Utc::now(),
        })
    }
}
