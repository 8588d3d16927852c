//! Deterministic point estimators.
//!
//! Single-shot formulas with no randomness. They share the risk tables and
//! thresholds with the scenario engine so both agree on every label.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::error::ValidationError;
use crate::labels::{traffic, weather, BatteryLevel, MaintenanceLevel, PayloadLevel, RiskLevel};
use crate::mission::MissionParameters;
use crate::tables::{FactorTable, TrafficImpactTable};

/// Coefficients of the point estimators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringModel {
    /// Voltage drop per kilogram of payload.
    pub battery_volts_per_kg: f64,
    /// Voltage drop per kilometer of route.
    pub battery_volts_per_km: f64,
    /// Energy per meter of route.
    pub energy_wh_per_meter: f64,
    /// Energy per kilogram of payload.
    pub energy_wh_per_payload_kg: f64,
    /// Delay seconds per meter before the weather factor is applied.
    pub weather_seconds_per_meter: f64,
    /// Delay factor per weather label.
    pub weather_delay: FactorTable,
    /// Energy increase per weather label.
    pub weather_energy: FactorTable,
    /// Delay and energy per traffic label.
    pub traffic: TrafficImpactTable,
    /// Maintenance probability per meter of route.
    pub maintenance_per_meter: f64,
    /// Maintenance probability per kilogram of payload.
    pub maintenance_per_payload_kg: f64,
    /// Constant vehicle-age term of the maintenance probability.
    pub maintenance_age_term: f64,
    /// Traffic label assumed by the mission risk estimate.
    pub assumed_traffic: String,
}

impl Default for ScoringModel {
    fn default() -> Self {
        Self {
            battery_volts_per_kg: 0.01,
            battery_volts_per_km: 0.05,
            energy_wh_per_meter: 0.001,
            energy_wh_per_payload_kg: 0.1,
            weather_seconds_per_meter: 0.001,
            weather_delay: FactorTable::new(
                [
                    (weather::CLEAR, 0.0),
                    (weather::CLOUDY, 0.1),
                    (weather::RAINY, 0.3),
                    (weather::SNOWY, 0.5),
                    (weather::STORM, 0.8),
                ],
                0.1,
            ),
            weather_energy: FactorTable::new(
                [
                    (weather::CLEAR, 0.0),
                    (weather::CLOUDY, 0.05),
                    (weather::RAINY, 0.15),
                    (weather::SNOWY, 0.25),
                    (weather::STORM, 0.4),
                ],
                0.05,
            ),
            traffic: TrafficImpactTable::default(),
            maintenance_per_meter: 0.0001,
            maintenance_per_payload_kg: 0.001,
            maintenance_age_term: 0.001,
            assumed_traffic: traffic::MODERATE.to_string(),
        }
    }
}

impl ScoringModel {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        self.weather_delay.validate("scoring.weather_delay")?;
        self.weather_energy.validate("scoring.weather_energy")?;
        self.traffic.validate("scoring.traffic")?;
        for (field, value) in [
            ("battery_volts_per_kg", self.battery_volts_per_kg),
            ("battery_volts_per_km", self.battery_volts_per_km),
            ("energy_wh_per_meter", self.energy_wh_per_meter),
            ("energy_wh_per_payload_kg", self.energy_wh_per_payload_kg),
            ("weather_seconds_per_meter", self.weather_seconds_per_meter),
            ("maintenance_per_meter", self.maintenance_per_meter),
            ("maintenance_per_payload_kg", self.maintenance_per_payload_kg),
            ("maintenance_age_term", self.maintenance_age_term),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidConfig {
                    field: format!("scoring.{field}"),
                    reason: "must be a non-negative number".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Battery voltage at the end of the route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryEstimate {
    /// Predicted voltage.
    pub voltage: f64,
    /// Band of the predicted voltage.
    pub level: BatteryLevel,
}

/// Delay and energy effect of a condition on a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactEstimate {
    /// Added delay.
    pub delay_s: f64,
    /// Fractional energy increase.
    pub energy_increase: f64,
}

/// Probability that the vehicle needs maintenance after the mission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceEstimate {
    /// Probability in [0, 1].
    pub probability: f64,
    /// Recommendation band.
    pub level: MaintenanceLevel,
}

/// Labels that fed a mission risk estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactors {
    /// Normalized weather label.
    pub weather: String,
    /// Assumed traffic label.
    pub traffic: String,
    /// Battery band, when a voltage was supplied.
    pub battery: Option<BatteryLevel>,
    /// Payload band.
    pub payload: PayloadLevel,
}

/// Mission risk point estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEstimate {
    /// Composite score in [0, 1].
    pub score: f64,
    /// Risk band.
    pub level: RiskLevel,
    /// Inputs to the score.
    pub factors: RiskFactors,
}

/// Point estimators over a shared configuration.
#[derive(Debug, Clone)]
pub struct PointScorer {
    config: Arc<ForecastConfig>,
}

impl PointScorer {
    /// Creates a scorer.
    #[must_use]
    pub fn new(config: Arc<ForecastConfig>) -> Self {
        Self { config }
    }

    /// `voltage - payload_kg * 0.01 - distance_km * 0.05`, banded.
    #[must_use]
    pub fn battery(&self, voltage: f64, payload_kg: f64, distance_m: f64) -> BatteryEstimate {
        let m = &self.config.scoring;
        let distance_km = distance_m / 1000.0;
        let predicted = voltage - payload_kg * m.battery_volts_per_kg - distance_km * m.battery_volts_per_km;
        BatteryEstimate {
            voltage: predicted,
            level: self.config.thresholds.battery_level(predicted),
        }
    }

    /// `distance_m * 0.001 + payload_kg * 0.1`.
    #[must_use]
    pub fn energy_wh(&self, distance_m: f64, payload_kg: f64) -> f64 {
        let m = &self.config.scoring;
        distance_m * m.energy_wh_per_meter + payload_kg * m.energy_wh_per_payload_kg
    }

    /// Weather delay and energy increase.
    #[must_use]
    pub fn weather_impact(&self, condition: &str, distance_m: f64) -> ImpactEstimate {
        let m = &self.config.scoring;
        ImpactEstimate {
            delay_s: distance_m * m.weather_seconds_per_meter * m.weather_delay.get(condition),
            energy_increase: m.weather_energy.get(condition),
        }
    }

    /// Traffic delay and energy increase.
    #[must_use]
    pub fn traffic_impact(&self, condition: &str, distance_m: f64) -> ImpactEstimate {
        let impact = self.config.scoring.traffic.get(condition);
        ImpactEstimate {
            delay_s: distance_m * impact.seconds_per_meter,
            energy_increase: impact.energy_increase,
        }
    }

    /// Maintenance probability, clamped to [0, 1].
    #[must_use]
    pub fn maintenance(&self, distance_m: f64, payload_kg: f64) -> MaintenanceEstimate {
        let m = &self.config.scoring;
        let raw = distance_m * m.maintenance_per_meter
            + payload_kg * m.maintenance_per_payload_kg
            + m.maintenance_age_term;
        let probability = raw.clamp(0.0, 1.0);
        MaintenanceEstimate {
            probability,
            level: self.config.thresholds.maintenance_level(probability),
        }
    }

    /// Four-factor mission risk with the assumed traffic label.
    #[must_use]
    pub fn mission_risk(&self, params: &MissionParameters) -> RiskEstimate {
        let thresholds = &self.config.thresholds;
        let factors = RiskFactors {
            weather: crate::tables::normalize_label(&params.weather_condition),
            traffic: self.config.scoring.assumed_traffic.clone(),
            battery: params.battery_voltage.map(|v| thresholds.battery_level(v)),
            payload: thresholds.payload_level(params.payload_kg),
        };
        let score = self.config.risk.score(
            &factors.weather,
            &factors.traffic,
            factors.battery.map_or("", BatteryLevel::as_str),
            factors.payload.as_str(),
        );
        RiskEstimate {
            score,
            level: thresholds.risk_level(score),
            factors,
        }
    }
}
