//! Per-iteration outcome composition.
//!
//! Combines one set of sampled conditions with the route distance and
//! mission parameters into duration, energy and risk. Unknown labels fall
//! back to each table's default weight; composition never fails on a label.

use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::labels::{payload, weather};
use crate::mission::MissionParameters;
use crate::tables::{FactorTable, RiskTables};

const KMH_PER_MPS: f64 = 3.6;

/// Conditions drawn for a single iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampledConditions {
    /// Weather label.
    pub weather: String,
    /// Traffic label.
    pub traffic: String,
    /// Battery label.
    pub battery: String,
    /// Payload label.
    pub payload: String,
}

impl SampledConditions {
    /// Convenience constructor.
    pub fn new(
        weather: impl Into<String>,
        traffic: impl Into<String>,
        battery: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            weather: weather.into(),
            traffic: traffic.into(),
            battery: battery.into(),
            payload: payload.into(),
        }
    }
}

/// Outcome of one simulated iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Position in submission order.
    pub iteration_index: usize,
    /// Sampled weather.
    pub weather: String,
    /// Sampled traffic.
    pub traffic: String,
    /// Sampled battery state.
    pub battery: String,
    /// Sampled payload class.
    pub payload: String,
    /// Route distance.
    pub distance_m: f64,
    /// Travel time; `None` when the effective speed is zero.
    pub duration_s: Option<f64>,
    /// Energy consumed.
    pub energy_wh: f64,
    /// Composite risk in [0, 1].
    pub risk_score: f64,
}

impl OutcomeRecord {
    /// Returns the duration, or `UndefinedDuration` for zero-speed samples.
    pub fn duration(&self) -> Result<f64, ExecutionError> {
        self.duration_s.ok_or(ExecutionError::UndefinedDuration {
            iteration_index: self.iteration_index,
        })
    }

    /// True when the duration could not be computed.
    #[must_use]
    pub const fn has_undefined_duration(&self) -> bool {
        self.duration_s.is_none()
    }
}

/// Speed and energy factor tables used by the composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeModel {
    /// Speed multiplier per weather label.
    pub weather_speed: FactorTable,
    /// Speed multiplier per traffic label.
    pub traffic_speed: FactorTable,
    /// Base energy per meter of route.
    pub wh_per_meter: f64,
    /// Extra energy fraction per payload label.
    pub payload_energy: FactorTable,
    /// Extra energy fraction per weather label.
    pub weather_energy: FactorTable,
}

impl Default for OutcomeModel {
    fn default() -> Self {
        use crate::labels::traffic;
        Self {
            weather_speed: FactorTable::new(
                [
                    (weather::CLEAR, 1.0),
                    (weather::CLOUDY, 0.95),
                    (weather::RAINY, 0.8),
                    (weather::SNOWY, 0.6),
                    (weather::STORM, 0.4),
                ],
                1.0,
            ),
            traffic_speed: FactorTable::new(
                [
                    (traffic::LIGHT, 1.0),
                    (traffic::MODERATE, 0.8),
                    (traffic::HEAVY, 0.6),
                    (traffic::JAM, 0.4),
                ],
                1.0,
            ),
            wh_per_meter: 0.001,
            payload_energy: FactorTable::new(
                [(payload::LIGHT, 0.0), (payload::MEDIUM, 0.1), (payload::HEAVY, 0.2)],
                0.0,
            ),
            weather_energy: FactorTable::new(
                [
                    (weather::CLEAR, 0.0),
                    (weather::CLOUDY, 0.05),
                    (weather::RAINY, 0.15),
                    (weather::SNOWY, 0.25),
                    (weather::STORM, 0.4),
                ],
                0.0,
            ),
        }
    }
}

impl OutcomeModel {
    pub(crate) fn validate(&self) -> Result<(), crate::error::ValidationError> {
        self.weather_speed.validate("outcome.weather_speed")?;
        self.traffic_speed.validate("outcome.traffic_speed")?;
        self.payload_energy.validate("outcome.payload_energy")?;
        self.weather_energy.validate("outcome.weather_energy")?;
        if !self.wh_per_meter.is_finite() || self.wh_per_meter < 0.0 {
            return Err(crate::error::ValidationError::InvalidConfig {
                field: "outcome.wh_per_meter".to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }
        Ok(())
    }

    /// Travel time for the route under the given weather and traffic.
    ///
    /// Fails with `UndefinedDuration` when the effective speed is zero.
    pub fn duration_s(
        &self,
        iteration_index: usize,
        distance_m: f64,
        max_speed_kmh: f64,
        weather: &str,
        traffic: &str,
    ) -> Result<f64, ExecutionError> {
        let base_speed_mps = max_speed_kmh / KMH_PER_MPS;
        let effective = base_speed_mps * self.weather_speed.get(weather) * self.traffic_speed.get(traffic);
        if effective == 0.0 || !effective.is_finite() {
            return Err(ExecutionError::UndefinedDuration { iteration_index });
        }
        Ok(distance_m / effective)
    }

    /// Energy for the route under the given payload and weather.
    #[must_use]
    pub fn energy_wh(&self, distance_m: f64, payload: &str, weather: &str) -> f64 {
        let base = distance_m * self.wh_per_meter;
        base * (1.0 + self.payload_energy.get(payload) + self.weather_energy.get(weather))
    }

    /// Composes one outcome record.
    #[must_use]
    pub fn compose(
        &self,
        risk: &RiskTables,
        iteration_index: usize,
        conditions: SampledConditions,
        distance_m: f64,
        params: &MissionParameters,
    ) -> OutcomeRecord {
        let duration_s = self
            .duration_s(
                iteration_index,
                distance_m,
                params.max_speed_kmh,
                &conditions.weather,
                &conditions.traffic,
            )
            .ok();
        let energy_wh = self.energy_wh(distance_m, &conditions.payload, &conditions.weather);
        let risk_score = risk.score(
            &conditions.weather,
            &conditions.traffic,
            &conditions.battery,
            &conditions.payload,
        );

        let SampledConditions {
            weather,
            traffic,
            battery,
            payload,
        } = conditions;

        OutcomeRecord {
            iteration_index,
            weather,
            traffic,
            battery,
            payload,
            distance_m,
            duration_s,
            energy_wh,
            risk_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(speed: f64) -> MissionParameters {
        MissionParameters {
            max_speed_kmh: speed,
            ..MissionParameters::default()
        }
    }

    #[test]
    fn clear_light_outcome() {
        let model = OutcomeModel::default();
        let risk = RiskTables::default();
        let rec = model.compose(
            &risk,
            0,
            SampledConditions::new("CLEAR", "LIGHT", "HIGH", "LIGHT"),
            3600.0,
            &params(36.0),
        );
        // 36 km/h = 10 m/s
        assert!((rec.duration().unwrap() - 360.0).abs() < 1e-9);
        assert!((rec.energy_wh - 3.6).abs() < 1e-12);
        assert!((rec.risk_score - 0.1).abs() < 1e-12);
    }

    #[test]
    fn storm_jam_heavy_outcome() {
        let model = OutcomeModel::default();
        let risk = RiskTables::default();
        let rec = model.compose(
            &risk,
            4,
            SampledConditions::new("STORM", "JAM", "LOW", "HEAVY"),
            1000.0,
            &params(36.0),
        );
        let expected_duration = 1000.0 / (10.0 * 0.4 * 0.4);
        assert!((rec.duration().unwrap() - expected_duration).abs() < 1e-9);
        assert!((rec.energy_wh - 1.0 * (1.0 + 0.2 + 0.4)).abs() < 1e-12);
        assert!((rec.risk_score - 0.7).abs() < 1e-12);
        assert_eq!(rec.iteration_index, 4);
        assert_eq!(rec.weather, "STORM");
    }

    #[test]
    fn zero_speed_raises_undefined_duration() {
        let model = OutcomeModel::default();
        let risk = RiskTables::default();
        let rec = model.compose(
            &risk,
            9,
            SampledConditions::new("CLEAR", "LIGHT", "HIGH", "LIGHT"),
            500.0,
            &params(0.0),
        );
        assert!(rec.has_undefined_duration());
        assert_eq!(
            rec.duration().unwrap_err(),
            ExecutionError::UndefinedDuration { iteration_index: 9 }
        );
        // Energy and risk are still defined.
        assert!((rec.energy_wh - 0.5).abs() < 1e-12);
        assert!((rec.risk_score - 0.1).abs() < 1e-12);

        assert!(model.duration_s(9, 500.0, 0.0, "CLEAR", "LIGHT").is_err());
    }

    #[test]
    fn zero_speed_factor_is_undefined() {
        let mut model = OutcomeModel::default();
        model.weather_speed.entries.insert("GROUNDED".to_string(), 0.0);
        let err = model.duration_s(1, 100.0, 50.0, "GROUNDED", "LIGHT").unwrap_err();
        assert_eq!(err, ExecutionError::UndefinedDuration { iteration_index: 1 });
    }

    #[test]
    fn unknown_labels_use_defaults() {
        let model = OutcomeModel::default();
        let risk = RiskTables::default();
        let rec = model.compose(
            &risk,
            0,
            SampledConditions::new("HAIL", "GRIDLOCK", "EMPTY", "OVERSIZE"),
            1000.0,
            &params(36.0),
        );
        assert!((rec.duration().unwrap() - 100.0).abs() < 1e-9);
        assert!((rec.energy_wh - 1.0).abs() < 1e-12);
        assert!((rec.risk_score - (0.5 + 0.3 + 0.3 + 0.2) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn zero_distance_with_speed_is_zero_duration() {
        let model = OutcomeModel::default();
        assert_eq!(model.duration_s(0, 0.0, 10.0, "CLEAR", "LIGHT").unwrap(), 0.0);
    }
}
