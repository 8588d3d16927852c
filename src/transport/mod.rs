//! gRPC transport layer for missioncast.
//!
//! Thin adapter: proto messages are converted into [`crate::service`]
//! requests, executed, and converted back. Scenario runs are moved off the
//! async executor with `spawn_blocking`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tonic::{Request, Response, Status};
use tracing::error;

use crate::error::{ExecutionError, ForecastError};
use crate::mission::{MissionParameters, Waypoint, MAX_LABEL_LEN, MAX_WAYPOINTS};
use crate::service::{
    BatteryLevelRequest, EnergyRequest, ForecastService, ImpactRequest, MaintenanceRequest,
    MissionRiskRequest, ScenarioRequest,
};
use crate::simulation::{CategoricalDistribution, MetricSummary, ScenarioDistributions};

/// Generated protobuf messages, client and server.
#[allow(missing_docs)]
pub mod proto {
    tonic::include_proto!("missioncast");
}

use proto::mission_forecast_service_server::{MissionForecastService, MissionForecastServiceServer};

// ----------------------------------------------------------------------------
// Limits (DoS protection)
// ----------------------------------------------------------------------------

/// Maximum size of the records JSON attached to a scenario response.
const MAX_RECORDS_JSON_BYTES: usize = 4 * 1024 * 1024; // 4 MiB

/// Maximum labels per distribution override.
const MAX_DISTRIBUTION_LABELS: usize = 256;

/// gRPC service implementation.
pub struct MissionForecastServiceImpl {
    service: Arc<ForecastService>,
}

impl MissionForecastServiceImpl {
    /// Wraps a shared service.
    #[must_use]
    pub fn new(service: Arc<ForecastService>) -> Self {
        Self { service }
    }

    /// Converts into the tonic server type.
    #[must_use]
    pub fn into_server(self) -> MissionForecastServiceServer<Self> {
        MissionForecastServiceServer::new(self)
    }
}

fn invalid_argument(msg: impl Into<String>) -> Status {
    Status::invalid_argument(msg.into())
}

fn encode_json<T: Serialize>(value: &T, max: usize) -> Result<Vec<u8>, Status> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| Status::internal(format!("failed to serialize response JSON: {e}")))?;
    if bytes.len() > max {
        return Err(Status::resource_exhausted("serialized JSON exceeds size limit"));
    }
    Ok(bytes)
}

fn status_from_forecast_error(err: ForecastError) -> Status {
    match err {
        ForecastError::Validation(v) => Status::invalid_argument(v.to_string()),
        ForecastError::Transport(t) => Status::unavailable(t.to_string()),
        ForecastError::Internal { message } => {
            error!(%message, "internal error");
            Status::internal("internal error")
        }
        ForecastError::Execution(e) => match e {
            ExecutionError::IterationCountExceeded { .. } => Status::out_of_range(e.to_string()),
            ExecutionError::ZeroIterations => Status::invalid_argument(e.to_string()),
            ExecutionError::UndefinedDuration { .. } => Status::failed_precondition(e.to_string()),
            ExecutionError::Timeout { .. } => Status::deadline_exceeded(e.to_string()),
            ExecutionError::QueueFull { .. } => Status::resource_exhausted(e.to_string()),
            ExecutionError::EmptyResultSet
            | ExecutionError::Disconnected { .. }
            | ExecutionError::WorkerPanicked { .. } => {
                error!(error = %e, "request failed");
                Status::internal("internal error")
            }
        },
    }
}

fn timestamp(at: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: at.timestamp(),
        nanos: i32::try_from(at.timestamp_subsec_nanos()).unwrap_or(0),
    }
}

fn check_label(field: &str, value: &str) -> Result<(), Status> {
    if value.len() > MAX_LABEL_LEN {
        return Err(invalid_argument(format!("{field} too long")));
    }
    Ok(())
}

fn waypoints_from_proto(waypoints: Vec<proto::Waypoint>) -> Result<Vec<Waypoint>, Status> {
    if waypoints.len() > MAX_WAYPOINTS {
        return Err(invalid_argument(format!(
            "waypoints exceeds maximum of {MAX_WAYPOINTS}"
        )));
    }
    waypoints
        .into_iter()
        .map(|wp| {
            check_label("waypoint_type", &wp.waypoint_type)?;
            Ok(Waypoint::new(wp.latitude, wp.longitude)
                .with_altitude(wp.altitude)
                .with_kind(wp.waypoint_type))
        })
        .collect()
}

fn parameters_from_proto(parameters: Option<proto::MissionParameters>) -> Result<MissionParameters, Status> {
    let p = parameters.ok_or_else(|| invalid_argument("parameters is required"))?;
    Ok(MissionParameters {
        max_speed_kmh: p.max_speed_kmh,
        max_altitude_m: p.max_altitude_m,
        payload_kg: p.payload_kg,
        weather_condition: p.weather_condition,
        risk_level: p.risk_level,
        battery_voltage: p.battery_voltage,
    })
}

fn distribution_from_proto(
    name: &str,
    value: Option<proto::CategoricalDistribution>,
    fallback: &CategoricalDistribution,
) -> Result<CategoricalDistribution, Status> {
    let Some(d) = value else {
        return Ok(fallback.clone());
    };
    if d.labels.len() > MAX_DISTRIBUTION_LABELS {
        return Err(invalid_argument(format!("{name} distribution has too many labels")));
    }
    for label in &d.labels {
        check_label(name, label)?;
    }
    Ok(CategoricalDistribution {
        labels: d.labels,
        weights: d.weights,
    })
}

fn overrides_from_proto(
    overrides: Option<proto::DistributionOverrides>,
    configured: &ScenarioDistributions,
) -> Result<Option<ScenarioDistributions>, Status> {
    let Some(o) = overrides else {
        return Ok(None);
    };
    Ok(Some(ScenarioDistributions {
        weather: distribution_from_proto("weather", o.weather, &configured.weather)?,
        traffic: distribution_from_proto("traffic", o.traffic, &configured.traffic)?,
        battery: distribution_from_proto("battery", o.battery, &configured.battery)?,
        payload: distribution_from_proto("payload", o.payload, &configured.payload)?,
    }))
}

fn summary_to_proto(m: &MetricSummary) -> proto::MetricSummary {
    proto::MetricSummary {
        mean: m.mean,
        min: m.min,
        max: m.max,
        std_dev: m.std_dev,
        samples: m.samples as u64,
    }
}

#[tonic::async_trait]
impl MissionForecastService for MissionForecastServiceImpl {
    async fn predict_mission_risk(
        &self,
        request: Request<proto::PredictMissionRiskRequest>,
    ) -> Result<Response<proto::PredictMissionRiskResponse>, Status> {
        let req = request.into_inner();
        let resp = self
            .service
            .predict_mission_risk(MissionRiskRequest {
                mission_id: req.mission_id,
                mission_type: req.mission_type,
                parameters: parameters_from_proto(req.parameters)?,
                waypoints: waypoints_from_proto(req.waypoints)?,
            })
            .map_err(status_from_forecast_error)?;
        Ok(Response::new(proto::PredictMissionRiskResponse {
            mission_id: resp.mission_id,
            mission_type: resp.mission_type,
            risk_score: resp.risk_score,
            risk_level: resp.risk_level.to_string(),
            risk_analysis: resp.analysis,
            predicted_at: Some(timestamp(resp.predicted_at)),
        }))
    }

    async fn predict_battery_level(
        &self,
        request: Request<proto::PredictBatteryLevelRequest>,
    ) -> Result<Response<proto::PredictBatteryLevelResponse>, Status> {
        let req = request.into_inner();
        let resp = self
            .service
            .predict_battery_level(BatteryLevelRequest {
                mission_id: req.mission_id,
                voltage: req.current_battery_voltage,
                payload_kg: req.payload_kg,
                waypoints: waypoints_from_proto(req.waypoints)?,
            })
            .map_err(status_from_forecast_error)?;
        Ok(Response::new(proto::PredictBatteryLevelResponse {
            mission_id: resp.mission_id,
            predicted_battery_voltage: resp.predicted_voltage,
            battery_level: resp.battery_level.to_string(),
            battery_analysis: resp.analysis,
            predicted_at: Some(timestamp(resp.predicted_at)),
        }))
    }

    async fn predict_energy_consumption(
        &self,
        request: Request<proto::PredictEnergyConsumptionRequest>,
    ) -> Result<Response<proto::PredictEnergyConsumptionResponse>, Status> {
        let req = request.into_inner();
        let resp = self
            .service
            .predict_energy_consumption(EnergyRequest {
                mission_id: req.mission_id,
                payload_kg: req.payload_kg,
                waypoints: waypoints_from_proto(req.waypoints)?,
            })
            .map_err(status_from_forecast_error)?;
        Ok(Response::new(proto::PredictEnergyConsumptionResponse {
            mission_id: resp.mission_id,
            predicted_energy_consumption_wh: resp.energy_wh,
            energy_analysis: resp.analysis,
            predicted_at: Some(timestamp(resp.predicted_at)),
        }))
    }

    async fn predict_weather_impact(
        &self,
        request: Request<proto::PredictWeatherImpactRequest>,
    ) -> Result<Response<proto::PredictWeatherImpactResponse>, Status> {
        let req = request.into_inner();
        let resp = self
            .service
            .predict_weather_impact(ImpactRequest {
                mission_id: req.mission_id,
                condition: req.weather_condition,
                waypoints: waypoints_from_proto(req.waypoints)?,
            })
            .map_err(status_from_forecast_error)?;
        Ok(Response::new(proto::PredictWeatherImpactResponse {
            mission_id: resp.mission_id,
            weather_condition: resp.condition,
            delay_seconds: resp.delay_s,
            energy_increase_percentage: resp.energy_increase,
            weather_analysis: resp.analysis,
            predicted_at: Some(timestamp(resp.predicted_at)),
        }))
    }

    async fn predict_traffic_impact(
        &self,
        request: Request<proto::PredictTrafficImpactRequest>,
    ) -> Result<Response<proto::PredictTrafficImpactResponse>, Status> {
        let req = request.into_inner();
        let resp = self
            .service
            .predict_traffic_impact(ImpactRequest {
                mission_id: req.mission_id,
                condition: req.traffic_condition,
                waypoints: waypoints_from_proto(req.waypoints)?,
            })
            .map_err(status_from_forecast_error)?;
        Ok(Response::new(proto::PredictTrafficImpactResponse {
            mission_id: resp.mission_id,
            traffic_condition: resp.condition,
            delay_seconds: resp.delay_s,
            energy_increase_percentage: resp.energy_increase,
            traffic_analysis: resp.analysis,
            predicted_at: Some(timestamp(resp.predicted_at)),
        }))
    }

    async fn predict_maintenance(
        &self,
        request: Request<proto::PredictMaintenanceRequest>,
    ) -> Result<Response<proto::PredictMaintenanceResponse>, Status> {
        let req = request.into_inner();
        let resp = self
            .service
            .predict_maintenance(MaintenanceRequest {
                mission_id: req.mission_id,
                payload_kg: req.payload_kg,
                waypoints: waypoints_from_proto(req.waypoints)?,
            })
            .map_err(status_from_forecast_error)?;
        Ok(Response::new(proto::PredictMaintenanceResponse {
            mission_id: resp.mission_id,
            maintenance_probability: resp.probability,
            recommendation: resp.recommendation.to_string(),
            maintenance_analysis: resp.analysis,
            predicted_at: Some(timestamp(resp.predicted_at)),
        }))
    }

    async fn run_scenario(
        &self,
        request: Request<proto::RunScenarioRequest>,
    ) -> Result<Response<proto::RunScenarioResponse>, Status> {
        let req = request.into_inner();
        let include_records = req.include_records;
        let scenario = ScenarioRequest {
            mission_id: req.mission_id,
            parameters: parameters_from_proto(req.parameters)?,
            waypoints: waypoints_from_proto(req.waypoints)?,
            iterations: (req.iterations > 0).then_some(req.iterations as usize),
            seed: req.seed,
            distributions: overrides_from_proto(req.distributions, &self.service.config().distributions)?,
            include_records,
        };

        let service = Arc::clone(&self.service);
        let resp = tokio::task::spawn_blocking(move || service.run_scenario(scenario))
            .await
            .map_err(|e| Status::internal(format!("scenario task failed: {e}")))?
            .map_err(status_from_forecast_error)?;

        let report = &resp.report;
        let records_json = if include_records {
            encode_json(&report.records, MAX_RECORDS_JSON_BYTES)?
        } else {
            Vec::new()
        };
        let s = &report.summary;
        Ok(Response::new(proto::RunScenarioResponse {
            run_id: report.run_id.to_string(),
            seed: report.seed,
            iterations: s.iterations as u64,
            distance_m: report.distance_m,
            duration_s: s.duration_s.as_ref().map(summary_to_proto),
            energy_wh: Some(summary_to_proto(&s.energy_wh)),
            risk_score: Some(summary_to_proto(&s.risk_score)),
            high_risk_count: s.high_risk_count as u64,
            low_risk_count: s.low_risk_count as u64,
            undefined_duration_count: s.undefined_duration_count as u64,
            records_json,
            scenario_analysis: resp.analysis,
            predicted_at: Some(timestamp(resp.predicted_at)),
            mission_id: resp.mission_id,
        }))
    }
}

pub use proto::mission_forecast_service_client::MissionForecastServiceClient;

#[cfg(test)]
mod tests {
    use super::*;

    use tonic::Code;

    use crate::config::ForecastConfig;

    fn make_service() -> MissionForecastServiceImpl {
        let service = ForecastService::new(ForecastConfig::default()).unwrap();
        MissionForecastServiceImpl::new(Arc::new(service))
    }

    fn route_m(meters: f64) -> Vec<proto::Waypoint> {
        [0.0, meters / 1000.0]
            .into_iter()
            .enumerate()
            .map(|(i, lon)| proto::Waypoint {
                waypoint_id: format!("wp-{i}"),
                latitude: 0.0,
                longitude: lon,
                altitude: 50.0,
                waypoint_type: "NAV".to_string(),
            })
            .collect()
    }

    fn params() -> proto::MissionParameters {
        proto::MissionParameters {
            max_speed_kmh: 60.0,
            max_altitude_m: 120.0,
            payload_kg: 4.0,
            weather_condition: "CLEAR".to_string(),
            risk_level: String::new(),
            battery_voltage: None,
        }
    }

    #[tokio::test]
    async fn traffic_impact_heavy_over_two_km() {
        let svc = make_service();
        let resp = svc
            .predict_traffic_impact(Request::new(proto::PredictTrafficImpactRequest {
                mission_id: "M-1".to_string(),
                traffic_condition: "HEAVY".to_string(),
                waypoints: route_m(2000.0),
                request_time: None,
            }))
            .await
            .unwrap()
            .into_inner();
        assert!((resp.delay_seconds - 10.0).abs() < 1e-9);
        assert_eq!(resp.energy_increase_percentage, 0.3);
        assert!(resp.predicted_at.is_some());
    }

    #[tokio::test]
    async fn mission_risk_requires_parameters() {
        let svc = make_service();
        let err = svc
            .predict_mission_risk(Request::new(proto::PredictMissionRiskRequest {
                mission_id: "M-1".to_string(),
                mission_type: "DELIVERY".to_string(),
                parameters: None,
                waypoints: route_m(100.0),
                request_time: None,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn oversized_route_is_rejected() {
        let svc = make_service();
        let waypoints = vec![proto::Waypoint::default(); MAX_WAYPOINTS + 1];
        let err = svc
            .predict_energy_consumption(Request::new(proto::PredictEnergyConsumptionRequest {
                mission_id: "M-1".to_string(),
                payload_kg: 1.0,
                waypoints,
                request_time: None,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn run_scenario_defaults_iterations_and_seed() {
        let svc = make_service();
        let resp = svc
            .run_scenario(Request::new(proto::RunScenarioRequest {
                mission_id: "MISSION-001".to_string(),
                parameters: Some(params()),
                waypoints: route_m(1000.0),
                ..Default::default()
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(resp.iterations, 1000);
        assert_eq!(resp.seed, crate::simulation::derive_seed("MISSION-001"));
        assert!(resp.records_json.is_empty());
        assert!(resp.duration_s.is_some());
        assert!(resp.high_risk_count + resp.low_risk_count <= resp.iterations);
        assert!(resp.run_id.parse::<uuid::Uuid>().is_ok());
    }

    #[tokio::test]
    async fn run_scenario_returns_records_json() {
        let svc = make_service();
        let resp = svc
            .run_scenario(Request::new(proto::RunScenarioRequest {
                mission_id: "MISSION-002".to_string(),
                parameters: Some(params()),
                waypoints: route_m(1000.0),
                iterations: 12,
                seed: Some(21),
                distributions: Some(proto::DistributionOverrides {
                    weather: Some(proto::CategoricalDistribution {
                        labels: vec!["SNOWY".to_string()],
                        weights: vec![1.0],
                    }),
                    ..Default::default()
                }),
                include_records: true,
                request_time: None,
            }))
            .await
            .unwrap()
            .into_inner();
        let records: Vec<serde_json::Value> = serde_json::from_slice(&resp.records_json).unwrap();
        assert_eq!(records.len(), 12);
        assert!(records.iter().all(|r| r["weather"] == "SNOWY"));
        assert_eq!(records[3]["iteration_index"], 3);
    }

    #[tokio::test]
    async fn run_scenario_over_cap_is_out_of_range() {
        let svc = make_service();
        let err = svc
            .run_scenario(Request::new(proto::RunScenarioRequest {
                mission_id: "M-1".to_string(),
                parameters: Some(params()),
                waypoints: route_m(1000.0),
                iterations: 10_001,
                ..Default::default()
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::OutOfRange);
    }

    #[test]
    fn internal_errors_are_reported_generically() {
        let status = status_from_forecast_error(
            ExecutionError::WorkerPanicked {
                message: "index out of bounds".to_string(),
            }
            .into(),
        );
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), "internal error");
    }
}
