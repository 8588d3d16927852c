use std::sync::Arc;
use std::thread;

use missioncast::service::{EnergyRequest, ImpactRequest, MaintenanceRequest};
use missioncast::{
    CategoricalDistribution, ForecastConfig, ForecastError, ForecastService, MaintenanceLevel,
    MissionParameters, ScenarioDistributions, ScenarioRequest, ValidationError, Waypoint,
};

fn route() -> Vec<Waypoint> {
    vec![
        Waypoint::new(40.7128, -74.0060),
        Waypoint::new(40.7200, -74.0000),
        Waypoint::new(40.7300, -73.9950),
    ]
}

fn scenario(mission_id: &str, iterations: Option<usize>) -> ScenarioRequest {
    ScenarioRequest {
        mission_id: mission_id.to_string(),
        parameters: MissionParameters {
            max_speed_kmh: 45.0,
            payload_kg: 8.0,
            ..MissionParameters::default()
        },
        waypoints: route(),
        iterations,
        seed: None,
        distributions: None,
        include_records: false,
    }
}

#[test]
fn concurrent_requests_are_isolated() {
    let service = Arc::new(ForecastService::new(ForecastConfig::default()).unwrap());

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                // Every other request is over the cap and must fail on its own.
                let iterations = if i % 2 == 0 { Some(500) } else { Some(50_000) };
                service.run_scenario(scenario(&format!("NYC-{i}"), iterations))
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.join().unwrap();
        if i % 2 == 0 {
            let resp = result.unwrap();
            assert_eq!(resp.report.summary.iterations, 500);
            assert_eq!(resp.mission_id, format!("NYC-{i}"));
        } else {
            assert!(result.unwrap_err().is_execution());
        }
    }

    // Point estimates still work after the failed runs.
    let energy = service
        .predict_energy_consumption(EnergyRequest {
            mission_id: "NYC-E".to_string(),
            payload_kg: 8.0,
            waypoints: route(),
        })
        .unwrap();
    assert!(energy.energy_wh > 0.8);
}

#[test]
fn same_mission_same_summary_across_services() {
    let a = ForecastService::new(ForecastConfig::default()).unwrap();
    let mut config = ForecastConfig::default();
    config.simulation.workers = 8;
    config.simulation.parallel_threshold = 1;
    let b = ForecastService::new(config).unwrap();

    let ra = a.run_scenario(scenario("NYC-REPLAY", Some(1_500))).unwrap();
    let rb = b.run_scenario(scenario("NYC-REPLAY", Some(1_500))).unwrap();
    assert_eq!(ra.report.seed, rb.report.seed);
    assert_eq!(ra.report.summary, rb.report.summary);
}

#[test]
fn config_file_changes_scoring() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missioncast.toml");
    std::fs::write(
        &path,
        r#"
        [scoring]
        maintenance_per_meter = 0.01

        [thresholds]
        maintenance_required_at = 0.9
        "#,
    )
    .unwrap();
    let service = ForecastService::new(ForecastConfig::load(&path).unwrap()).unwrap();

    let resp = service
        .predict_maintenance(MaintenanceRequest {
            mission_id: "CFG-1".to_string(),
            payload_kg: 0.0,
            waypoints: vec![Waypoint::new(0.0, 0.0), Waypoint::new(0.0, 0.06)],
        })
        .unwrap();
    // 60 m * 0.01 + 0.001
    assert!((resp.probability - 0.601).abs() < 1e-9);
    assert_eq!(resp.recommendation, MaintenanceLevel::Recommended);
}

#[test]
fn over_long_labels_are_rejected() {
    let service = ForecastService::new(ForecastConfig::default()).unwrap();
    let err = service
        .predict_weather_impact(ImpactRequest {
            mission_id: "LBL-1".to_string(),
            condition: "X".repeat(65),
            waypoints: route(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ForecastError::Validation(ValidationError::FieldTooLong { max_length: 64, .. })
    ));
}

#[test]
fn invalid_config_is_rejected_at_startup() {
    let mut config = ForecastConfig::default();
    config.simulation.default_iterations = config.simulation.max_iterations + 1;
    assert!(ForecastService::new(config).unwrap_err().is_validation());
}

#[test]
fn overflowing_distribution_override_is_a_validation_error() {
    let service = ForecastService::new(ForecastConfig::default()).unwrap();
    let mut dists = ScenarioDistributions::default();
    dists.traffic = CategoricalDistribution::new([("LIGHT", f64::MAX), ("JAM", f64::MAX)]);
    let mut req = scenario("OVF-1", Some(10));
    req.distributions = Some(dists);

    let err = service.run_scenario(req).unwrap_err();
    assert!(matches!(
        err,
        ForecastError::Validation(ValidationError::InvalidDistribution { ref name, .. }) if name == "traffic"
    ));
}

#[test]
fn coordinates_off_the_globe_never_reach_the_summary() {
    let service = ForecastService::new(ForecastConfig::default()).unwrap();
    let far = vec![Waypoint::new(1e308, 0.0), Waypoint::new(-1e308, 0.0)];

    let mut req = scenario("FAR-1", Some(10));
    req.waypoints = far.clone();
    let err = service.run_scenario(req).unwrap_err();
    assert!(matches!(err, ForecastError::Validation(ValidationError::OutOfRange { .. })));

    let err = service
        .predict_energy_consumption(EnergyRequest {
            mission_id: "FAR-2".to_string(),
            payload_kg: 1.0,
            waypoints: far,
        })
        .unwrap_err();
    assert!(err.is_validation());

    // A route spanning the full coordinate range stays finite.
    let mut req = scenario("FAR-3", Some(10));
    req.waypoints = vec![Waypoint::new(-90.0, -180.0), Waypoint::new(90.0, 180.0)];
    let summary = service.run_scenario(req).unwrap().report.summary;
    assert!(summary.energy_wh.std_dev.is_finite());
    if let Some(duration) = summary.duration_s {
        assert!(duration.std_dev.is_finite());
    }
}
