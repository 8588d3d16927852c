//! # missioncast - Mission Risk and Energy Forecasting
//!
//! missioncast predicts risk, energy use and schedule impact for
//! autonomous-vehicle missions from a route and its mission parameters, and
//! estimates uncertainty with a seeded Monte Carlo scenario engine.
//!
//! ## Core Concepts
//!
//! - **Route**: An ordered list of [`Waypoint`]s; its length is planar degree distance scaled to meters
//! - **Point estimate**: A deterministic prediction from [`PointScorer`]
//! - **Scenario**: One draw of weather, traffic, battery and payload composed into an [`OutcomeRecord`]
//! - **Summary**: Mean/min/max/std and threshold counts over a run ([`SimulationSummary`])
//!
//! ## Usage
//!
//! ```rust,ignore
//! use missioncast::{ForecastConfig, ForecastService, MissionParameters, ScenarioRequest, Waypoint};
//!
//! let service = ForecastService::new(ForecastConfig::default())?;
//! let response = service.run_scenario(ScenarioRequest {
//!     mission_id: "MISSION-001".to_string(),
//!     parameters: MissionParameters { max_speed_kmh: 60.0, payload_kg: 4.0, ..Default::default() },
//!     waypoints: vec![Waypoint::new(51.5074, -0.1278), Waypoint::new(51.5080, -0.1200)],
//!     iterations: Some(1000),
//!     seed: None,
//!     distributions: None,
//!     include_records: false,
//! })?;
//! println!("{}", response.analysis);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod error;
pub mod labels;
pub mod mission;
pub mod tables;

// Scoring and simulation
pub mod explain;
pub mod scoring;
pub mod simulation;

// Service surface
pub mod config;
pub mod runtime;
pub mod service;
pub mod telemetry;

#[cfg(feature = "transport-grpc")]
pub mod transport;

// Re-export primary types at crate root for convenience
pub use config::{ForecastConfig, GeometryConfig};
pub use error::{ExecutionError, ForecastError, ForecastResult, TransportError, ValidationError};
pub use labels::{BatteryLevel, MaintenanceLevel, PayloadLevel, RiskLevel, Thresholds};
pub use mission::{total_distance, MissionParameters, Waypoint};
pub use runtime::{ExecutionHandle, RuntimeConfig, ScenarioRuntime};
pub use scoring::{PointScorer, ScoringModel};
pub use service::{ForecastService, ScenarioRequest, ScenarioResponse};
pub use simulation::{
    summarize, CategoricalDistribution, OutcomeRecord, ScenarioDistributions, ScenarioEngine,
    ScenarioReport, ScenarioSpec, SimulationSummary, UndefinedDurationPolicy,
};
pub use tables::{FactorTable, RiskTables};
