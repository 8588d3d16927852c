//! Mission inputs: waypoints, routes and mission parameters.
//!
//! Distances are computed on raw degree deltas treated as planar
//! coordinates and scaled by a fixed factor. This is an approximation, not
//! a geodesic distance, and is kept for compatibility with existing
//! predictions.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum number of waypoints accepted for a single route.
pub const MAX_WAYPOINTS: usize = 10_000;

/// Latitude bound in degrees.
pub const MAX_LATITUDE: f64 = 90.0;

/// Longitude bound in degrees.
pub const MAX_LONGITUDE: f64 = 180.0;

/// Maximum length of a condition label.
pub const MAX_LABEL_LEN: usize = 64;

/// A single point on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters.
    #[serde(default)]
    pub altitude: f64,
    /// Free-form waypoint kind (pickup, dropoff, transit, ...).
    #[serde(default)]
    pub kind: String,
}

impl Waypoint {
    /// Creates a transit waypoint at the given coordinates.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: 0.0,
            kind: String::new(),
        }
    }

    /// Sets the altitude.
    #[must_use]
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    /// Sets the waypoint kind.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }
}

/// Sum of planar degree-space segment lengths along the route.
///
/// Returns 0 for fewer than two waypoints.
#[must_use]
pub fn total_distance(waypoints: &[Waypoint]) -> f64 {
    waypoints
        .windows(2)
        .map(|pair| {
            let (prev, curr) = (&pair[0], &pair[1]);
            let dlon = curr.longitude - prev.longitude;
            let dlat = curr.latitude - prev.latitude;
            (dlon * dlon + dlat * dlat).sqrt()
        })
        .sum()
}

/// Validates waypoint coordinates and route length.
///
/// Coordinates must be finite and within the latitude/longitude bounds.
pub fn validate_route(waypoints: &[Waypoint]) -> Result<(), ValidationError> {
    if waypoints.len() > MAX_WAYPOINTS {
        return Err(ValidationError::FieldTooLong {
            field: "waypoints".to_string(),
            max_length: MAX_WAYPOINTS,
        });
    }
    for (idx, wp) in waypoints.iter().enumerate() {
        for (name, value) in [
            ("latitude", wp.latitude),
            ("longitude", wp.longitude),
            ("altitude", wp.altitude),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::InvalidParameter {
                    field: format!("waypoints[{idx}].{name}"),
                    value,
                });
            }
        }
        for (name, value, bound) in [
            ("latitude", wp.latitude, MAX_LATITUDE),
            ("longitude", wp.longitude, MAX_LONGITUDE),
        ] {
            if value.abs() > bound {
                return Err(ValidationError::OutOfRange {
                    field: format!("waypoints[{idx}].{name}"),
                    value,
                    min: -bound,
                    max: bound,
                });
            }
        }
    }
    Ok(())
}

/// Mission parameters fixed for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionParameters {
    /// Maximum ground speed.
    pub max_speed_kmh: f64,
    /// Maximum cruising altitude.
    #[serde(default)]
    pub max_altitude_m: f64,
    /// Payload mass.
    #[serde(default)]
    pub payload_kg: f64,
    /// Forecast weather label.
    #[serde(default)]
    pub weather_condition: String,
    /// Operator-declared risk label.
    #[serde(default)]
    pub risk_level: String,
    /// Battery voltage at departure, when known.
    #[serde(default)]
    pub battery_voltage: Option<f64>,
}

impl Default for MissionParameters {
    fn default() -> Self {
        Self {
            max_speed_kmh: 0.0,
            max_altitude_m: 0.0,
            payload_kg: 0.0,
            weather_condition: crate::labels::weather::CLEAR.to_string(),
            risk_level: String::new(),
            battery_voltage: None,
        }
    }
}

impl MissionParameters {
    /// Checks all numeric fields are finite and non-negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut numeric = vec![
            ("max_speed_kmh", self.max_speed_kmh),
            ("max_altitude_m", self.max_altitude_m),
            ("payload_kg", self.payload_kg),
        ];
        if let Some(v) = self.battery_voltage {
            numeric.push(("battery_voltage", v));
        }
        for (field, value) in numeric {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidParameter {
                    field: field.to_string(),
                    value,
                });
            }
        }
        for (field, label) in [
            ("weather_condition", &self.weather_condition),
            ("risk_level", &self.risk_level),
        ] {
            if label.len() > MAX_LABEL_LEN {
                return Err(ValidationError::FieldTooLong {
                    field: field.to_string(),
                    max_length: MAX_LABEL_LEN,
                });
            }
        }
        Ok(())
    }
}
