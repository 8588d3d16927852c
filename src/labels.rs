//! Condition labels and threshold classifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Weather condition labels understood by the default tables.
#[allow(missing_docs)]
pub mod weather {
    pub const CLEAR: &str = "CLEAR";
    pub const CLOUDY: &str = "CLOUDY";
    pub const RAINY: &str = "RAINY";
    pub const SNOWY: &str = "SNOWY";
    pub const STORM: &str = "STORM";
}

/// Traffic condition labels understood by the default tables.
#[allow(missing_docs)]
pub mod traffic {
    pub const LIGHT: &str = "LIGHT";
    pub const MODERATE: &str = "MODERATE";
    pub const HEAVY: &str = "HEAVY";
    pub const JAM: &str = "JAM";
}

/// Battery state labels.
#[allow(missing_docs)]
pub mod battery {
    pub const HIGH: &str = "HIGH";
    pub const MEDIUM: &str = "MEDIUM";
    pub const LOW: &str = "LOW";
}

/// Payload class labels.
#[allow(missing_docs)]
pub mod payload {
    pub const LIGHT: &str = "LIGHT";
    pub const MEDIUM: &str = "MEDIUM";
    pub const HEAVY: &str = "HEAVY";
}

/// Classification cut-offs shared by the scorers and the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Scores strictly below this are LOW risk.
    pub risk_low_below: f64,
    /// Scores strictly below this (and not LOW) are MEDIUM risk.
    pub risk_medium_below: f64,
    /// Simulation records strictly above this count as high risk.
    pub high_risk_above: f64,
    /// Simulation records strictly below this count as low risk.
    pub low_risk_below: f64,
    /// Voltages strictly above this are HIGH.
    pub battery_high_above: f64,
    /// Voltages strictly above this (and not HIGH) are MEDIUM.
    pub battery_medium_above: f64,
    /// Payloads strictly below this are LIGHT.
    pub payload_light_below: f64,
    /// Payloads strictly below this (and not LIGHT) are MEDIUM.
    pub payload_medium_below: f64,
    /// Maintenance probabilities at or above this are RECOMMENDED.
    pub maintenance_recommended_at: f64,
    /// Maintenance probabilities at or above this are REQUIRED.
    pub maintenance_required_at: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            risk_low_below: 0.3,
            risk_medium_below: 0.6,
            high_risk_above: 0.6,
            low_risk_below: 0.3,
            battery_high_above: 24.0,
            battery_medium_above: 20.0,
            payload_light_below: 5.0,
            payload_medium_below: 10.0,
            maintenance_recommended_at: 0.2,
            maintenance_required_at: 0.5,
        }
    }
}

macro_rules! level_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $(#[allow(missing_docs)] $variant),+
        }

        impl $name {
            /// Wire label.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

level_enum!(
    /// Mission risk band.
    RiskLevel { Low => "LOW", Medium => "MEDIUM", High => "HIGH" }
);

level_enum!(
    /// Battery charge band.
    BatteryLevel { High => battery::HIGH, Medium => battery::MEDIUM, Low => battery::LOW }
);

level_enum!(
    /// Payload weight band.
    PayloadLevel { Light => payload::LIGHT, Medium => payload::MEDIUM, Heavy => payload::HEAVY }
);

level_enum!(
    /// Maintenance recommendation band.
    MaintenanceLevel {
        NotRequired => "NOT_REQUIRED",
        Recommended => "RECOMMENDED",
        Required => "REQUIRED",
    }
);

impl Thresholds {
    /// Bands a risk score.
    #[must_use]
    pub fn risk_level(&self, score: f64) -> RiskLevel {
        if score < self.risk_low_below {
            RiskLevel::Low
        } else if score < self.risk_medium_below {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Bands a battery voltage.
    #[must_use]
    pub fn battery_level(&self, voltage: f64) -> BatteryLevel {
        if voltage > self.battery_high_above {
            BatteryLevel::High
        } else if voltage > self.battery_medium_above {
            BatteryLevel::Medium
        } else {
            BatteryLevel::Low
        }
    }

    /// Bands a payload mass.
    #[must_use]
    pub fn payload_level(&self, payload_kg: f64) -> PayloadLevel {
        if payload_kg < self.payload_light_below {
            PayloadLevel::Light
        } else if payload_kg < self.payload_medium_below {
            PayloadLevel::Medium
        } else {
            PayloadLevel::Heavy
        }
    }

    /// Bands a maintenance probability.
    #[must_use]
    pub fn maintenance_level(&self, probability: f64) -> MaintenanceLevel {
        if probability < self.maintenance_recommended_at {
            MaintenanceLevel::NotRequired
        } else if probability < self.maintenance_required_at {
            MaintenanceLevel::Recommended
        } else {
            MaintenanceLevel::Required
        }
    }

    /// True if a simulated record counts towards `high_risk_count`.
    #[must_use]
    pub fn is_high_risk(&self, score: f64) -> bool {
        score > self.high_risk_above
    }

    /// True if a simulated record counts towards `low_risk_count`.
    #[must_use]
    pub fn is_low_risk(&self, score: f64) -> bool {
        score < self.low_risk_below
    }
}
