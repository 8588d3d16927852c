//! Label-keyed lookup tables.
//!
//! Every weather/traffic/battery/payload factor used by the composer and
//! the point scorers is a [`FactorTable`]: an immutable map from an
//! upper-case label to a weight, plus the weight used for labels the table
//! does not know. Lookups never fail.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Normalizes a condition label for table lookup.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    label.trim().to_ascii_uppercase()
}

/// Weight table keyed by condition label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorTable {
    /// Known labels and their weights.
    pub entries: BTreeMap<String, f64>,
    /// Weight returned for unrecognized labels.
    pub default: f64,
}

impl FactorTable {
    /// Builds a table from `(label, weight)` pairs.
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, f64)>, default: f64) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(label, weight)| (normalize_label(label), weight))
                .collect(),
            default,
        }
    }

    /// Returns the weight for `label`, or the table default.
    #[must_use]
    pub fn get(&self, label: &str) -> f64 {
        if let Some(w) = self.entries.get(label) {
            return *w;
        }
        self.entries
            .get(&normalize_label(label))
            .copied()
            .unwrap_or(self.default)
    }

    /// Returns true if the label has an explicit entry.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(&normalize_label(label))
    }

    /// Checks every weight is finite and non-negative and every key is normalized.
    pub fn validate(&self, field: &str) -> Result<(), ValidationError> {
        let bad = |reason: String| ValidationError::InvalidConfig {
            field: field.to_string(),
            reason,
        };
        if !self.default.is_finite() || self.default < 0.0 {
            return Err(bad(format!("default weight {} is not a non-negative number", self.default)));
        }
        for (label, weight) in &self.entries {
            if label.is_empty() || *label != normalize_label(label) {
                return Err(bad(format!("label '{label}' must be non-empty upper case")));
            }
            if !weight.is_finite() || *weight < 0.0 {
                return Err(bad(format!("weight {weight} for '{label}' is not a non-negative number")));
            }
        }
        Ok(())
    }
}

/// Delay and energy effect of one traffic condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficImpact {
    /// Delay added per meter of route.
    pub seconds_per_meter: f64,
    /// Fractional energy increase.
    pub energy_increase: f64,
}

/// Traffic point-estimate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficImpactTable {
    /// Known traffic labels.
    pub entries: BTreeMap<String, TrafficImpact>,
    /// Impact for any other label.
    pub default: TrafficImpact,
}

impl TrafficImpactTable {
    /// Returns the impact for `label`, or the default.
    #[must_use]
    pub fn get(&self, label: &str) -> TrafficImpact {
        self.entries
            .get(&normalize_label(label))
            .copied()
            .unwrap_or(self.default)
    }

    pub(crate) fn validate(&self, field: &str) -> Result<(), ValidationError> {
        let check = |label: &str, impact: &TrafficImpact| {
            let ok = impact.seconds_per_meter.is_finite()
                && impact.seconds_per_meter >= 0.0
                && impact.energy_increase.is_finite()
                && impact.energy_increase >= 0.0;
            if ok {
                Ok(())
            } else {
                Err(ValidationError::InvalidConfig {
                    field: field.to_string(),
                    reason: format!("impact for '{label}' must be non-negative"),
                })
            }
        };
        check("default", &self.default)?;
        for (label, impact) in &self.entries {
            check(label, impact)?;
        }
        Ok(())
    }
}

impl Default for TrafficImpactTable {
    fn default() -> Self {
        let entries = [
            ("HEAVY", 0.005, 0.3),
            ("MODERATE", 0.002, 0.1),
        ]
        .into_iter()
        .map(|(label, seconds_per_meter, energy_increase)| {
            (
                label.to_string(),
                TrafficImpact {
                    seconds_per_meter,
                    energy_increase,
                },
            )
        })
        .collect();
        Self {
            entries,
            default: TrafficImpact {
                seconds_per_meter: 0.001,
                energy_increase: 0.05,
            },
        }
    }
}

/// Four-factor risk tables shared by the outcome composer and the point scorers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskTables {
    /// Weather risk weights.
    pub weather: FactorTable,
    /// Traffic risk weights.
    pub traffic: FactorTable,
    /// Battery risk weights.
    pub battery: FactorTable,
    /// Payload risk weights.
    pub payload: FactorTable,
}

impl Default for RiskTables {
    fn default() -> Self {
        use crate::labels::{battery, payload, traffic, weather};
        Self {
            weather: FactorTable::new(
                [
                    (weather::CLEAR, 0.1),
                    (weather::CLOUDY, 0.2),
                    (weather::RAINY, 0.5),
                    (weather::SNOWY, 0.7),
                    (weather::STORM, 0.9),
                ],
                0.5,
            ),
            traffic: FactorTable::new(
                [
                    (traffic::LIGHT, 0.1),
                    (traffic::MODERATE, 0.3),
                    (traffic::HEAVY, 0.6),
                    (traffic::JAM, 0.9),
                ],
                0.3,
            ),
            battery: FactorTable::new(
                [(battery::HIGH, 0.1), (battery::MEDIUM, 0.3), (battery::LOW, 0.6)],
                0.3,
            ),
            payload: FactorTable::new(
                [(payload::LIGHT, 0.1), (payload::MEDIUM, 0.2), (payload::HEAVY, 0.4)],
                0.2,
            ),
        }
    }
}

impl RiskTables {
    /// Mean of the four factor weights.
    #[must_use]
    pub fn score(&self, weather: &str, traffic: &str, battery: &str, payload: &str) -> f64 {
        (self.weather.get(weather)
            + self.traffic.get(traffic)
            + self.battery.get(battery)
            + self.payload.get(payload))
            / 4.0
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        self.weather.validate("risk.weather")?;
        self.traffic.validate("risk.traffic")?;
        self.battery.validate("risk.battery")?;
        self.payload.validate("risk.payload")?;
        for (field, table) in [
            ("risk.weather", &self.weather),
            ("risk.traffic", &self.traffic),
            ("risk.battery", &self.battery),
            ("risk.payload", &self.payload),
        ] {
            let out_of_range = std::iter::once(&table.default)
                .chain(table.entries.values())
                .any(|w| *w > 1.0);
            if out_of_range {
                return Err(ValidationError::InvalidConfig {
                    field: field.to_string(),
                    reason: "risk weights must lie in [0, 1]".to_string(),
                });
            }
        }
        Ok(())
    }
}
