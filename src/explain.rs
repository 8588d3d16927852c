//! Human-readable analysis strings attached to prediction responses.
//!
//! Renderers take finished numbers and labels; nothing here feeds back into
//! scoring.

use std::fmt::Write as _;

use crate::labels::{MaintenanceLevel, RiskLevel};
use crate::scoring::{BatteryEstimate, ImpactEstimate, MaintenanceEstimate, RiskEstimate};
use crate::simulation::SimulationSummary;
use crate::tables::normalize_label;

/// Condition categories with canned descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    /// Weather condition label.
    Weather,
    /// Traffic condition label.
    Traffic,
    /// Battery level label.
    Battery,
    /// Payload class label.
    Payload,
}

impl Factor {
    /// Describes `label` for this factor; unknown labels get a generic text.
    #[must_use]
    pub fn describe(self, label: &str) -> &'static str {
        let label = normalize_label(label);
        match (self, label.as_str()) {
            (Self::Weather, "CLEAR") => "Weather is clear, minimal impact on mission",
            (Self::Weather, "CLOUDY") => "Cloudy conditions, slight impact on visibility",
            (Self::Weather, "RAINY") => "Rainy conditions, moderate impact on mission",
            (Self::Weather, "SNOWY") => "Snowy conditions, high impact on mission",
            (Self::Weather, "STORM") => "Storm conditions, severe impact on mission",
            (Self::Weather, _) => "Unknown weather condition",

            (Self::Traffic, "LIGHT") => "Light traffic, minimal delay",
            (Self::Traffic, "MODERATE") => "Moderate traffic, slight delay",
            (Self::Traffic, "HEAVY") => "Heavy traffic, significant delay",
            (Self::Traffic, "JAM") => "Traffic jam, severe delay",
            (Self::Traffic, _) => "Unknown traffic condition",

            (Self::Battery, "HIGH") => "Battery level is high, sufficient for mission",
            (Self::Battery, "MEDIUM") => "Battery level is medium, monitor for recharge",
            (Self::Battery, "LOW") => "Battery level is low, consider recharge",
            (Self::Battery, _) => "Unknown battery condition",

            (Self::Payload, "LIGHT") => "Payload is light, minimal impact on energy consumption",
            (Self::Payload, "MEDIUM") => "Payload is medium, moderate impact on energy consumption",
            (Self::Payload, "HEAVY") => "Payload is heavy, significant impact on energy consumption",
            (Self::Payload, _) => "Unknown payload condition",
        }
    }
}

fn factor_line(out: &mut String, name: &str, factor: Factor, label: &str) {
    let _ = write!(out, "\n- {name}: {label} ({})", factor.describe(label));
}

/// Explains a mission risk estimate.
#[must_use]
pub fn risk(estimate: &RiskEstimate) -> String {
    let mut out = format!(
        "Mission risk score is {:.2} based on the following factors:\n",
        estimate.score
    );
    let f = &estimate.factors;
    factor_line(&mut out, "Weather", Factor::Weather, &f.weather);
    factor_line(&mut out, "Traffic", Factor::Traffic, &f.traffic);
    if let Some(battery) = f.battery {
        factor_line(&mut out, "Battery", Factor::Battery, battery.as_str());
    }
    factor_line(&mut out, "Payload", Factor::Payload, f.payload.as_str());

    let sentence = match estimate.level {
        RiskLevel::Low => "The mission is considered low risk.",
        RiskLevel::Medium => "The mission is considered medium risk.",
        RiskLevel::High => "The mission is considered high risk.",
    };
    let _ = write!(out, "\n\n{sentence}");
    out
}

/// Explains a battery estimate.
#[must_use]
pub fn battery(estimate: &BatteryEstimate, payload_kg: f64, distance_m: f64) -> String {
    let advice = Factor::Battery.describe(estimate.level.as_str());
    format!(
        "Estimated voltage after mission is {:.2} V (payload {payload_kg:.2} kg, distance {:.2} km).\n\n{advice}",
        estimate.voltage,
        distance_m / 1000.0,
    )
}

/// Explains an energy estimate.
#[must_use]
pub fn energy(energy_wh: f64, payload_kg: f64, distance_m: f64) -> String {
    format!(
        "Estimated energy consumption is {energy_wh:.2} Wh for {:.2} km with a {payload_kg:.2} kg payload.",
        distance_m / 1000.0
    )
}

fn impact(kind: &str, factor: Factor, label: &str, estimate: &ImpactEstimate) -> String {
    format!(
        "{kind} condition '{label}' has the following impact:\n\
         \n- Delay: {:.2} seconds\
         \n- Energy increase: {:.2}%\
         \n\n{}",
        estimate.delay_s,
        estimate.energy_increase,
        factor.describe(label)
    )
}

/// Explains a weather impact estimate.
#[must_use]
pub fn weather_impact(condition: &str, estimate: &ImpactEstimate) -> String {
    impact("Weather", Factor::Weather, condition, estimate)
}

/// Explains a traffic impact estimate.
#[must_use]
pub fn traffic_impact(condition: &str, estimate: &ImpactEstimate) -> String {
    impact("Traffic", Factor::Traffic, condition, estimate)
}

/// Explains a maintenance estimate.
#[must_use]
pub fn maintenance(estimate: &MaintenanceEstimate, distance_m: f64, payload_label: &str) -> String {
    let mut out = format!(
        "Maintenance probability is {:.2} based on the following factors:\n",
        estimate.probability
    );
    let _ = write!(out, "\n- Distance: {:.2} km", distance_m / 1000.0);
    factor_line(&mut out, "Payload", Factor::Payload, payload_label);
    let sentence = match estimate.level {
        MaintenanceLevel::NotRequired => "Maintenance is not required at this time.",
        MaintenanceLevel::Recommended => "Maintenance is recommended soon.",
        MaintenanceLevel::Required => "Maintenance is required immediately.",
    };
    let _ = write!(out, "\n\n{sentence}");
    out
}

/// Summarizes a scenario run in one paragraph.
#[must_use]
pub fn simulation(summary: &SimulationSummary) -> String {
    let mut out = format!("Simulated {} scenarios.", summary.iterations);
    match &summary.duration_s {
        Some(d) => {
            let _ = write!(
                out,
                "\n- Duration: mean {:.2} s (min {:.2}, max {:.2}, std {:.2})",
                d.mean, d.min, d.max, d.std_dev
            );
        }
        None => out.push_str("\n- Duration: undefined for every scenario"),
    }
    let e = &summary.energy_wh;
    let _ = write!(
        out,
        "\n- Energy: mean {:.2} Wh (min {:.2}, max {:.2}, std {:.2})",
        e.mean, e.min, e.max, e.std_dev
    );
    let r = &summary.risk_score;
    let _ = write!(
        out,
        "\n- Risk: mean {:.2} (min {:.2}, max {:.2}, std {:.2})",
        r.mean, r.min, r.max, r.std_dev
    );
    let _ = write!(
        out,
        "\n\n{} high risk and {} low risk scenarios.",
        summary.high_risk_count, summary.low_risk_count
    );
    if summary.undefined_duration_count > 0 {
        let _ = write!(
            out,
            " {} scenarios had an undefined duration and were left out of duration statistics.",
            summary.undefined_duration_count
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::labels::PayloadLevel;
    use crate::scoring::RiskFactors;
    use crate::simulation::MetricSummary;

    #[test]
    fn describe_is_case_insensitive_with_fallback() {
        assert_eq!(Factor::Weather.describe("storm"), "Storm conditions, severe impact on mission");
        assert_eq!(Factor::Traffic.describe("GRIDLOCK"), "Unknown traffic condition");
        assert_eq!(Factor::Payload.describe(""), "Unknown payload condition");
    }

    #[test]
    fn risk_lists_factors_and_level() {
        let estimate = RiskEstimate {
            score: 0.55,
            level: RiskLevel::Medium,
            factors: RiskFactors {
                weather: "STORM".to_string(),
                traffic: "MODERATE".to_string(),
                battery: None,
                payload: PayloadLevel::Medium,
            },
        };
        let text = risk(&estimate);
        assert!(text.starts_with("Mission risk score is 0.55"));
        assert!(text.contains("- Weather: STORM (Storm conditions"));
        assert!(text.contains("- Traffic: MODERATE (Moderate traffic"));
        assert!(!text.contains("- Battery"));
        assert!(text.contains("- Payload: MEDIUM (Payload is medium"));
        assert!(text.ends_with("The mission is considered medium risk."));
    }

    #[test]
    fn impact_formats_two_decimals() {
        let text = traffic_impact(
            "HEAVY",
            &ImpactEstimate {
                delay_s: 10.0,
                energy_increase: 0.3,
            },
        );
        assert!(text.contains("Traffic condition 'HEAVY'"));
        assert!(text.contains("- Delay: 10.00 seconds"));
        assert!(text.contains("- Energy increase: 0.30%"));
        assert!(text.ends_with("Heavy traffic, significant delay"));
    }

    #[test]
    fn maintenance_sentence_follows_level() {
        let text = maintenance(
            &MaintenanceEstimate {
                probability: 0.7,
                level: MaintenanceLevel::Required,
            },
            12_500.0,
            "HEAVY",
        );
        assert!(text.contains("- Distance: 12.50 km"));
        assert!(text.ends_with("Maintenance is required immediately."));
    }

    #[test]
    fn simulation_reports_undefined_durations() {
        let m = MetricSummary {
            mean: 1.0,
            min: 1.0,
            max: 1.0,
            std_dev: 0.0,
            samples: 2,
        };
        let summary = SimulationSummary {
            iterations: 2,
            duration_s: None,
            energy_wh: m,
            risk_score: m,
            high_risk_count: 2,
            low_risk_count: 0,
            undefined_duration_count: 2,
        };
        let text = simulation(&summary);
        assert!(text.starts_with("Simulated 2 scenarios."));
        assert!(text.contains("undefined for every scenario"));
        assert!(text.contains("2 scenarios had an undefined duration"));
    }
}
