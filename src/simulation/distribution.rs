//! Weighted categorical sampling.
//!
//! Weights need not be normalized. A draw selects label `i` with
//! probability `weights[i] / sum(weights)` using the caller's random
//! source, so a fixed seed reproduces the same sequence of draws.

use std::collections::HashSet;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::labels::{battery, payload, traffic, weather};
use crate::tables::normalize_label;

/// Labeled outcomes with non-negative weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalDistribution {
    /// Distinct outcome labels, in order.
    pub labels: Vec<String>,
    /// Weights aligned with `labels`.
    pub weights: Vec<f64>,
}

impl CategoricalDistribution {
    /// Builds a distribution from `(label, weight)` pairs. Validation happens on use.
    pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let (labels, weights) = pairs
            .into_iter()
            .map(|(label, weight)| (label.to_string(), weight))
            .unzip();
        Self { labels, weights }
    }

    /// Checks shape and weights.
    pub fn validate(&self, name: &str) -> Result<(), ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidDistribution {
            name: name.to_string(),
            reason,
        };
        if self.labels.len() != self.weights.len() {
            return Err(invalid(format!(
                "{} labels but {} weights",
                self.labels.len(),
                self.weights.len()
            )));
        }
        if self.labels.is_empty() {
            return Err(invalid("no outcomes".to_string()));
        }
        let mut seen = HashSet::with_capacity(self.labels.len());
        for label in &self.labels {
            if !seen.insert(normalize_label(label)) {
                return Err(invalid(format!("duplicate label '{label}'")));
            }
        }
        if let Some(w) = self.weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(invalid(format!("weight {w} is negative or not finite")));
        }
        let total: f64 = self.weights.iter().sum();
        if total <= 0.0 {
            return Err(invalid("weights sum to zero".to_string()));
        }
        if !total.is_finite() {
            return Err(invalid("weight sum overflows".to_string()));
        }
        Ok(())
    }

    /// Validates and prepares a reusable sampler.
    pub fn sampler(&self, name: &str) -> Result<LabelSampler<'_>, ValidationError> {
        self.validate(name)?;
        let index = WeightedIndex::new(&self.weights).map_err(|e| {
            ValidationError::InvalidDistribution {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(LabelSampler {
            labels: &self.labels,
            index,
        })
    }

    /// Draws one label.
    ///
    /// Validates and builds the weighted index on every call. Callers that
    /// draw repeatedly should build a [`LabelSampler`] once with
    /// [`sampler`](Self::sampler).
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str, ValidationError> {
        Ok(self.sampler("categorical")?.draw(rng))
    }
}

/// A validated distribution ready for repeated draws.
#[derive(Debug, Clone)]
pub struct LabelSampler<'a> {
    labels: &'a [String],
    index: WeightedIndex<f64>,
}

impl<'a> LabelSampler<'a> {
    /// Draws one label.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &'a str {
        &self.labels[self.index.sample(rng)]
    }
}

/// The four condition distributions sampled per iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioDistributions {
    /// Weather conditions.
    pub weather: CategoricalDistribution,
    /// Traffic conditions.
    pub traffic: CategoricalDistribution,
    /// Battery state at departure.
    pub battery: CategoricalDistribution,
    /// Payload class.
    pub payload: CategoricalDistribution,
}

impl Default for ScenarioDistributions {
    fn default() -> Self {
        Self {
            weather: CategoricalDistribution::new([
                (weather::CLEAR, 0.4),
                (weather::CLOUDY, 0.3),
                (weather::RAINY, 0.2),
                (weather::SNOWY, 0.08),
                (weather::STORM, 0.02),
            ]),
            traffic: CategoricalDistribution::new([
                (traffic::LIGHT, 0.5),
                (traffic::MODERATE, 0.3),
                (traffic::HEAVY, 0.15),
                (traffic::JAM, 0.05),
            ]),
            battery: CategoricalDistribution::new([
                (battery::HIGH, 0.6),
                (battery::MEDIUM, 0.3),
                (battery::LOW, 0.1),
            ]),
            payload: CategoricalDistribution::new([
                (payload::LIGHT, 0.5),
                (payload::MEDIUM, 0.3),
                (payload::HEAVY, 0.2),
            ]),
        }
    }
}

impl ScenarioDistributions {
    /// Validates all four distributions.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.weather.validate("weather")?;
        self.traffic.validate("traffic")?;
        self.battery.validate("battery")?;
        self.payload.validate("payload")
    }

    /// Prepares samplers for all four distributions.
    pub fn samplers(&self) -> Result<ConditionSamplers<'_>, ValidationError> {
        Ok(ConditionSamplers {
            weather: self.weather.sampler("weather")?,
            traffic: self.traffic.sampler("traffic")?,
            battery: self.battery.sampler("battery")?,
            payload: self.payload.sampler("payload")?,
        })
    }
}

/// Prepared samplers for one run.
#[derive(Debug, Clone)]
pub struct ConditionSamplers<'a> {
    weather: LabelSampler<'a>,
    traffic: LabelSampler<'a>,
    battery: LabelSampler<'a>,
    payload: LabelSampler<'a>,
}

impl ConditionSamplers<'_> {
    /// Draws weather, traffic, battery and payload, in that order.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> super::SampledConditions {
        super::SampledConditions {
            weather: self.weather.draw(rng).to_string(),
            traffic: self.traffic.draw(rng).to_string(),
            battery: self.battery.draw(rng).to_string(),
            payload: self.payload.draw(rng).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn same_seed_same_draws() {
        let dist = ScenarioDistributions::default().weather;
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        let first: Vec<_> = (0..64).map(|_| dist.draw(&mut a).unwrap().to_string()).collect();
        let second: Vec<_> = (0..64).map(|_| dist.draw(&mut b).unwrap().to_string()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_weight_labels_are_never_drawn() {
        let dist = CategoricalDistribution::new([("A", 0.0), ("B", 1.0), ("C", 0.0)]);
        let sampler = dist.sampler("t").unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            assert_eq!(sampler.draw(&mut rng), "B");
        }
    }

    #[test]
    fn frequencies_follow_weights() {
        let dist = CategoricalDistribution::new([("A", 3.0), ("B", 1.0)]);
        let sampler = dist.sampler("t").unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let n = 20_000;
        let a = (0..n).filter(|_| sampler.draw(&mut rng) == "A").count();
        let share = a as f64 / f64::from(n);
        assert!((share - 0.75).abs() < 0.02, "share was {share}");
    }

    #[test]
    fn rejects_malformed_distributions() {
        let mismatched = CategoricalDistribution {
            labels: vec!["A".to_string(), "B".to_string()],
            weights: vec![1.0],
        };
        let zero = CategoricalDistribution::new([("A", 0.0), ("B", 0.0)]);
        let negative = CategoricalDistribution::new([("A", 2.0), ("B", -1.0)]);
        let duplicate = CategoricalDistribution::new([("A", 1.0), ("a", 1.0)]);
        let empty = CategoricalDistribution::new([]);
        let overflowing = CategoricalDistribution::new([("A", f64::MAX), ("B", f64::MAX)]);
        let nan = CategoricalDistribution::new([("A", 1.0), ("B", f64::NAN)]);
        let infinite = CategoricalDistribution::new([("A", f64::INFINITY)]);

        for dist in [mismatched, zero, negative, duplicate, empty, overflowing, nan, infinite] {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let err = dist.draw(&mut rng).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidDistribution { .. }));
        }
    }

    #[test]
    fn overflowing_weight_sum_is_named_in_reason() {
        let dist = CategoricalDistribution::new([("A", f64::MAX), ("B", f64::MAX)]);
        let err = dist.validate("weather").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidDistribution {
                name: "weather".to_string(),
                reason: "weight sum overflows".to_string(),
            }
        );
        assert!(dist.sampler("weather").is_err());
    }

    #[test]
    fn draw_does_not_mutate_distribution() {
        let dist = ScenarioDistributions::default().traffic;
        let before = dist.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let _ = dist.draw(&mut rng).unwrap();
        assert_eq!(dist, before);
    }

    #[test]
    fn defaults_are_valid() {
        ScenarioDistributions::default().validate().unwrap();
    }
}
