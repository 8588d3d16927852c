use std::sync::Arc;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use missioncast::simulation::MetricSummary;
use missioncast::{
    summarize, total_distance, CategoricalDistribution, ForecastConfig, MissionParameters,
    OutcomeRecord, ScenarioDistributions, ScenarioEngine, Thresholds, Waypoint,
};

fn weights_with_one_positive() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..10.0, 1..8).prop_map(|mut w| {
        if w.iter().all(|x| *x == 0.0) {
            w[0] = 1.0;
        }
        w
    })
}

fn waypoint() -> impl Strategy<Value = Waypoint> {
    (-90.0f64..90.0, -180.0f64..180.0).prop_map(|(lat, lon)| Waypoint::new(lat, lon))
}

fn record() -> impl Strategy<Value = OutcomeRecord> {
    (
        prop::option::of(0.0f64..1e5),
        0.0f64..1e4,
        0.0f64..=1.0,
    )
        .prop_map(|(duration_s, energy_wh, risk_score)| OutcomeRecord {
            iteration_index: 0,
            weather: "CLEAR".to_string(),
            traffic: "LIGHT".to_string(),
            battery: "HIGH".to_string(),
            payload: "LIGHT".to_string(),
            distance_m: 100.0,
            duration_s,
            energy_wh,
            risk_score,
        })
}

proptest! {
    #[test]
    fn sampling_is_reproducible_for_a_seed(weights in weights_with_one_positive(), seed in any::<u64>()) {
        let labels: Vec<String> = (0..weights.len()).map(|i| format!("L{i}")).collect();
        let dist = CategoricalDistribution { labels, weights: weights.clone() };
        let before = dist.clone();

        let draw_all = |seed: u64| -> Vec<String> {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let sampler = dist.sampler("prop").unwrap();
            (0..64).map(|_| sampler.draw(&mut rng).to_string()).collect()
        };
        let a = draw_all(seed);
        prop_assert_eq!(&a, &draw_all(seed));

        // Zero-weight labels are never drawn.
        for label in &a {
            let idx: usize = label[1..].parse().unwrap();
            prop_assert!(weights[idx] > 0.0);
        }
        prop_assert_eq!(dist, before);
    }

    #[test]
    fn engine_returns_n_ordered_records(n in 1usize..300, seed in any::<u64>()) {
        let engine = ScenarioEngine::new(Arc::new(ForecastConfig::default()));
        let route = vec![Waypoint::new(0.0, 0.0), Waypoint::new(0.3, 0.4)];
        let params = MissionParameters { max_speed_kmh: 30.0, ..MissionParameters::default() };
        let records = engine
            .run(&route, &params, &ScenarioDistributions::default(), n, &mut ChaCha8Rng::seed_from_u64(seed))
            .unwrap();
        prop_assert_eq!(records.len(), n);
        for (i, r) in records.iter().enumerate() {
            prop_assert_eq!(r.iteration_index, i);
            prop_assert!((0.0..=1.0).contains(&r.risk_score));
            prop_assert!(r.energy_wh >= 0.0);
        }
    }

    #[test]
    fn threshold_counts_never_exceed_records(records in prop::collection::vec(record(), 1..200)) {
        let s = summarize(&records, &Thresholds::default()).unwrap();
        prop_assert!(s.high_risk_count + s.low_risk_count <= records.len());
        prop_assert_eq!(
            s.undefined_duration_count,
            records.iter().filter(|r| r.duration_s.is_none()).count()
        );
    }

    #[test]
    fn single_value_summary_has_zero_spread(v in -1e9f64..1e9) {
        let m = MetricSummary::from_values(&[v]).unwrap();
        prop_assert_eq!((m.mean, m.min, m.max, m.std_dev), (v, v, v, 0.0));
    }

    #[test]
    fn distance_is_non_negative_and_reversible(route in prop::collection::vec(waypoint(), 0..20)) {
        let forward = total_distance(&route);
        let mut reversed = route.clone();
        reversed.reverse();
        prop_assert!(forward >= 0.0);
        prop_assert!((forward - total_distance(&reversed)).abs() <= 1e-9 * forward.max(1.0));
        if route.len() < 2 {
            prop_assert_eq!(forward, 0.0);
        }
    }
}
