//! Property-based tests for sampling and aggregation.

use proptest::prelude::*;

use probsim::random::{create_rng, sample_indices};
use probsim::{Estimator, EstimatorConfig, TrialOutcome};
use rand::Rng;

fn config_strategy() -> impl Strategy<Value = EstimatorConfig> {
    (0..500u64, any::<u64>(), 1..8usize).prop_map(|(trials, seed, workers)| EstimatorConfig {
        trials,
        seed,
        workers,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    // k-subsets are distinct and in range
    #[test]
    fn indices_distinct_and_in_range(n in 0..200usize, k in 0..200usize, seed: u64) {
        let mut rng = create_rng(seed);
        match sample_indices(n, k, &mut rng) {
            None => prop_assert!(k > n),
            Some(mut idx) => {
                prop_assert_eq!(idx.len(), k);
                prop_assert!(idx.iter().all(|&i| i < n));
                idx.sort_unstable();
                idx.dedup();
                prop_assert_eq!(idx.len(), k);
            }
        }
    }

    // included + discarded = requested
    #[test]
    fn trials_accounted_for(config in config_strategy()) {
        let est = Estimator::new(config).unwrap();
        let estimate = est.run(|rng| {
            let x: u8 = rng.random_range(0..4);
            match x {
                0 => TrialOutcome::Discarded,
                1 => TrialOutcome::none(),
                _ => TrialOutcome::single(x),
            }
        });
        prop_assert_eq!(estimate.included() + estimate.discarded(), config.trials);
        let counted: u64 = estimate.counts().values().sum();
        prop_assert!(counted <= estimate.included());
    }

    // Partitioning classifiers: counts sum to included trials
    #[test]
    fn partitioning_counts_sum_to_included(config in config_strategy()) {
        let est = Estimator::new(config).unwrap();
        let estimate = est.run(|rng| TrialOutcome::single(rng.random_range(0..6u8)));
        let counted: u64 = estimate.counts().values().sum();
        prop_assert_eq!(counted, estimate.included());
        if estimate.included() > 0 {
            let total: f64 = estimate.rows().iter().filter_map(|r| r.probability).sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
        }
    }

    // Deterministic for a fixed configuration
    #[test]
    fn deterministic(config in config_strategy()) {
        let est = Estimator::new(config).unwrap();
        let trial = |rng: &mut rand::rngs::SmallRng| TrialOutcome::single(rng.random_range(0..10u8));
        prop_assert_eq!(est.run(trial), est.run(trial));
    }
}
