//! End-to-end checks of the estimator through the concrete exercises.

use probsim::scenarios::combinatorics::{
    self, party_support, unanimous_probability, LotteryParams, PartyParams,
};
use probsim::scenarios::dice::{rolls_to_target, RollsParams};
use probsim::{Estimator, EstimatorConfig, EstimatorError, Population, TrialOutcome};

fn estimator(trials: u64, seed: u64, workers: usize) -> Estimator {
    Estimator::new(EstimatorConfig {
        trials,
        seed,
        workers,
    })
    .unwrap()
}

// All-A groups of four from 500/300/200 match C(500,4)/C(1000,4)
#[test]
fn party_support_all_a_within_tolerance() {
    let result = party_support(&estimator(50_000, 2024, 4), &PartyParams::default()).unwrap();
    let a = &result.rows[0];
    assert_eq!(a.party, "A");
    let exact = unanimous_probability(500, 1000, 4);
    assert!((a.exact - exact).abs() < 1e-15);
    let estimated = a.estimated.unwrap();
    assert!(
        (estimated - exact).abs() < 0.005,
        "estimated={estimated} exact={exact}"
    );
}

// Exclusive categories: unanimous counts never exceed included trials
#[test]
fn party_support_counts_bounded_by_trials() {
    let result = party_support(&estimator(5_000, 3, 3), &PartyParams::default()).unwrap();
    let total: u64 = result.rows.iter().map(|r| r.count).sum();
    assert!(total <= result.trials);
    let p_sum: f64 = result.rows.iter().filter_map(|r| r.estimated).sum();
    assert!(p_sum <= 1.0 + 1e-12);
    for row in &result.rows {
        let p = row.estimated.unwrap();
        assert!((0.0..=1.0).contains(&p));
    }
}

// Lottery estimate is within five standard errors of 1/C(20,4)
#[test]
fn lottery_within_binomial_tolerance() {
    let result = combinatorics::lottery(&estimator(200_000, 11, 4), &LotteryParams::default())
        .unwrap();
    assert!((result.exact - 1.0 / 4845.0).abs() < 1e-15);
    let se = result.standard_error.unwrap();
    let estimated = result.estimated.unwrap();
    assert!(
        (estimated - result.exact).abs() < 5.0 * se,
        "estimated={estimated} exact={} se={se}",
        result.exact
    );
}

// Capped trials are excluded from numerator and denominator
#[test]
fn rolls_cap_excludes_discarded_trials() {
    let params = RollsParams {
        max_attempts: 2,
        ..RollsParams::default()
    };
    let result = rolls_to_target(&estimator(20_000, 8, 2), &params).unwrap();
    assert_eq!(result.included + result.discarded, 20_000);
    assert!((result.expected_discard_fraction - (5.0f64 / 6.0).powi(2)).abs() < 1e-12);
    let discard_fraction = result.discarded as f64 / 20_000.0;
    assert!((discard_fraction - result.expected_discard_fraction).abs() < 0.015);

    let counted: u64 = result.distribution.iter().map(|r| r.count).sum();
    assert_eq!(counted, result.included);
    let p_sum: f64 = result.distribution.iter().filter_map(|r| r.estimated).sum();
    assert!((p_sum - 1.0).abs() < 1e-9);
    assert!(result.max_rolls.unwrap() <= 2);
}

// Zero trials yield the undefined marker, never a panic
#[test]
fn zero_trials_is_undefined() {
    let est = estimator(0, 1, 4);
    let result = party_support(&est, &PartyParams::default()).unwrap();
    assert_eq!(result.trials, 0);
    assert!(result.rows.iter().all(|r| r.estimated.is_none()));

    let estimate = est.run(|_| TrialOutcome::single(1u8));
    assert_eq!(estimate.probability(&1), None);
    assert!(estimate.rows().iter().all(|r| r.probability.is_none()));
}

// Same (seed, workers, trials) gives identical aggregates
#[test]
fn runs_are_reproducible() {
    let a = party_support(&estimator(3_000, 77, 4), &PartyParams::default()).unwrap();
    let b = party_support(&estimator(3_000, 77, 4), &PartyParams::default()).unwrap();
    assert_eq!(a, b);
}

// Oversized samples are rejected before any trial runs
#[test]
fn oversized_sample_is_invalid_configuration() {
    let population = Population::from_counts([('x', 2), ('y', 1)]).unwrap();
    let err = estimator(10, 1, 1)
        .sample_population(&population, 4, |_| None::<u8>)
        .unwrap_err();
    assert!(matches!(err, EstimatorError::InvalidConfiguration(_)));
}

// Drawn groups never contain the same member twice
#[test]
fn population_samples_have_no_duplicate_members() {
    let population = Population::from_counts((0..50u32).map(|n| (n, 1))).unwrap();
    let estimate = estimator(2_000, 5, 2)
        .sample_population(&population, 10, |sample| {
            let mut seen: Vec<u32> = sample.iter().map(|&&n| n).collect();
            seen.sort_unstable();
            seen.dedup();
            Some(seen.len() == 10)
        })
        .unwrap();
    assert_eq!(estimate.count(&true), 2_000);
}
