//! Coins and dice: independent draws with replacement.
//!
//! - [`coin_tosses`]: distribution of the number of heads in a fixed
//!   number of flips, against the binomial PMF.
//! - [`unfair_die`]: face frequencies of a weighted die.
//! - [`rolls_to_target`]: how many rolls of a set of dice it takes for
//!   the sum to hit a target. Each trial is capped; trials that hit the
//!   cap are discarded and reported separately.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EstimatorError, Result};
use crate::estimator::{Estimator, TrialOutcome};
use crate::random::WeightedSampler;
use crate::special::binomial_pmf;

const FACES: u32 = 6;

// ============================================================================
// Coin tosses
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoinParams {
    /// Flips per trial.
    pub flips: u32,
    /// Number of heads whose probability is reported.
    pub target: u32,
    pub p_heads: f64,
    pub trials: i64,
}

impl Default for CoinParams {
    fn default() -> Self {
        Self {
            flips: 100,
            target: 35,
            p_heads: 0.5,
            trials: 100_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadsRow {
    pub heads: u32,
    pub count: u64,
    pub estimated: Option<f64>,
    pub exact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoinResult {
    pub flips: u32,
    pub target: u32,
    pub trials: u64,
    pub target_count: u64,
    pub target_estimated: Option<f64>,
    pub target_exact: f64,
    pub average_heads: Option<f64>,
    pub expected_heads: f64,
    /// Heads counts that occurred at least once.
    pub distribution: Vec<HeadsRow>,
}

/// Flips a coin `flips` times per trial and tallies the number of heads.
///
/// # Errors
/// `InvalidConfiguration` if `p_heads` is outside `[0, 1]`.
pub fn coin_tosses(estimator: &Estimator, params: &CoinParams) -> Result<CoinResult> {
    let p = params.p_heads;
    if !(0.0..=1.0).contains(&p) {
        return Err(EstimatorError::invalid(format!(
            "heads probability must be in [0, 1], got {p}"
        )));
    }
    let flips = params.flips;
    let estimate = estimator.run(|rng| {
        let heads = (0..flips).filter(|_| rng.random_bool(p)).count() as u32;
        TrialOutcome::single(heads)
    });
    let pmf = |k: u32| binomial_pmf(u64::from(flips), u64::from(k), p);
    let distribution = estimate
        .rows()
        .into_iter()
        .map(|row| HeadsRow {
            heads: row.label,
            count: row.count,
            estimated: row.probability,
            exact: pmf(row.label),
        })
        .collect();
    Ok(CoinResult {
        flips,
        target: params.target,
        trials: estimate.included(),
        target_count: estimate.count(&params.target),
        target_estimated: estimate.probability(&params.target),
        target_exact: pmf(params.target),
        average_heads: estimate.weighted_mean(|&h| f64::from(h)),
        expected_heads: f64::from(flips) * p,
        distribution,
    })
}

// ============================================================================
// Unfair die
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnfairDieParams {
    /// Relative weight of faces 1, 2, 3, ... Only the ratios matter.
    pub weights: Vec<f64>,
    pub trials: i64,
}

impl Default for UnfairDieParams {
    fn default() -> Self {
        Self {
            weights: vec![10.0, 15.0, 30.0, 25.0, 5.0, 15.0],
            trials: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceRow {
    pub face: u32,
    pub weight: f64,
    pub count: u64,
    pub estimated: Option<f64>,
    pub exact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnfairDieResult {
    pub trials: u64,
    pub faces: Vec<FaceRow>,
}

/// Rolls a weighted die once per trial.
///
/// # Errors
/// `InvalidConfiguration` if no face has a positive finite weight.
pub fn unfair_die(estimator: &Estimator, params: &UnfairDieParams) -> Result<UnfairDieResult> {
    let weights = &params.weights;
    let faces: Vec<u32> = (1..=weights.len() as u32).collect();
    let sampler = WeightedSampler::new(weights)
        .ok_or_else(|| EstimatorError::invalid(
            "die needs at least one positive face weight and a finite total",
        ))?;
    let estimate = estimator.run(|rng| TrialOutcome::single(faces[sampler.sample(rng)]));
    let total = sampler.total_weight();
    let rows = faces
        .iter()
        .zip(weights)
        .map(|(&face, &weight)| {
            let weight = if weight > 0.0 && weight.is_finite() {
                weight
            } else {
                0.0
            };
            FaceRow {
                face,
                weight,
                count: estimate.count(&face),
                estimated: estimate.probability(&face),
                exact: weight / total,
            }
        })
        .collect();
    Ok(UnfairDieResult {
        trials: estimate.included(),
        faces: rows,
    })
}

// ============================================================================
// Rolls to target
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RollsParams {
    /// Sum to reach.
    pub target: u32,
    /// Six-sided dice rolled together.
    pub dice: u32,
    /// Rolls allowed per trial before it is discarded.
    pub max_attempts: u32,
    pub trials: i64,
}

impl Default for RollsParams {
    fn default() -> Self {
        Self {
            target: 7,
            dice: 2,
            max_attempts: 60,
            trials: 100_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollsRow {
    pub rolls: u32,
    pub count: u64,
    pub estimated: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollsResult {
    pub target: u32,
    pub dice: u32,
    pub max_attempts: u32,
    pub included: u64,
    pub discarded: u64,
    /// Probability that a single roll hits the target.
    pub hit_probability: f64,
    /// Expected fraction of trials discarded: `(1 − p)^max_attempts`.
    pub expected_discard_fraction: f64,
    /// Expected rolls given the trial was not discarded.
    pub expected_rolls: Option<f64>,
    pub average_rolls: Option<f64>,
    pub min_rolls: Option<u32>,
    pub max_rolls: Option<u32>,
    pub distribution: Vec<RollsRow>,
}

/// Probability that the sum of `dice` fair six-sided dice equals `target`.
///
/// # Examples
/// ```
/// use probsim::scenarios::dice::sum_probability;
/// assert!((sum_probability(2, 7) - 6.0 / 36.0).abs() < 1e-15);
/// assert_eq!(sum_probability(2, 13), 0.0);
/// ```
pub fn sum_probability(dice: u32, target: u32) -> f64 {
    // ways[s] = number of ordered rolls summing to s
    let mut ways = vec![1.0_f64];
    for _ in 0..dice {
        let mut next = vec![0.0; ways.len() + FACES as usize];
        for (s, &w) in ways.iter().enumerate() {
            for face in 1..=FACES as usize {
                next[s + face] += w;
            }
        }
        ways = next;
    }
    let total = f64::from(FACES).powf(f64::from(dice));
    ways.get(target as usize).map_or(0.0, |w| w / total)
}

/// Expected rolls to the first hit, conditioned on a hit within `cap`
/// rolls, for per-roll hit probability `p`:
/// `1/p − cap·q^cap / (1 − q^cap)` with `q = 1 − p`.
fn truncated_geometric_mean(p: f64, cap: u32) -> Option<f64> {
    if p <= 0.0 {
        return None;
    }
    let cap = f64::from(cap);
    let miss_all = (1.0 - p).powf(cap);
    let mass = 1.0 - miss_all;
    // q rounds to 1 for vanishing p
    if mass <= 0.0 {
        return None;
    }
    Some(1.0 / p - cap * miss_all / mass)
}

/// Rolls `dice` dice until their sum equals `target`, at most
/// `max_attempts` times per trial.
///
/// # Errors
/// `InvalidConfiguration` if `dice == 0` or `max_attempts == 0`.
pub fn rolls_to_target(estimator: &Estimator, params: &RollsParams) -> Result<RollsResult> {
    if params.dice == 0 {
        return Err(EstimatorError::invalid("at least one die is required"));
    }
    let (dice, target) = (params.dice, params.target);
    let estimate = estimator.until_success(params.max_attempts, |rng, attempt| {
        let sum: u32 = (0..dice).map(|_| rng.random_range(1..=FACES)).sum();
        (sum == target).then_some(attempt)
    })?;
    let p = sum_probability(dice, target);
    let distribution = estimate
        .rows()
        .into_iter()
        .map(|row| RollsRow {
            rolls: row.label,
            count: row.count,
            estimated: row.probability,
        })
        .collect();
    Ok(RollsResult {
        target,
        dice,
        max_attempts: params.max_attempts,
        included: estimate.included(),
        discarded: estimate.discarded(),
        hit_probability: p,
        expected_discard_fraction: (1.0 - p).powf(f64::from(params.max_attempts)),
        expected_rolls: truncated_geometric_mean(p, params.max_attempts),
        average_rolls: estimate.weighted_mean(|&r| f64::from(r)),
        min_rolls: estimate.counts().keys().next().copied(),
        max_rolls: estimate.counts().keys().next_back().copied(),
        distribution,
    })
}
