//! Sampling without replacement from finite populations.
//!
//! Each scenario builds a [`Population`], draws fixed-size groups through
//! [`Estimator::sample_population`] and compares the empirical frequency
//! with the hypergeometric closed form.

use serde::{Deserialize, Serialize};

use crate::error::{EstimatorError, Result};
use crate::estimator::Estimator;
use crate::population::Population;
use crate::special::binomial;

/// Exact P(all k drawn members come from a group of `size`) when drawing
/// k from `total` without replacement: `C(size, k) / C(total, k)`.
///
/// # Examples
/// ```
/// use probsim::scenarios::combinatorics::unanimous_probability;
/// assert!((unanimous_probability(500, 1000, 4) - 0.062125).abs() < 1e-5);
/// ```
pub fn unanimous_probability(size: usize, total: usize, k: usize) -> f64 {
    binomial(size as u64, k as u64) / binomial(total as u64, k as u64)
}

// ============================================================================
// Party support
// ============================================================================

/// A party and its number of supporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub supporters: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartyParams {
    pub parties: Vec<Party>,
    /// Size of the group drawn per trial.
    pub group: usize,
    pub trials: i64,
}

impl Default for PartyParams {
    fn default() -> Self {
        let party = |name: &str, supporters| Party {
            name: name.to_string(),
            supporters,
        };
        Self {
            parties: vec![party("A", 500), party("B", 300), party("C", 200)],
            group: 4,
            trials: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyRow {
    pub party: String,
    pub supporters: usize,
    /// Trials in which the whole group supported this party.
    pub count: u64,
    pub estimated: Option<f64>,
    pub exact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyResult {
    pub population: usize,
    pub group: usize,
    pub trials: u64,
    pub rows: Vec<PartyRow>,
}

/// Probability that a randomly drawn group unanimously supports each
/// party.
///
/// # Errors
/// `InvalidConfiguration` if the population is empty or the group is
/// larger than the population.
pub fn party_support(estimator: &Estimator, params: &PartyParams) -> Result<PartyResult> {
    // Label members by party index so the classifier never clones names.
    let population = Population::from_counts(
        params
            .parties
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.supporters)),
    )?;
    let k = params.group;
    let estimate = estimator.sample_population(&population, k, |sample| {
        let first = **sample.first()?;
        sample.iter().all(|&&p| p == first).then_some(first)
    })?;
    let total = population.len();
    let rows = params
        .parties
        .iter()
        .enumerate()
        .map(|(i, p)| PartyRow {
            party: p.name.clone(),
            supporters: p.supporters,
            count: estimate.count(&i),
            estimated: estimate.probability(&i),
            exact: unanimous_probability(p.supporters, total, k),
        })
        .collect();
    Ok(PartyResult {
        population: total,
        group: k,
        trials: estimate.included(),
        rows,
    })
}

// ============================================================================
// Equal split
// ============================================================================

/// Two-category population (e.g. boys and girls) from which groups are
/// drawn; the event is an exactly even split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EqualSplitParams {
    pub first: usize,
    pub second: usize,
    pub group: usize,
    pub trials: i64,
}

impl Default for EqualSplitParams {
    fn default() -> Self {
        Self {
            first: 500,
            second: 500,
            group: 4,
            trials: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EqualSplitResult {
    pub group: usize,
    pub trials: u64,
    pub count: u64,
    pub estimated: Option<f64>,
    pub exact: f64,
}

/// Exact P(equal split) = `C(first, k/2)·C(second, k/2) / C(first+second, k)`,
/// zero for odd k.
pub fn equal_split_probability(first: usize, second: usize, k: usize) -> f64 {
    if k % 2 == 1 {
        return 0.0;
    }
    let half = (k / 2) as u64;
    binomial(first as u64, half) * binomial(second as u64, half)
        / binomial((first + second) as u64, k as u64)
}

pub fn equal_split(estimator: &Estimator, params: &EqualSplitParams) -> Result<EqualSplitResult> {
    let population = Population::from_counts([(true, params.first), (false, params.second)])?;
    let k = params.group;
    let estimate = estimator.sample_population(&population, k, |sample| {
        let firsts = sample.iter().filter(|&&&x| x).count();
        (2 * firsts == sample.len()).then_some(())
    })?;
    Ok(EqualSplitResult {
        group: k,
        trials: estimate.included(),
        count: estimate.count(&()),
        estimated: estimate.probability(&()),
        exact: equal_split_probability(params.first, params.second, k),
    })
}

// ============================================================================
// Lottery
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LotteryParams {
    /// Numbers `1..=pool` are in play.
    pub pool: u32,
    pub draw: usize,
    /// The player's numbers. Defaults to `1..=draw` when absent.
    pub ticket: Option<Vec<u32>>,
    pub trials: i64,
}

impl Default for LotteryParams {
    fn default() -> Self {
        Self {
            pool: 20,
            draw: 4,
            ticket: None,
            trials: 200_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotteryResult {
    pub pool: u32,
    pub draw: usize,
    pub ticket: Vec<u32>,
    pub trials: u64,
    pub wins: u64,
    pub estimated: Option<f64>,
    pub exact: f64,
    /// Standard error of the estimate under the exact probability.
    pub standard_error: Option<f64>,
}

/// Probability that the winning draw matches the player's ticket exactly.
///
/// # Errors
/// `InvalidConfiguration` if the ticket does not hold `draw` distinct
/// numbers from `1..=pool`, or `draw > pool`.
pub fn lottery(estimator: &Estimator, params: &LotteryParams) -> Result<LotteryResult> {
    let mut ticket = params
        .ticket
        .clone()
        .unwrap_or_else(|| (1..=params.draw as u32).collect());
    ticket.sort_unstable();
    ticket.dedup();
    if ticket.len() != params.draw || ticket.iter().any(|&n| n == 0 || n > params.pool) {
        return Err(EstimatorError::invalid(format!(
            "ticket must hold {} distinct numbers from 1..={}",
            params.draw, params.pool
        )));
    }
    let population = Population::from_counts((1..=params.pool).map(|n| (n, 1)))?;
    let estimate = estimator.sample_population(&population, params.draw, |sample| {
        let mut drawn: Vec<u32> = sample.iter().map(|&&n| n).collect();
        drawn.sort_unstable();
        (drawn == ticket).then_some(())
    })?;
    let exact = 1.0 / binomial(u64::from(params.pool), params.draw as u64);
    let n = estimate.included();
    Ok(LotteryResult {
        pool: params.pool,
        draw: params.draw,
        ticket,
        trials: n,
        wins: estimate.count(&()),
        estimated: estimate.probability(&()),
        exact,
        standard_error: (n > 0).then(|| (exact * (1.0 - exact) / n as f64).sqrt()),
    })
}

// ============================================================================
// Four of a kind
// ============================================================================

const RANKS: u64 = 13;
const SUITS: u64 = 4;
const DECK: u64 = RANKS * SUITS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FourKindParams {
    pub hand: usize,
    pub trials: i64,
}

impl Default for FourKindParams {
    fn default() -> Self {
        Self {
            hand: 6,
            trials: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FourKindResult {
    pub hand: usize,
    /// Hands holding at least one four of a kind.
    pub favourable_hands: f64,
    pub total_hands: f64,
    pub exact: f64,
    pub trials: u64,
    pub count: u64,
    pub estimated: Option<f64>,
}

/// Number of `hand`-card hands from a 52-card deck that contain all four
/// cards of at least one rank, by inclusion–exclusion over the ranks:
/// `Σ_j (−1)^{j+1} C(13, j) C(52 − 4j, hand − 4j)`.
///
/// # Examples
/// ```
/// use probsim::scenarios::combinatorics::four_kind_hands;
/// // 13 ranks times C(48, 2) ways to fill the other two cards
/// assert_eq!(four_kind_hands(6), 14_664.0);
/// ```
pub fn four_kind_hands(hand: usize) -> f64 {
    let hand = hand as u64;
    let mut total = 0.0;
    for j in 1..=RANKS {
        if SUITS * j > hand {
            break;
        }
        let term = binomial(RANKS, j) * binomial(DECK - SUITS * j, hand - SUITS * j);
        if j % 2 == 1 {
            total += term;
        } else {
            total -= term;
        }
    }
    total
}

/// Exact and Monte-Carlo probability of a four of a kind in a hand.
///
/// # Errors
/// `InvalidConfiguration` if `hand > 52`.
pub fn four_kind(estimator: &Estimator, params: &FourKindParams) -> Result<FourKindResult> {
    let deck = Population::from_counts((0..RANKS as u8).map(|rank| (rank, SUITS as usize)))?;
    let estimate = estimator.sample_population(&deck, params.hand, |hand| {
        let mut per_rank = [0u8; RANKS as usize];
        for &&rank in hand {
            per_rank[rank as usize] += 1;
        }
        per_rank.contains(&(SUITS as u8)).then_some(())
    })?;
    let favourable = four_kind_hands(params.hand);
    let total = binomial(DECK, params.hand as u64);
    Ok(FourKindResult {
        hand: params.hand,
        favourable_hands: favourable,
        total_hands: total,
        exact: favourable / total,
        trials: estimate.included(),
        count: estimate.count(&()),
        estimated: estimate.probability(&()),
    })
}
