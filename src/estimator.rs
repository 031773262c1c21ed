//! Monte-Carlo estimator.
//!
//! Runs a fixed number of independent trials, classifies each one and
//! aggregates the categories into an [`Estimate`]: an ordered map from
//! category to count, plus the number of trials that were included and
//! the number that were discarded.
//!
//! # Trials
//!
//! A trial receives its own `&mut SmallRng` and returns a
//! [`TrialOutcome`]: either the categories it was classified into, or
//! [`TrialOutcome::Discarded`] when a bounded retry loop ran out of
//! attempts. Discarded trials are excluded from both the numerator and
//! the denominator of every probability.
//!
//! # Parallelism and reproducibility
//!
//! The trial count is split into `workers` contiguous partitions. Each
//! partition runs sequentially on a generator seeded with
//! [`random::partition_seed`]`(seed, i)`, and the partition results are
//! merged in partition order. For a given `(seed, workers, trials)` the
//! result is therefore identical regardless of how rayon schedules the
//! partitions. Changing `workers` changes the random streams, and so the
//! exact counts, but not the distribution being estimated.
//!
//! # Examples
//! ```
//! use probsim::estimator::{Estimator, EstimatorConfig, TrialOutcome};
//! use rand::Rng;
//!
//! let est = Estimator::new(EstimatorConfig { trials: 10_000, seed: 7, workers: 2 }).unwrap();
//! let heads = est.run(|rng| TrialOutcome::single(rng.random_bool(0.5)));
//! let p = heads.probability(&true).unwrap();
//! assert!((p - 0.5).abs() < 0.03);
//! ```

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, trace};

use crate::distributions::Parametric;
use crate::error::{EstimatorError, Result};
use crate::population::Population;
use crate::random;
use crate::stats::{Histogram, Summary, WelfordAccumulator};

// ============================================================================
// Configuration
// ============================================================================

/// Run parameters shared by every estimator operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EstimatorConfig {
    /// Number of trials requested.
    pub trials: u64,
    /// Base seed; partition `i` uses `partition_seed(seed, i)`.
    pub seed: u64,
    /// Number of independent partitions run in parallel.
    pub workers: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            trials: 10_000,
            seed: 42,
            workers: 1,
        }
    }
}

// ============================================================================
// Outcomes and aggregates
// ============================================================================

/// Result of a single trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome<C> {
    /// The categories this trial falls into. May be empty, in which case
    /// the trial still counts towards the denominator.
    Classified(Vec<C>),
    /// The trial hit its attempt cap and is excluded entirely.
    Discarded,
}

impl<C> TrialOutcome<C> {
    pub fn single(category: C) -> Self {
        TrialOutcome::Classified(vec![category])
    }

    /// An included trial that matched no category.
    pub fn none() -> Self {
        TrialOutcome::Classified(Vec::new())
    }

    pub fn from_categories<I: IntoIterator<Item = C>>(categories: I) -> Self {
        TrialOutcome::Classified(categories.into_iter().collect())
    }
}

impl<C> From<Option<C>> for TrialOutcome<C> {
    fn from(category: Option<C>) -> Self {
        match category {
            Some(c) => TrialOutcome::single(c),
            None => TrialOutcome::none(),
        }
    }
}

/// One row of an estimate, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRow<C> {
    pub label: C,
    pub count: u64,
    /// `None` when no trial was included.
    pub probability: Option<f64>,
}

/// Aggregated counts of a Monte-Carlo run.
///
/// Invariants: `included + discarded == requested`, and every category
/// count is at most `included`. For classifiers that put each trial in at
/// most one category, the counts sum to at most `included`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estimate<C: Ord> {
    counts: BTreeMap<C, u64>,
    included: u64,
    discarded: u64,
}

impl<C: Ord> Default for Estimate<C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<C: Ord> Estimate<C> {
    pub fn empty() -> Self {
        Self {
            counts: BTreeMap::new(),
            included: 0,
            discarded: 0,
        }
    }

    /// Adds one trial's outcome.
    pub fn record(&mut self, outcome: TrialOutcome<C>) {
        match outcome {
            TrialOutcome::Classified(categories) => {
                self.included += 1;
                for c in categories {
                    *self.counts.entry(c).or_insert(0) += 1;
                }
            }
            TrialOutcome::Discarded => self.discarded += 1,
        }
    }

    /// Sums another estimate into this one.
    pub fn merge(&mut self, other: Estimate<C>) {
        for (c, n) in other.counts {
            *self.counts.entry(c).or_insert(0) += n;
        }
        self.included += other.included;
        self.discarded += other.discarded;
    }

    pub fn counts(&self) -> &BTreeMap<C, u64> {
        &self.counts
    }

    /// Count for one category; zero if it never occurred.
    pub fn count(&self, category: &C) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// Trials that produced a classification.
    pub fn included(&self) -> u64 {
        self.included
    }

    /// Trials that exceeded their attempt cap.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn requested(&self) -> u64 {
        self.included + self.discarded
    }

    /// Empirical probability `count / included`.
    ///
    /// # Returns
    /// - `None` if no trial was included (the ratio is undefined).
    pub fn probability(&self, category: &C) -> Option<f64> {
        if self.included == 0 {
            return None;
        }
        Some(self.count(category) as f64 / self.included as f64)
    }

    /// Mean of a numeric value attached to each category, weighted by
    /// count. `None` when no category was recorded.
    pub fn weighted_mean<F: Fn(&C) -> f64>(&self, value: F) -> Option<f64> {
        let total: u64 = self.counts.values().sum();
        if total == 0 {
            return None;
        }
        let sum: f64 = self
            .counts
            .iter()
            .map(|(c, &n)| value(c) * n as f64)
            .sum();
        Some(sum / total as f64)
    }
}

impl<C: Ord + Clone> Estimate<C> {
    /// `(label, count, probability)` rows in category order.
    pub fn rows(&self) -> Vec<OutcomeRow<C>> {
        self.counts
            .iter()
            .map(|(c, &n)| OutcomeRow {
                label: c.clone(),
                count: n,
                probability: self.probability(c),
            })
            .collect()
    }
}

/// Per-trial values of a scalar statistic with their running moments.
#[derive(Debug, Clone)]
pub struct StatisticRun {
    /// One value per trial, in partition order.
    pub values: Vec<f64>,
    pub summary: WelfordAccumulator,
}

impl StatisticRun {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        self.summary.mean()
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.summary.sample_std_dev()
    }

    pub fn describe(&self) -> Summary {
        Summary::from_parts(&self.summary, &self.values)
    }

    /// Density histogram of the values over `[lo, hi]`.
    pub fn histogram(&self, lo: f64, hi: f64, bins: usize) -> Option<Histogram> {
        Histogram::from_data(&self.values, lo, hi, bins)
    }
}

// ============================================================================
// Estimator
// ============================================================================

/// Runs trials and aggregates their outcomes.
#[derive(Debug, Clone)]
pub struct Estimator {
    config: EstimatorConfig,
}

impl Estimator {
    /// # Errors
    /// `InvalidConfiguration` if `workers == 0`.
    pub fn new(config: EstimatorConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(EstimatorError::invalid("workers must be at least 1"));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Trials per partition. The first `trials % workers` partitions get
    /// one extra trial.
    pub fn partition_sizes(&self) -> Vec<u64> {
        let workers = self.config.workers as u64;
        let base = self.config.trials / workers;
        let extra = self.config.trials % workers;
        (0..workers).map(|i| base + u64::from(i < extra)).collect()
    }

    /// Runs `run_partition` once per partition, each with its own seeded
    /// generator, and returns the results in partition order.
    fn partitioned<A, F>(&self, run_partition: F) -> Vec<A>
    where
        A: Send,
        F: Fn(&mut SmallRng, u64) -> A + Sync,
    {
        let seed = self.config.seed;
        self.partition_sizes()
            .into_par_iter()
            .enumerate()
            .map(|(i, n)| {
                trace!(partition = i, trials = n, "running partition");
                let mut rng = random::create_rng(random::partition_seed(seed, i));
                run_partition(&mut rng, n)
            })
            .collect()
    }

    /// Runs every trial and aggregates the outcomes.
    ///
    /// This is the general form; the other operations are built on it.
    pub fn run<C, F>(&self, trial: F) -> Estimate<C>
    where
        C: Ord + Send,
        F: Fn(&mut SmallRng) -> TrialOutcome<C> + Sync,
    {
        debug!(
            trials = self.config.trials,
            seed = self.config.seed,
            workers = self.config.workers,
            "starting estimator run"
        );
        let parts = self.partitioned(|rng, n| {
            let mut est = Estimate::empty();
            for _ in 0..n {
                est.record(trial(rng));
            }
            est
        });
        let mut total = Estimate::empty();
        for part in parts {
            total.merge(part);
        }
        debug!(
            included = total.included(),
            discarded = total.discarded(),
            categories = total.counts().len(),
            "estimator run finished"
        );
        total
    }

    /// Draws `k` members without replacement per trial and classifies
    /// the sample.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `k > population.len()`, before any trial
    /// runs.
    pub fn sample_population<L, C, I, F>(
        &self,
        population: &Population<L>,
        k: usize,
        classify: F,
    ) -> Result<Estimate<C>>
    where
        L: Sync,
        C: Ord + Send,
        I: IntoIterator<Item = C>,
        F: Fn(&[&L]) -> I + Sync,
    {
        if k > population.len() {
            return Err(EstimatorError::invalid(format!(
                "sample size {k} exceeds population size {}",
                population.len()
            )));
        }
        Ok(self.run(|rng| {
            let mut sample = Vec::with_capacity(k);
            population.sample_into(k, rng, &mut sample);
            TrialOutcome::from_categories(classify(&sample))
        }))
    }

    /// Draws `k` independent values from `dist` per trial and classifies
    /// them.
    pub fn sample_distribution<C, I, F>(
        &self,
        dist: &Parametric,
        k: usize,
        classify: F,
    ) -> Estimate<C>
    where
        C: Ord + Send,
        I: IntoIterator<Item = C>,
        F: Fn(&[f64]) -> I + Sync,
    {
        self.run(|rng| {
            let mut sample = vec![0.0; k];
            dist.fill(&mut sample, rng);
            TrialOutcome::from_categories(classify(&sample))
        })
    }

    /// Bounded retry: per trial, calls `attempt(rng, n)` for
    /// `n = 1..=max_attempts` until it returns `Some`. Trials that never
    /// succeed are discarded.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `max_attempts == 0`.
    pub fn until_success<C, F>(&self, max_attempts: u32, attempt: F) -> Result<Estimate<C>>
    where
        C: Ord + Send,
        F: Fn(&mut SmallRng, u32) -> Option<C> + Sync,
    {
        if max_attempts == 0 {
            return Err(EstimatorError::invalid("attempt cap must be at least 1"));
        }
        Ok(self.run(|rng| {
            match bounded_attempts(max_attempts, |n| attempt(rng, n)) {
                Ok(c) => TrialOutcome::single(c),
                Err(_) => TrialOutcome::Discarded,
            }
        }))
    }

    /// Evaluates a scalar statistic once per trial.
    pub fn statistic<F>(&self, f: F) -> StatisticRun
    where
        F: Fn(&mut SmallRng) -> f64 + Sync,
    {
        debug!(
            trials = self.config.trials,
            seed = self.config.seed,
            workers = self.config.workers,
            "starting statistic run"
        );
        let parts = self.partitioned(|rng, n| {
            let mut values = Vec::with_capacity(n as usize);
            let mut acc = WelfordAccumulator::new();
            for _ in 0..n {
                let v = f(rng);
                acc.update(v);
                values.push(v);
            }
            (values, acc)
        });
        let mut values = Vec::with_capacity(self.config.trials as usize);
        let mut summary = WelfordAccumulator::new();
        for (v, acc) in parts {
            values.extend(v);
            summary.merge(&acc);
        }
        debug!(values = values.len(), mean = ?summary.mean(), "statistic run finished");
        StatisticRun { values, summary }
    }
}

/// Calls `attempt(n)` for `n = 1..=max_attempts` and returns the first
/// success.
///
/// # Errors
/// `TrialAttemptExceeded` when every attempt returned `None`.
///
/// # Examples
/// ```
/// use probsim::estimator::bounded_attempts;
/// assert_eq!(bounded_attempts(5, |n| (n == 3).then_some(n)), Ok(3));
/// assert!(bounded_attempts(2, |_| None::<u32>).is_err());
/// ```
pub fn bounded_attempts<C, F>(max_attempts: u32, mut attempt: F) -> Result<C>
where
    F: FnMut(u32) -> Option<C>,
{
    for n in 1..=max_attempts {
        if let Some(c) = attempt(n) {
            return Ok(c);
        }
    }
    Err(EstimatorError::TrialAttemptExceeded {
        attempts: max_attempts,
    })
}

// ============================================================================
// Tests
// ============================================================================
