//! Central Limit Theorem demonstrations.
//!
//! Both scenarios sum `n` i.i.d. draws per trial and compare the
//! histogram of the sums with the normal density predicted by the CLT,
//! `N(n·μ, n·σ²)`:
//!
//! - [`book_stack`]: book thickness `~ U(a, b)`, so a stack of `n` books
//!   has mean `n(a + b)/2` and standard deviation `√n·(b − a)/√12`.
//! - [`battery_carton`]: battery lifetime `~ Exponential(mean β)`, so a
//!   carton of `n` has mean `nβ` and standard deviation `β√n`. The
//!   exponential is strongly skewed, which makes the approach to
//!   normality visible as `n` grows.

use serde::{Deserialize, Serialize};

use crate::distributions::{Exponential, Normal, Parametric, Uniform};
use crate::error::{EstimatorError, Result};
use crate::estimator::{Estimator, StatisticRun};
use crate::stats::{Histogram, Summary};

/// Histogram bar with the CLT normal density at its centre and the
/// empirical CDF at its upper edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayBin {
    pub lower: f64,
    pub upper: f64,
    pub center: f64,
    pub count: u64,
    pub density: f64,
    pub normal_pdf: f64,
    pub cdf: f64,
}

/// Sum of `n` draws, simulated and predicted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumDistribution {
    pub n: u32,
    pub theoretical_mean: f64,
    pub theoretical_std_dev: f64,
    pub summary: Summary,
    pub bins: Vec<OverlayBin>,
}

/// Simulates `trials` sums of `n` draws from `dist`.
fn simulate_sums(estimator: &Estimator, dist: &Parametric, n: u32) -> StatisticRun {
    estimator.statistic(|rng| (0..n).map(|_| dist.sample(rng)).sum())
}

fn overlay(hist: &Histogram, normal: &Normal) -> Vec<OverlayBin> {
    hist.bins()
        .into_iter()
        .zip(hist.cumulative())
        .map(|(bin, cdf)| OverlayBin {
            lower: bin.lower,
            upper: bin.upper,
            center: bin.center,
            count: bin.count,
            density: bin.density,
            normal_pdf: normal.pdf(bin.center),
            cdf,
        })
        .collect()
}

fn sum_distribution(
    run: &StatisticRun,
    n: u32,
    hist: &Histogram,
    normal: &Normal,
) -> SumDistribution {
    SumDistribution {
        n,
        theoretical_mean: normal.mean(),
        theoretical_std_dev: normal.std_dev(),
        summary: run.describe(),
        bins: overlay(hist, normal),
    }
}

/// CLT normal for the sum of `n` draws from `dist`.
fn clt_normal(dist: &Parametric, n: u32) -> Result<Normal> {
    let n = f64::from(n);
    Ok(Normal::new(n * dist.mean(), (n * dist.variance()).sqrt())?)
}

// ============================================================================
// Book stack
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookStackParams {
    /// Thickness range of one book, in cm.
    pub a: f64,
    pub b: f64,
    pub stack_sizes: Vec<u32>,
    pub bins: usize,
    pub trials: i64,
}

impl Default for BookStackParams {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 3.0,
            stack_sizes: vec![1, 5, 15],
            bins: 30,
            trials: 100_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookStackResult {
    pub a: f64,
    pub b: f64,
    pub book_mean: f64,
    pub book_std_dev: f64,
    pub stacks: Vec<SumDistribution>,
}

/// Stack heights for each stack size, binned on `[n·a, n·b]`.
///
/// # Errors
/// - `Distribution` if `a >= b`.
/// - `InvalidConfiguration` if a stack size or the bin count is zero.
pub fn book_stack(estimator: &Estimator, params: &BookStackParams) -> Result<BookStackResult> {
    let book = Uniform::new(params.a, params.b)?;
    let dist = Parametric::from(book);
    if params.bins == 0 {
        return Err(EstimatorError::invalid("bin count must be at least 1"));
    }
    let stacks = params
        .stack_sizes
        .iter()
        .map(|&n| -> Result<SumDistribution> {
            if n == 0 {
                return Err(EstimatorError::invalid("stack size must be at least 1"));
            }
            let run = simulate_sums(estimator, &dist, n);
            let nf = f64::from(n);
            let hist = run
                .histogram(nf * params.a, nf * params.b, params.bins)
                .ok_or_else(|| EstimatorError::invalid("empty histogram range"))?;
            let normal = clt_normal(&dist, n)?;
            Ok(sum_distribution(&run, n, &hist, &normal))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(BookStackResult {
        a: params.a,
        b: params.b,
        book_mean: book.mean(),
        book_std_dev: book.std_dev(),
        stacks,
    })
}

// ============================================================================
// Battery carton
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryParams {
    /// Mean battery lifetime β, in days.
    pub mean_life: f64,
    /// Batteries per carton.
    pub carton: u32,
    /// Number of histogram edges; one fewer bins.
    pub edges: usize,
    pub trials: i64,
}

impl Default for BatteryParams {
    fn default() -> Self {
        Self {
            mean_life: 45.0,
            carton: 24,
            edges: 50,
            trials: 10_000,
        }
    }
}

/// Total carton lifetime, binned over `[⌊min − 1⌋, ⌈max + 1⌉]`.
///
/// With zero trials there is no observed range, so the bins span the CLT
/// normal's mean ± 4σ instead, all counts are zero and the moments are
/// `None`.
///
/// # Errors
/// - `Distribution` if `mean_life` is not positive.
/// - `InvalidConfiguration` if the carton is empty or fewer than two
///   edges are requested.
pub fn battery_carton(estimator: &Estimator, params: &BatteryParams) -> Result<SumDistribution> {
    let dist = Parametric::from(Exponential::from_mean(params.mean_life)?);
    if params.carton == 0 {
        return Err(EstimatorError::invalid("carton must hold at least one battery"));
    }
    if params.edges < 2 {
        return Err(EstimatorError::invalid("at least two histogram edges are required"));
    }
    let n = params.carton;
    let normal = clt_normal(&dist, n)?;
    let run = simulate_sums(estimator, &dist, n);
    let summary = run.describe();
    let (lo, hi) = match (summary.min, summary.max) {
        (Some(min), Some(max)) => (min - 1.0, max + 1.0),
        _ => {
            let spread = 4.0 * normal.std_dev();
            (normal.mean() - spread, normal.mean() + spread)
        }
    };
    let hist = run
        .histogram(lo.floor(), hi.ceil(), params.edges - 1)
        .ok_or_else(|| EstimatorError::invalid("empty histogram range"))?;
    Ok(sum_distribution(&run, n, &hist, &normal))
}
