//! Confidence intervals for a mean.
//!
//! Two methods are supported:
//!
//! - **z**: known population standard deviation σ, interval
//!   `x̄ ± z·σ/√n` with `z = Φ⁻¹((1 + level)/2)`.
//! - **t**: σ estimated by the sample standard deviation s, interval
//!   `x̄ ± t·s/√n` with `t` the Student-t quantile on `n − 1` degrees of
//!   freedom.
//!
//! Critical values come from the general quantile functions in
//! [`special`](crate::special), so any level in `(0, 1)` works; the common
//! textbook values (1.645, 1.96, 2.576, ...) fall out as special cases.
//!
//! [`coverage`] checks the construction empirically: it draws many samples
//! from a known normal population and counts how often the interval
//! contains the true mean.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::distributions::{Normal, Parametric};
use crate::error::{EstimatorError, Result};
use crate::estimator::{Estimate, Estimator, TrialOutcome};
use crate::special::{inverse_normal_cdf, t_distribution_quantile};
use crate::stats;

/// How the critical value is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Standard normal quantile; σ known.
    Z,
    /// Student-t quantile with `n − 1` degrees of freedom; σ estimated.
    T,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Z => f.write_str("z"),
            Method::T => f.write_str("t"),
        }
    }
}

/// Closed interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    /// Symmetric interval `center ± half_width`.
    pub fn around(center: f64, half_width: f64) -> Self {
        Self {
            lower: center - half_width,
            upper: center + half_width,
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn center(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// Two-sided critical value for a confidence `level`.
///
/// # Returns
/// - `None` if `level` is not in `(0, 1)`, or for [`Method::T`] if
///   `n < 2`.
///
/// # Examples
/// ```
/// use probsim::confidence::{critical_value, Method};
/// let z = critical_value(0.95, Method::Z, 1).unwrap();
/// assert!((z - 1.96).abs() < 1e-3);
/// let t = critical_value(0.95, Method::T, 5).unwrap();
/// assert!((t - 2.776).abs() < 1e-3);
/// ```
pub fn critical_value(level: f64, method: Method, n: u64) -> Option<f64> {
    if !(level > 0.0 && level < 1.0) {
        return None;
    }
    let p = (1.0 + level) / 2.0;
    match method {
        Method::Z => Some(inverse_normal_cdf(p)),
        Method::T if n >= 2 => Some(t_distribution_quantile(p, (n - 1) as f64)),
        Method::T => None,
    }
}

/// z interval `mean ± z·σ/√n` with σ known.
///
/// # Returns
/// - `None` if `n == 0`, `sigma` is negative or not finite, or `level`
///   is not in `(0, 1)`.
pub fn z_interval(mean: f64, sigma: f64, n: u64, level: f64) -> Option<Interval> {
    if n == 0 || !sigma.is_finite() || sigma < 0.0 {
        return None;
    }
    let z = critical_value(level, Method::Z, n)?;
    Some(Interval::around(mean, z * sigma / (n as f64).sqrt()))
}

/// t interval from a sample, with σ estimated by the sample standard
/// deviation.
///
/// # Returns
/// - `None` if the sample has fewer than 2 values, contains NaN/Inf, or
///   `level` is not in `(0, 1)`.
pub fn t_interval(sample: &[f64], level: f64) -> Option<Interval> {
    let n = sample.len() as u64;
    let mean = stats::mean(sample)?;
    let s = stats::std_dev(sample)?;
    let t = critical_value(level, Method::T, n)?;
    Some(Interval::around(mean, t * s / (n as f64).sqrt()))
}

/// Interval for `sample` with the given method. For [`Method::Z`],
/// `sigma` is the known population standard deviation.
pub fn interval(sample: &[f64], sigma: f64, level: f64, method: Method) -> Option<Interval> {
    match method {
        Method::Z => z_interval(stats::mean(sample)?, sigma, sample.len() as u64, level),
        Method::T => t_interval(sample, level),
    }
}

// ============================================================================
// Sample-size sweep
// ============================================================================

/// z interval around the true mean at one confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelInterval {
    pub level: f64,
    pub interval: Interval,
    /// Whether the sample mean fell inside the interval.
    pub contains_sample_mean: bool,
}

/// Sample mean for one sample size, with the z intervals around μ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub n: u64,
    pub sample_mean: f64,
    pub intervals: Vec<LevelInterval>,
}

/// For each `n` in `1..=max_n`, draws `n` values from `N(mu, sigma)`,
/// records their mean, and the z intervals around `mu` at each level.
///
/// Shows the intervals narrowing as `1/√n` while the sample means
/// scatter inside them. Levels outside `(0, 1)` are skipped.
///
/// # Errors
/// `Distribution` if `sigma` is not positive.
pub fn sample_size_sweep<R: Rng>(
    mu: f64,
    sigma: f64,
    max_n: u64,
    levels: &[f64],
    rng: &mut R,
) -> Result<Vec<SweepPoint>> {
    let dist = Normal::new(mu, sigma)?;
    let mut points = Vec::with_capacity(max_n as usize);
    let mut draws = Vec::with_capacity(max_n as usize);
    for n in 1..=max_n {
        draws.clear();
        draws.extend((0..n).map(|_| dist.sample(rng)));
        let sample_mean = stats::kahan_sum(&draws) / n as f64;
        let intervals = levels
            .iter()
            .filter_map(|&level| {
                z_interval(mu, sigma, n, level).map(|interval| LevelInterval {
                    level,
                    interval,
                    contains_sample_mean: interval.contains(sample_mean),
                })
            })
            .collect();
        points.push(SweepPoint {
            n,
            sample_mean,
            intervals,
        });
    }
    Ok(points)
}

// ============================================================================
// Coverage simulation
// ============================================================================

/// Whether an interval contained the true mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Coverage {
    Covered,
    Missed,
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coverage::Covered => f.write_str("covered"),
            Coverage::Missed => f.write_str("missed"),
        }
    }
}

/// Monte-Carlo coverage of the interval construction: each trial draws
/// `n` values from `N(mu, sigma)`, builds an interval and checks whether
/// it contains `mu`.
///
/// `P(Covered)` should be close to `level`.
///
/// # Errors
/// - `InvalidConfiguration` if `level` is not in `(0, 1)`, `n == 0`, or
///   `n < 2` with [`Method::T`].
/// - `Distribution` if `sigma` is not positive.
pub fn coverage(
    estimator: &Estimator,
    mu: f64,
    sigma: f64,
    n: u64,
    level: f64,
    method: Method,
) -> Result<Estimate<Coverage>> {
    let dist = Parametric::from(Normal::new(mu, sigma)?);
    if n == 0 {
        return Err(EstimatorError::invalid("sample size must be at least 1"));
    }
    if critical_value(level, method, n).is_none() {
        return Err(EstimatorError::invalid(format!(
            "no {method} critical value for level {level} and sample size {n}"
        )));
    }
    Ok(estimator.run(|rng| {
        let mut sample = vec![0.0; n as usize];
        dist.fill(&mut sample, rng);
        let covered = interval(&sample, sigma, level, method).is_some_and(|ci| ci.contains(mu));
        TrialOutcome::single(if covered {
            Coverage::Covered
        } else {
            Coverage::Missed
        })
    }))
}
