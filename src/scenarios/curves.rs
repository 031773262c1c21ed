//! PDF and CDF tables.
//!
//! - [`discrete_uniform`]: empirical PMF and running CDF of pseudo-random
//!   integers, next to the exact values.
//! - [`uniform_curve`]: closed-form `U(a, b)` density and distribution on
//!   an integer grid one step past each end.
//! - [`gaussian_curves`]: closed-form normal PDF/CDF for several
//!   `(μ, σ²)` pairs, plus a spot check of the CDF against the erf form
//!   `½ + ½·erf((x − μ)/√(2σ²))` and published reference values.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::distributions::{DiscreteUniform, Normal, Uniform};
use crate::error::{EstimatorError, Result};
use crate::estimator::{Estimator, TrialOutcome};
use crate::special::erf;

/// One grid point of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub x: f64,
    pub pdf: f64,
    pub cdf: f64,
}

/// Largest number of integer grid points a curve table may hold.
pub const MAX_GRID_POINTS: u64 = 100_000;

/// Checks that `start..=end` holds at most [`MAX_GRID_POINTS`] points. An
/// empty grid (`start > end`) is allowed.
fn checked_grid(start: i64, end: i64) -> Result<RangeInclusive<i64>> {
    let points = (i128::from(end) - i128::from(start) + 1).max(0);
    if points > i128::from(MAX_GRID_POINTS) {
        return Err(EstimatorError::invalid(format!(
            "grid {start}..={end} has {points} points, more than {MAX_GRID_POINTS}"
        )));
    }
    Ok(start..=end)
}

/// Integer value of an already rounded bound, if it fits in `i64`.
fn grid_bound(x: f64) -> Result<i64> {
    // 2^63 itself is out of range
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if (-LIMIT..LIMIT).contains(&x) {
        Ok(x as i64)
    } else {
        Err(EstimatorError::invalid(format!("grid bound {x} is out of range")))
    }
}

/// PDF and CDF of `curve` at each grid point.
fn tabulate<F>(grid: RangeInclusive<i64>, curve: F) -> Vec<CurvePoint>
where
    F: Fn(f64) -> (f64, f64),
{
    grid.map(|x| {
        let x = x as f64;
        let (pdf, cdf) = curve(x);
        CurvePoint { x, pdf, cdf }
    })
    .collect()
}

/// Curve tabulated over a grid, with a label describing its parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveTable {
    pub label: String,
    pub points: Vec<CurvePoint>,
}

// ============================================================================
// Discrete uniform
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscreteUniformParams {
    pub low: i64,
    pub high: i64,
    pub trials: i64,
}

impl Default for DiscreteUniformParams {
    fn default() -> Self {
        Self {
            low: 1,
            high: 10,
            trials: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PmfRow {
    pub value: i64,
    pub count: u64,
    pub pmf: Option<f64>,
    pub cdf: Option<f64>,
    pub exact_pmf: f64,
    pub exact_cdf: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscreteUniformResult {
    pub low: i64,
    pub high: i64,
    pub trials: u64,
    /// One row per value in `low..=high`, including values never drawn.
    pub rows: Vec<PmfRow>,
}

/// Draws one integer uniformly from `low..=high` per trial.
///
/// # Errors
/// - `Distribution` if `low > high`.
/// - `InvalidConfiguration` if the range holds more than
///   [`MAX_GRID_POINTS`] values.
pub fn discrete_uniform(
    estimator: &Estimator,
    params: &DiscreteUniformParams,
) -> Result<DiscreteUniformResult> {
    let dist = DiscreteUniform::new(params.low, params.high)?;
    let values = checked_grid(params.low, params.high)?;
    let estimate = estimator.run(|rng| TrialOutcome::single(dist.sample(rng)));
    let mut running = 0.0;
    let rows = values
        .map(|value| {
            let pmf = estimate.probability(&value);
            if let Some(p) = pmf {
                running += p;
            }
            PmfRow {
                value,
                count: estimate.count(&value),
                pmf,
                cdf: pmf.map(|_| running),
                exact_pmf: dist.pmf(value),
                exact_cdf: dist.cdf(value),
            }
        })
        .collect();
    Ok(DiscreteUniformResult {
        low: params.low,
        high: params.high,
        trials: estimate.included(),
        rows,
    })
}

// ============================================================================
// Continuous uniform
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UniformCurveParams {
    pub a: f64,
    pub b: f64,
}

impl Default for UniformCurveParams {
    fn default() -> Self {
        Self { a: 1.0, b: 10.0 }
    }
}

/// `U(a, b)` PDF and CDF at `x = ⌊a⌋ − 1, ⌊a⌋, ..., ⌈b⌉ + 1`.
///
/// # Errors
/// - `Distribution` if `a >= b`.
/// - `InvalidConfiguration` if the grid would hold more than
///   [`MAX_GRID_POINTS`] points.
pub fn uniform_curve(params: &UniformCurveParams) -> Result<CurveTable> {
    let dist = Uniform::new(params.a, params.b)?;
    let out_of_range = || EstimatorError::invalid("uniform grid bound is out of range");
    let start = grid_bound(params.a.floor())?
        .checked_sub(1)
        .ok_or_else(out_of_range)?;
    let end = grid_bound(params.b.ceil())?
        .checked_add(1)
        .ok_or_else(out_of_range)?;
    let points = tabulate(checked_grid(start, end)?, |x| (dist.pdf(x), dist.cdf(x)));
    Ok(CurveTable {
        label: format!("U({}, {})", params.a, params.b),
        points,
    })
}

// ============================================================================
// Gaussian
// ============================================================================

/// One `(μ, σ²)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanVariance {
    pub mu: f64,
    pub variance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GaussianParams {
    pub curves: Vec<MeanVariance>,
    pub start: i64,
    pub end: i64,
}

impl Default for GaussianParams {
    fn default() -> Self {
        let mv = |mu, variance| MeanVariance { mu, variance };
        Self {
            curves: vec![
                mv(0.0, 1.0),
                mv(0.0, 0.1),
                mv(0.0, 0.01),
                mv(-3.0, 1.0),
                mv(-3.0, 0.1),
                mv(-3.0, 0.01),
            ],
            start: -6,
            end: 6,
        }
    }
}

/// Standard normal PDF and CDF at `x = 1`, to 16 significant digits.
pub const REFERENCE_PDF_AT_1: f64 = 0.241_970_724_519_143_37;
pub const REFERENCE_CDF_AT_1: f64 = 0.841_344_746_068_542_9;

/// Standard normal at `x = 1`, computed three ways.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verification {
    pub x: f64,
    pub pdf: f64,
    pub pdf_reference: f64,
    pub cdf: f64,
    /// `½ + ½·erf(x/√2)`.
    pub cdf_erf: f64,
    pub cdf_reference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaussianResult {
    pub curves: Vec<CurveTable>,
    pub verification: Verification,
}

/// Normal CDF through the error function.
pub fn normal_cdf_erf(x: f64, mu: f64, variance: f64) -> f64 {
    0.5 + 0.5 * erf((x - mu) / (2.0 * variance).sqrt())
}

/// Normal PDF and CDF on the integer grid `start..=end` for each
/// `(μ, σ²)` pair.
///
/// # Errors
/// - `Distribution` if any variance is not positive.
/// - `InvalidConfiguration` if the grid holds more than
///   [`MAX_GRID_POINTS`] points.
pub fn gaussian_curves(params: &GaussianParams) -> Result<GaussianResult> {
    let grid = checked_grid(params.start, params.end)?;
    let curves = params
        .curves
        .iter()
        .map(|mv| -> Result<CurveTable> {
            let dist = Normal::from_variance(mv.mu, mv.variance)?;
            let points = tabulate(grid.clone(), |x| (dist.pdf(x), dist.cdf(x)));
            Ok(CurveTable {
                label: format!("mu={}, var={}", mv.mu, mv.variance),
                points,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let standard = Normal::standard();
    let verification = Verification {
        x: 1.0,
        pdf: standard.pdf(1.0),
        pdf_reference: REFERENCE_PDF_AT_1,
        cdf: standard.cdf(1.0),
        cdf_erf: normal_cdf_erf(1.0, 0.0, 1.0),
        cdf_reference: REFERENCE_CDF_AT_1,
    };
    Ok(GaussianResult {
        curves,
        verification,
    })
}
