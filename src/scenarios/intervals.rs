//! Confidence-interval exercises built on [`crate::confidence`].

use serde::{Deserialize, Serialize};

use crate::confidence::{self, Coverage, Method, SweepPoint};
use crate::error::Result;
use crate::estimator::Estimator;
use crate::random;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepParams {
    pub mu: f64,
    pub sigma: f64,
    pub max_n: u64,
    pub levels: Vec<f64>,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            mu: 100.0,
            sigma: 12.0,
            max_n: 200,
            levels: vec![0.95, 0.99],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub mu: f64,
    pub sigma: f64,
    pub levels: Vec<f64>,
    pub points: Vec<SweepPoint>,
    /// Per level, the fraction of sample means inside the interval.
    pub inside_fraction: Vec<Option<f64>>,
}

/// Sample means for `n = 1..=max_n` against the z bands around μ. Uses a
/// single generator seeded with the run seed; the worker count does not
/// apply.
pub fn sample_size_confidence(estimator: &Estimator, params: &SweepParams) -> Result<SweepResult> {
    let mut rng = random::create_rng(estimator.config().seed);
    let points = confidence::sample_size_sweep(
        params.mu,
        params.sigma,
        params.max_n,
        &params.levels,
        &mut rng,
    )?;
    let levels: Vec<f64> = points
        .first()
        .map(|p| p.intervals.iter().map(|li| li.level).collect())
        .unwrap_or_default();
    let inside_fraction = (0..levels.len())
        .map(|i| {
            if points.is_empty() {
                return None;
            }
            let inside = points
                .iter()
                .filter(|p| p.intervals[i].contains_sample_mean)
                .count();
            Some(inside as f64 / points.len() as f64)
        })
        .collect();
    Ok(SweepResult {
        mu: params.mu,
        sigma: params.sigma,
        levels,
        points,
        inside_fraction,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageParams {
    pub mu: f64,
    pub sigma: f64,
    /// Sample size per interval.
    pub n: u64,
    pub level: f64,
    pub method: Method,
    pub trials: i64,
}

impl Default for CoverageParams {
    fn default() -> Self {
        Self {
            mu: 100.0,
            sigma: 12.0,
            n: 5,
            level: 0.95,
            method: Method::T,
            trials: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageResult {
    pub method: Method,
    pub level: f64,
    pub n: u64,
    pub critical_value: Option<f64>,
    pub trials: u64,
    pub covered: u64,
    pub missed: u64,
    pub coverage: Option<f64>,
}

pub fn interval_coverage(estimator: &Estimator, params: &CoverageParams) -> Result<CoverageResult> {
    let estimate = confidence::coverage(
        estimator,
        params.mu,
        params.sigma,
        params.n,
        params.level,
        params.method,
    )?;
    Ok(CoverageResult {
        method: params.method,
        level: params.level,
        n: params.n,
        critical_value: confidence::critical_value(params.level, params.method, params.n),
        trials: estimate.included(),
        covered: estimate.count(&Coverage::Covered),
        missed: estimate.count(&Coverage::Missed),
        coverage: estimate.probability(&Coverage::Covered),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::EstimatorConfig;

    fn estimator(trials: u64) -> Estimator {
        Estimator::new(EstimatorConfig {
            trials,
            seed: 5,
            workers: 2,
        })
        .unwrap()
    }

    #[test]
    fn test_sweep_defaults() {
        let result = sample_size_confidence(&estimator(0), &SweepParams::default()).unwrap();
        assert_eq!(result.points.len(), 200);
        assert_eq!(result.levels, vec![0.95, 0.99]);
        let f95 = result.inside_fraction[0].unwrap();
        let f99 = result.inside_fraction[1].unwrap();
        assert!(f99 >= f95);
        assert!(f95 > 0.85);
    }

    #[test]
    fn test_sweep_deterministic() {
        let a = sample_size_confidence(&estimator(0), &SweepParams::default()).unwrap();
        let b = sample_size_confidence(&estimator(0), &SweepParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sweep_empty() {
        let params = SweepParams {
            max_n: 0,
            ..SweepParams::default()
        };
        let result = sample_size_confidence(&estimator(0), &params).unwrap();
        assert!(result.points.is_empty());
        assert!(result.levels.is_empty());
    }

    #[test]
    fn test_coverage_result() {
        let result = interval_coverage(&estimator(6_000), &CoverageParams::default()).unwrap();
        assert_eq!(result.covered + result.missed, 6_000);
        assert!((result.coverage.unwrap() - 0.95).abs() < 0.02);
        assert!((result.critical_value.unwrap() - 2.776).abs() < 1e-3);
    }
}
