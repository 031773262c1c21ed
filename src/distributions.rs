//! Parametric generators for the continuous and integer exercises.
//!
//! Each type validates its parameters once, then offers closed-form
//! moments, density, CDF, quantile and a sampler.
//!
//! | Type | Parameters | Mean | Variance |
//! |---|---|---|---|
//! | [`Uniform`] | `[a, b]` | (a+b)/2 | (b−a)²/12 |
//! | [`DiscreteUniform`] | integers `a..=b` | (a+b)/2 | ((b−a+1)²−1)/12 |
//! | [`Normal`] | μ, σ | μ | σ² |
//! | [`Exponential`] | rate λ | 1/λ | 1/λ² |
//!
//! [`Parametric`] wraps the continuous ones as a population descriptor
//! for the estimator: samples are drawn straight from the generator, no
//! population is materialised.

use rand::Rng;
use rand_distr::{Exp1, StandardNormal};
use serde::Serialize;

use crate::special;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DistributionError {
    #[error("invalid distribution parameters: {0}")]
    InvalidParameters(String),
}

// ============================================================================
// Uniform
// ============================================================================

/// Flat density on `[min, max]`, e.g. the thickness of one book in the
/// stack exercise.
///
/// ```
/// use probsim::distributions::Uniform;
/// let book = Uniform::new(1.0, 3.0).unwrap();
/// assert_eq!(book.mean(), 2.0);
/// assert_eq!(book.pdf(2.5), 0.5);
/// assert_eq!(book.cdf(1.5), 0.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Uniform {
    min: f64,
    max: f64,
}

impl Uniform {
    /// # Errors
    /// `InvalidParameters` unless both bounds are finite and `min < max`.
    pub fn new(min: f64, max: f64) -> Result<Self, DistributionError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(DistributionError::InvalidParameters(format!(
                "Uniform requires min < max, got min={min}, max={max}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn variance(&self) -> f64 {
        let range = self.max - self.min;
        range * range / 12.0
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Fraction of the interval below `x`.
    pub fn cdf(&self, x: f64) -> f64 {
        if x <= self.min {
            0.0
        } else if x >= self.max {
            1.0
        } else {
            (x - self.min) / (self.max - self.min)
        }
    }

    /// `min + p·(max − min)`; `None` for `p` outside `[0, 1]`.
    pub fn quantile(&self, p: f64) -> Option<f64> {
        if !(0.0..=1.0).contains(&p) {
            return None;
        }
        Some(self.min + p * (self.max - self.min))
    }

    /// `1/(max − min)` inside the closed interval, zero outside.
    pub fn pdf(&self, x: f64) -> f64 {
        if x >= self.min && x <= self.max {
            1.0 / (self.max - self.min)
        } else {
            0.0
        }
    }

    /// Draws one value from `[min, max)`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.random_range(self.min..self.max)
    }
}

// ============================================================================
// Discrete uniform
// ============================================================================

/// Discrete uniform distribution over the integers `low..=high`.
///
/// Each of the `high − low + 1` values has probability `1/(high−low+1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiscreteUniform {
    low: i64,
    high: i64,
}

impl DiscreteUniform {
    /// # Errors
    /// Returns `Err` if `low > high`.
    pub fn new(low: i64, high: i64) -> Result<Self, DistributionError> {
        if low > high {
            return Err(DistributionError::InvalidParameters(format!(
                "DiscreteUniform requires low ≤ high, got low={low}, high={high}"
            )));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> i64 {
        self.low
    }

    pub fn high(&self) -> i64 {
        self.high
    }

    /// Number of support points.
    pub fn len(&self) -> u64 {
        (self.high - self.low) as u64 + 1
    }

    /// Always `false`: the support holds at least one point.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn mean(&self) -> f64 {
        (self.low as f64 + self.high as f64) / 2.0
    }

    pub fn variance(&self) -> f64 {
        let n = self.len() as f64;
        (n * n - 1.0) / 12.0
    }

    /// PMF: 1/n on the support, 0 elsewhere.
    pub fn pmf(&self, x: i64) -> f64 {
        if (self.low..=self.high).contains(&x) {
            1.0 / self.len() as f64
        } else {
            0.0
        }
    }

    /// CDF: (⌊x⌋ − low + 1)/n, clamped to [0, 1].
    pub fn cdf(&self, x: i64) -> f64 {
        if x < self.low {
            0.0
        } else if x >= self.high {
            1.0
        } else {
            (x - self.low + 1) as f64 / self.len() as f64
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> i64 {
        rng.random_range(self.low..=self.high)
    }
}

// ============================================================================
// Normal
// ============================================================================

/// Gaussian with mean μ and standard deviation σ. The density and CDF go
/// through the standardised value `z = (x − μ)/σ`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Normal {
    mu: f64,
    sigma: f64,
}

impl Normal {
    /// # Errors
    /// `InvalidParameters` unless μ is finite and σ is finite and positive.
    pub fn new(mu: f64, sigma: f64) -> Result<Self, DistributionError> {
        if !mu.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
            return Err(DistributionError::InvalidParameters(format!(
                "Normal requires finite μ and σ > 0, got μ={mu}, σ={sigma}"
            )));
        }
        Ok(Self { mu, sigma })
    }

    /// Same as [`new`](Self::new) but parameterised by σ², the way the
    /// curve tables list them.
    pub fn from_variance(mu: f64, variance: f64) -> Result<Self, DistributionError> {
        if !variance.is_finite() || variance <= 0.0 {
            return Err(DistributionError::InvalidParameters(format!(
                "Normal requires variance > 0, got {variance}"
            )));
        }
        Self::new(mu, variance.sqrt())
    }

    /// N(0, 1).
    pub fn standard() -> Self {
        Self {
            mu: 0.0,
            sigma: 1.0,
        }
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn mean(&self) -> f64 {
        self.mu
    }

    pub fn variance(&self) -> f64 {
        self.sigma * self.sigma
    }

    pub fn std_dev(&self) -> f64 {
        self.sigma
    }

    pub fn pdf(&self, x: f64) -> f64 {
        let z = (x - self.mu) / self.sigma;
        special::standard_normal_pdf(z) / self.sigma
    }

    pub fn cdf(&self, x: f64) -> f64 {
        let z = (x - self.mu) / self.sigma;
        special::standard_normal_cdf(z)
    }

    /// `μ + σ·Φ⁻¹(p)`, defined on the open interval `(0, 1)`.
    pub fn quantile(&self, p: f64) -> Option<f64> {
        if p <= 0.0 || p >= 1.0 {
            return None;
        }
        Some(self.mu + self.sigma * special::inverse_normal_cdf(p))
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        self.mu + self.sigma * z
    }
}

// ============================================================================
// Exponential
// ============================================================================

/// Waiting-time distribution with rate λ, supported on `x ≥ 0`. The
/// battery exercise specifies it by its mean life β = 1/λ.
///
/// ```
/// use probsim::distributions::Exponential;
/// let battery = Exponential::from_mean(45.0).unwrap();
/// assert!((battery.std_dev() - 45.0).abs() < 1e-12);
/// assert!((battery.cdf(45.0) - (1.0 - (-1.0_f64).exp())).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Exponential {
    rate: f64,
}

impl Exponential {
    /// # Errors
    /// `InvalidParameters` unless `rate` is finite and positive.
    pub fn new(rate: f64) -> Result<Self, DistributionError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(DistributionError::InvalidParameters(format!(
                "Exponential requires rate > 0, got {rate}"
            )));
        }
        Ok(Self { rate })
    }

    /// Rate `1/mean`; the mean must be finite and positive.
    pub fn from_mean(mean: f64) -> Result<Self, DistributionError> {
        if !mean.is_finite() || mean <= 0.0 {
            return Err(DistributionError::InvalidParameters(format!(
                "Exponential requires mean > 0, got {mean}"
            )));
        }
        Self::new(1.0 / mean)
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn mean(&self) -> f64 {
        1.0 / self.rate
    }

    pub fn variance(&self) -> f64 {
        1.0 / (self.rate * self.rate)
    }

    pub fn std_dev(&self) -> f64 {
        1.0 / self.rate
    }

    pub fn pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            0.0
        } else {
            self.rate * (-self.rate * x).exp()
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            0.0
        } else {
            -(-self.rate * x).exp_m1()
        }
    }

    /// Inverse CDF: −ln(1−p)/λ.
    ///
    /// Returns `None` if `p` is outside `[0, 1)`.
    pub fn quantile(&self, p: f64) -> Option<f64> {
        if !(0.0..1.0).contains(&p) {
            return None;
        }
        Some(-(-p).ln_1p() / self.rate)
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let e: f64 = rng.sample(Exp1);
        e / self.rate
    }
}

// ============================================================================
// Parametric population descriptor
// ============================================================================

/// A continuous generator used as an estimator population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Parametric {
    Uniform(Uniform),
    Normal(Normal),
    Exponential(Exponential),
}

impl Parametric {
    pub fn mean(&self) -> f64 {
        match self {
            Parametric::Uniform(d) => d.mean(),
            Parametric::Normal(d) => d.mean(),
            Parametric::Exponential(d) => d.mean(),
        }
    }

    pub fn variance(&self) -> f64 {
        match self {
            Parametric::Uniform(d) => d.variance(),
            Parametric::Normal(d) => d.variance(),
            Parametric::Exponential(d) => d.variance(),
        }
    }

    pub fn pdf(&self, x: f64) -> f64 {
        match self {
            Parametric::Uniform(d) => d.pdf(x),
            Parametric::Normal(d) => d.pdf(x),
            Parametric::Exponential(d) => d.pdf(x),
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        match self {
            Parametric::Uniform(d) => d.cdf(x),
            Parametric::Normal(d) => d.cdf(x),
            Parametric::Exponential(d) => d.cdf(x),
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match self {
            Parametric::Uniform(d) => d.sample(rng),
            Parametric::Normal(d) => d.sample(rng),
            Parametric::Exponential(d) => d.sample(rng),
        }
    }

    /// Fills `out` with independent draws.
    pub fn fill<R: Rng>(&self, out: &mut [f64], rng: &mut R) {
        for slot in out.iter_mut() {
            *slot = self.sample(rng);
        }
    }
}

impl From<Uniform> for Parametric {
    fn from(d: Uniform) -> Self {
        Parametric::Uniform(d)
    }
}

impl From<Normal> for Parametric {
    fn from(d: Normal) -> Self {
        Parametric::Normal(d)
    }
}

impl From<Exponential> for Parametric {
    fn from(d: Exponential) -> Self {
        Parametric::Exponential(d)
    }
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn uniform_cdf_in_01(
            min in -100.0_f64..0.0,
            max in 1.0_f64..100.0,
            x in -200.0_f64..200.0,
        ) {
            let u = Uniform::new(min, max).unwrap();
            let c = u.cdf(x);
            prop_assert!((0.0..=1.0).contains(&c));
        }

        #[test]
        fn uniform_quantile_roundtrip(
            min in -100.0_f64..0.0,
            max in 1.0_f64..100.0,
            p in 0.0_f64..=1.0,
        ) {
            let u = Uniform::new(min, max).unwrap();
            let x = u.quantile(p).unwrap();
            let p_back = u.cdf(x);
            prop_assert!((p_back - p).abs() < 1e-12, "roundtrip: p={p} -> x={x} -> p_back={p_back}");
        }

        #[test]
        fn normal_cdf_monotonic(
            mu in -50.0_f64..50.0,
            sigma in 0.01_f64..20.0,
            x1 in -100.0_f64..100.0,
            x2 in -100.0_f64..100.0,
        ) {
            let n = Normal::new(mu, sigma).unwrap();
            let (lo, hi) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
            prop_assert!(n.cdf(lo) <= n.cdf(hi) + 1e-15);
        }

        #[test]
        fn exponential_quantile_roundtrip(
            rate in 0.001_f64..100.0,
            p in 0.0_f64..0.999,
        ) {
            let e = Exponential::new(rate).unwrap();
            let x = e.quantile(p).unwrap();
            prop_assert!((e.cdf(x) - p).abs() < 1e-9);
        }

        #[test]
        fn discrete_uniform_sample_in_support(
            low in -50_i64..50,
            span in 0_i64..100,
            seed in 0_u64..1000,
        ) {
            let d = DiscreteUniform::new(low, low + span).unwrap();
            let mut rng = crate::random::create_rng(seed);
            let x = d.sample(&mut rng);
            prop_assert!(x >= low && x <= low + span);
        }
    }
}
