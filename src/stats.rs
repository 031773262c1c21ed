//! Descriptive statistics for simulated values.
//!
//! Used to summarise per-trial statistics (stack heights, carton
//! lifetimes, sample means) and to check them against theory.
//!
//! - [`kahan_sum`] and [`mean`] use Neumaier's compensated summation, so
//!   the error does not grow with the number of trials.
//! - [`WelfordAccumulator`] keeps the first four central moments in one
//!   pass and merges across estimator partitions (Welford 1962; Pébay
//!   2008 for M₃/M₄).
//! - [`Histogram`] bins values on fixed edges the way NumPy does and
//!   normalises bar areas to 1.
//!
//! Every function returns `None` rather than a number it cannot stand
//! behind: empty input, too few values for the moment, or non-finite data.

use serde::Serialize;

/// Arithmetic mean; `None` for empty input or any non-finite value.
///
/// ```
/// use probsim::stats::mean;
/// // Expected thickness of a book drawn from U(1, 3)
/// assert_eq!(mean(&[1.0, 1.5, 2.0, 2.5, 3.0]), Some(2.0));
/// ```
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() || data.iter().any(|x| !x.is_finite()) {
        return None;
    }
    Some(kahan_sum(data) / data.len() as f64)
}

/// Sample variance with the `n − 1` denominator.
///
/// `None` for fewer than two values or any non-finite value.
///
/// ```
/// use probsim::stats::variance;
/// assert_eq!(variance(&[1.0, 3.0]), Some(2.0));
/// ```
pub fn variance(data: &[f64]) -> Option<f64> {
    if data.len() < 2 || data.iter().any(|x| !x.is_finite()) {
        return None;
    }
    let mut acc = WelfordAccumulator::new();
    data.iter().for_each(|&x| acc.update(x));
    acc.sample_variance()
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    variance(data).map(f64::sqrt)
}

/// Smallest value; `None` for empty input or if any value is NaN.
pub fn min(data: &[f64]) -> Option<f64> {
    extreme(data, f64::INFINITY, f64::min)
}

/// Largest value; `None` for empty input or if any value is NaN.
pub fn max(data: &[f64]) -> Option<f64> {
    extreme(data, f64::NEG_INFINITY, f64::max)
}

fn extreme(data: &[f64], start: f64, pick: fn(f64, f64) -> f64) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    data.iter()
        .try_fold(start, |acc, &x| (!x.is_nan()).then(|| pick(acc, x)))
}

// ---------------------------------------------------------------------------
// Compensated summation
// ---------------------------------------------------------------------------

/// Neumaier's variant of Kahan summation: the compensation term also
/// catches addends larger than the running sum.
pub fn kahan_sum(data: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut lost = 0.0_f64;
    for &x in data {
        let next = sum + x;
        lost += if sum.abs() >= x.abs() {
            (sum - next) + x
        } else {
            (x - next) + sum
        };
        sum = next;
    }
    sum + lost
}

// ---------------------------------------------------------------------------
// Streaming moments
// ---------------------------------------------------------------------------

/// One-pass mean, variance, skewness and excess kurtosis.
///
/// Each estimator partition feeds its own accumulator; the partitions are
/// then folded together with [`merge`](Self::merge), which gives the same
/// moments as a single sequential pass up to rounding.
///
/// ```
/// use probsim::stats::WelfordAccumulator;
/// let mut left = WelfordAccumulator::new();
/// let mut right = WelfordAccumulator::new();
/// [2.0, 4.0, 4.0, 4.0].iter().for_each(|&x| left.update(x));
/// [5.0, 5.0, 7.0, 9.0].iter().for_each(|&x| right.update(x));
/// left.merge(&right);
/// assert_eq!(left.count(), 8);
/// assert!((left.mean().unwrap() - 5.0).abs() < 1e-15);
/// assert!((left.sample_variance().unwrap() - 32.0 / 7.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct WelfordAccumulator {
    count: u64,
    mean_acc: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl WelfordAccumulator {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean_acc: 0.0,
            m2: 0.0,
            m3: 0.0,
            m4: 0.0,
        }
    }

    /// Adds one value. The higher moments are updated first because each
    /// one needs the old values of the lower ones.
    pub fn update(&mut self, value: f64) {
        let prev = self.count;
        self.count += 1;
        if prev == 0 {
            self.mean_acc = value;
            return;
        }

        let n = self.count as f64;
        let delta = value - self.mean_acc;
        let delta_n = delta / n;
        let delta_n2 = delta_n * delta_n;
        let term1 = delta * delta_n * prev as f64;

        self.m4 += term1 * delta_n2 * (n * n - 3.0 * n + 3.0) + 6.0 * delta_n2 * self.m2
            - 4.0 * delta_n * self.m3;
        self.m3 += term1 * delta_n * (n - 2.0) - 3.0 * delta_n * self.m2;
        self.m2 += term1;
        self.mean_acc += delta_n;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean_acc)
    }

    /// `n − 1` denominator; needs two values.
    pub fn sample_variance(&self) -> Option<f64> {
        (self.count >= 2).then(|| self.m2 / (self.count - 1) as f64)
    }

    pub fn sample_std_dev(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }

    /// Adjusted skewness G₁. Needs three values and a non-zero spread.
    pub fn skewness(&self) -> Option<f64> {
        if self.count < 3 || self.m2 == 0.0 {
            return None;
        }
        let n = self.count as f64;
        let g1 = n.sqrt() * self.m3 / self.m2.powf(1.5);
        Some(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
    }

    /// Bias-corrected excess kurtosis G₂, zero for a normal sample. Needs
    /// four values and a non-zero spread.
    pub fn kurtosis(&self) -> Option<f64> {
        if self.count < 4 || self.m2 == 0.0 {
            return None;
        }
        let n = self.count as f64;
        let g2 = n * self.m4 / (self.m2 * self.m2) - 3.0;
        Some((n - 1.0) / ((n - 2.0) * (n - 3.0)) * ((n + 1.0) * g2 + 6.0))
    }

    /// Folds `other` into `self` (Chan et al. pairwise update, with
    /// Pébay's terms for M₃ and M₄).
    pub fn merge(&mut self, other: &WelfordAccumulator) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }
        let (na, nb) = (self.count as f64, other.count as f64);
        let count = self.count + other.count;
        let n = count as f64;
        let d = other.mean_acc - self.mean_acc;
        let d2 = d * d;

        let m2 = self.m2 + other.m2 + d2 * na * nb / n;
        let m3 = self.m3
            + other.m3
            + d2 * d * na * nb * (na - nb) / (n * n)
            + 3.0 * d * (na * other.m2 - nb * self.m2) / n;
        let m4 = self.m4
            + other.m4
            + d2 * d2 * na * nb * (na * na - na * nb + nb * nb) / (n * n * n)
            + 6.0 * d2 * (na * na * other.m2 + nb * nb * self.m2) / (n * n)
            + 4.0 * d * (na * other.m3 - nb * self.m3) / n;

        self.mean_acc += d * nb / n;
        self.count = count;
        self.m2 = m2;
        self.m3 = m3;
        self.m4 = m4;
    }
}

impl Default for WelfordAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain snapshot of the moments of a data set, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: u64,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    /// Moments from an accumulator, with the extremes taken from `data`.
    pub fn from_parts(acc: &WelfordAccumulator, data: &[f64]) -> Self {
        Self {
            count: acc.count(),
            mean: acc.mean(),
            std_dev: acc.sample_std_dev(),
            skewness: acc.skewness(),
            kurtosis: acc.kurtosis(),
            min: min(data),
            max: max(data),
        }
    }

    pub fn of(data: &[f64]) -> Self {
        let mut acc = WelfordAccumulator::new();
        data.iter().for_each(|&x| acc.update(x));
        Self::from_parts(&acc, data)
    }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Fixed-edge histogram.
///
/// Bins are `[e_i, e_{i+1})` except the last, which is `[e_{n−1}, e_n]`.
/// Values outside `[e_0, e_n]` are tallied separately and excluded from
/// the density normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    edges: Vec<f64>,
    counts: Vec<u64>,
    outside: u64,
}

/// One histogram bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub center: f64,
    pub count: u64,
    pub density: f64,
}

impl Histogram {
    /// Empty histogram with `bins` equal-width bins spanning `[lo, hi]`;
    /// `None` unless `bins > 0` and `lo < hi` are both finite.
    pub fn linspace(lo: f64, hi: f64, bins: usize) -> Option<Self> {
        if bins == 0 || !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return None;
        }
        let step = (hi - lo) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| lo + step * i as f64).collect();
        edges.push(hi);
        Some(Self {
            edges,
            counts: vec![0; bins],
            outside: 0,
        })
    }

    /// Builds the histogram and fills it from `data` in one go.
    pub fn from_data(data: &[f64], lo: f64, hi: f64, bins: usize) -> Option<Self> {
        let mut h = Self::linspace(lo, hi, bins)?;
        data.iter().for_each(|&x| h.add(x));
        Some(h)
    }

    pub fn add(&mut self, x: f64) {
        let n = self.counts.len();
        let lo = self.edges[0];
        let hi = self.edges[n];
        if x.is_nan() || x < lo || x > hi {
            self.outside += 1;
            return;
        }
        // First edge strictly greater than x, minus one; x == hi lands in
        // the last bin.
        let idx = self.edges.partition_point(|&e| e <= x).saturating_sub(1);
        self.counts[idx.min(n - 1)] += 1;
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of values that fell outside the histogram range.
    pub fn outside(&self) -> u64 {
        self.outside
    }

    /// Number of values inside the histogram range.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Density per bin: `count / (total · width)`. All zero when the
    /// histogram is empty.
    pub fn densities(&self) -> Vec<f64> {
        let total = self.total();
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(w, &c)| {
                if total == 0 {
                    0.0
                } else {
                    c as f64 / (total as f64 * (w[1] - w[0]))
                }
            })
            .collect()
    }

    /// Empirical CDF at each bin's upper edge (running sum of
    /// `density · width`).
    pub fn cumulative(&self) -> Vec<f64> {
        let mut running = 0.0;
        self.densities()
            .iter()
            .zip(self.edges.windows(2))
            .map(|(d, w)| {
                running += d * (w[1] - w[0]);
                running
            })
            .collect()
    }

    pub fn bins(&self) -> Vec<HistogramBin> {
        let densities = self.densities();
        self.edges
            .windows(2)
            .zip(self.counts.iter().zip(densities))
            .map(|(w, (&count, density))| HistogramBin {
                lower: w[0],
                upper: w[1],
                center: (w[0] + w[1]) / 2.0,
                count,
                density,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_die_faces() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), Some(3.5));
    }

    #[test]
    fn test_mean_rejects_bad_input() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, f64::NAN]), None);
        assert_eq!(mean(&[f64::NEG_INFINITY, 1.0]), None);
    }

    #[test]
    fn test_variance_of_die_faces() {
        // 35/12 population variance, 3.5 with the n − 1 denominator
        let faces = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert!((variance(&faces).unwrap() - 3.5).abs() < 1e-12);
        assert!((std_dev(&faces).unwrap() - 3.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_variance_needs_two_values() {
        assert_eq!(variance(&[]), None);
        assert_eq!(variance(&[4.0]), None);
        assert_eq!(variance(&[4.0, 4.0]), Some(0.0));
    }

    #[test]
    fn test_variance_survives_large_offset() {
        let v: Vec<f64> = [4.0, 7.0, 13.0, 16.0].iter().map(|x| x + 1e9).collect();
        assert!((variance(&v).unwrap() - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_min_max() {
        let lifetimes = [45.0, 12.5, 80.25, 3.0];
        assert_eq!(min(&lifetimes), Some(3.0));
        assert_eq!(max(&lifetimes), Some(80.25));
        assert_eq!(max(&[]), None);
        assert_eq!(min(&[1.0, f64::NAN]), None);
    }

    #[test]
    fn test_kahan_sum_keeps_small_terms() {
        assert_eq!(kahan_sum(&[1.0, 1e100, 1.0, -1e100]), 2.0);
        let tenths = vec![0.1; 10_000];
        assert!((kahan_sum(&tenths) - 1000.0).abs() < 1e-10);
    }

    #[test]
    fn test_welford_undefined_moments() {
        let mut acc = WelfordAccumulator::default();
        assert_eq!(acc.mean(), None);
        acc.update(2.0);
        assert_eq!(acc.mean(), Some(2.0));
        assert_eq!(acc.sample_variance(), None);
        acc.update(2.0);
        acc.update(2.0);
        acc.update(2.0);
        assert_eq!(acc.skewness(), None);
        assert_eq!(acc.kurtosis(), None);
    }

    #[test]
    fn test_welford_skewness_sign() {
        let mut symmetric = WelfordAccumulator::new();
        [1.0, 2.0, 3.0, 4.0, 5.0].iter().for_each(|&x| symmetric.update(x));
        assert!(symmetric.skewness().unwrap().abs() < 1e-9);

        let mut right_tail = WelfordAccumulator::new();
        [1.0, 1.0, 1.0, 2.0, 10.0].iter().for_each(|&x| right_tail.update(x));
        assert!(right_tail.skewness().unwrap() > 1.0);
    }

    #[test]
    fn test_welford_uniform_grid_kurtosis() {
        let mut acc = WelfordAccumulator::new();
        (0..1000).for_each(|i| acc.update(i as f64));
        assert!((acc.kurtosis().unwrap() + 1.2).abs() < 0.01);
    }

    #[test]
    fn test_welford_merge_with_empty() {
        let mut a = WelfordAccumulator::new();
        let mut b = WelfordAccumulator::new();
        b.update(3.0);
        b.update(5.0);
        a.merge(&b);
        a.merge(&WelfordAccumulator::new());
        assert_eq!(a.count(), 2);
        assert_eq!(a.mean(), Some(4.0));
        assert_eq!(a.sample_variance(), Some(2.0));
    }

    #[test]
    fn test_summary() {
        let s = Summary::of(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(s.count, 6);
        assert_eq!(s.mean, Some(3.5));
        assert_eq!((s.min, s.max), (Some(1.0), Some(6.0)));
        assert!((s.std_dev.unwrap() - 3.5_f64.sqrt()).abs() < 1e-12);
        assert!(s.skewness.unwrap().abs() < 1e-9);

        let empty = Summary::of(&[]);
        assert_eq!(empty.count, 0);
        assert_eq!((empty.mean, empty.min, empty.std_dev), (None, None, None));
    }

    #[test]
    fn test_histogram_edges_and_outside() {
        let mut h = Histogram::linspace(0.0, 4.0, 4).unwrap();
        for x in [0.0, 0.5, 1.0, 3.999, 4.0, -0.1, 4.1, f64::NAN] {
            h.add(x);
        }
        // the upper edge belongs to the last bin
        assert_eq!(h.counts(), &[2, 1, 0, 2]);
        assert_eq!(h.outside(), 3);
        assert_eq!(h.total(), 5);
        assert_eq!(h.edges(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_histogram_density_and_cdf() {
        let data: Vec<f64> = (0..1000).map(|i| i as f64 / 100.0).collect();
        let h = Histogram::from_data(&data, 0.0, 10.0, 30).unwrap();
        let area: f64 = h
            .bins()
            .iter()
            .map(|b| b.density * (b.upper - b.lower))
            .sum();
        assert!((area - 1.0).abs() < 1e-12);
        let cdf = h.cumulative();
        assert!((cdf[cdf.len() - 1] - 1.0).abs() < 1e-12);
        assert!(cdf.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_histogram_bins() {
        let h = Histogram::from_data(&[1.5], 1.0, 3.0, 2).unwrap();
        let bins = h.bins();
        assert_eq!(bins[0].center, 1.5);
        assert_eq!(bins[1].center, 2.5);
        assert_eq!(bins[0].count, 1);
        assert!((bins[0].density - 1.0).abs() < 1e-15);
        assert_eq!(bins[1].density, 0.0);
    }

    #[test]
    fn test_histogram_without_values() {
        let h = Histogram::linspace(0.0, 1.0, 5).unwrap();
        assert!(h.densities().iter().all(|&d| d == 0.0));
        assert!(h.cumulative().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_histogram_rejects_bad_range() {
        assert!(Histogram::linspace(0.0, 1.0, 0).is_none());
        assert!(Histogram::linspace(2.0, 2.0, 3).is_none());
        assert!(Histogram::linspace(0.0, f64::INFINITY, 3).is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn values(len: std::ops::RangeInclusive<usize>) -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(-1e6_f64..1e6, len)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn variance_is_non_negative(data in values(2..=100)) {
            prop_assert!(variance(&data).unwrap() >= 0.0);
        }

        #[test]
        fn merged_partitions_match_one_pass(
            left in values(1..=50),
            right in values(1..=50),
        ) {
            let mut whole = WelfordAccumulator::new();
            left.iter().chain(&right).for_each(|&x| whole.update(x));

            let mut a = WelfordAccumulator::new();
            left.iter().for_each(|&x| a.update(x));
            let mut b = WelfordAccumulator::new();
            right.iter().for_each(|&x| b.update(x));
            a.merge(&b);

            let (m1, m2) = (whole.mean().unwrap(), a.mean().unwrap());
            prop_assert!((m1 - m2).abs() < 1e-9 * m1.abs().max(1.0));
            let (v1, v2) = (whole.sample_variance().unwrap(), a.sample_variance().unwrap());
            prop_assert!((v1 - v2).abs() < 1e-8 * v1.max(1.0));
        }

        #[test]
        fn histogram_accounts_for_every_value(
            data in proptest::collection::vec(-20.0_f64..20.0, 0..200),
            bins in 1_usize..40,
        ) {
            let h = Histogram::from_data(&data, -10.0, 10.0, bins).unwrap();
            prop_assert_eq!(h.total() + h.outside(), data.len() as u64);
        }
    }
}
