//! Seeded generators and the sampling primitives trials are built from.
//!
//! - [`create_rng`] / [`partition_seed`]: one `SmallRng` per estimator
//!   partition, derived from the run seed.
//! - [`sample_indices`]: a uniform k-subset of `0..n`, used to draw
//!   without replacement from a population.
//! - [`WeightedSampler`]: draws with replacement from unequal weights
//!   (the unfair die).
//!
//! The same seed always yields the same stream on the same platform.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Subsets up to this size are drawn with Floyd's algorithm, which never
/// touches the other `n - k` indices.
const FLOYD_MAX_K: usize = 32;

/// `SmallRng` seeded through `seed_from_u64`.
///
/// # Examples
/// ```
/// use probsim::random::create_rng;
/// use rand::Rng;
/// let mut a = create_rng(42);
/// let mut b = create_rng(42);
/// assert_eq!(a.random::<u64>(), b.random::<u64>());
/// ```
pub fn create_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Seed for the `index`-th independent partition of a run.
///
/// `seed_from_u64` expands the value through SplitMix64, so adjacent
/// seeds still give uncorrelated streams.
pub fn partition_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add(index as u64)
}

/// Moves a uniform random `k`-subset of `slice` into `slice[..k]`.
///
/// Only the first `k` positions are settled; the tail is left in an
/// unspecified order.
///
/// # Panics
/// Panics if `k > slice.len()`.
pub fn partial_shuffle<T, R: Rng>(slice: &mut [T], k: usize, rng: &mut R) {
    let len = slice.len();
    assert!(k <= len, "partial_shuffle: k={k} exceeds length {len}");
    for i in 0..k.min(len.saturating_sub(1)) {
        slice.swap(i, rng.random_range(i..len));
    }
}

/// `k` distinct indices from `0..n`, every k-subset equally likely, or
/// `None` when `k > n`.
///
/// Small `k` uses Floyd's algorithm (Bentley & Floyd, "A sample of
/// brilliance", CACM 1987) in O(k²) regardless of `n`. Larger `k` runs
/// [`partial_shuffle`] over an index buffer. The order of the result
/// carries no meaning.
///
/// ```
/// use probsim::random::{create_rng, sample_indices};
/// let mut rng = create_rng(7);
/// let mut hand = sample_indices(52, 6, &mut rng).unwrap();
/// hand.sort();
/// hand.dedup();
/// assert_eq!(hand.len(), 6);
/// assert!(sample_indices(4, 5, &mut rng).is_none());
/// ```
pub fn sample_indices<R: Rng>(n: usize, k: usize, rng: &mut R) -> Option<Vec<usize>> {
    if k > n {
        return None;
    }
    if k > FLOYD_MAX_K {
        let mut pool: Vec<usize> = (0..n).collect();
        partial_shuffle(&mut pool, k, rng);
        pool.truncate(k);
        return Some(pool);
    }
    let mut chosen = Vec::with_capacity(k);
    for upper in (n - k)..n {
        let pick = rng.random_range(0..=upper);
        chosen.push(if chosen.contains(&pick) { upper } else { pick });
    }
    Some(chosen)
}

/// Draws category indices with probability proportional to their weight.
///
/// Keeps the running total of the weights and binary-searches it, so a
/// draw costs O(log n). Negative, NaN and infinite weights count as zero
/// and are never drawn. The total itself must stay finite.
///
/// ```
/// use probsim::random::{create_rng, WeightedSampler};
/// let die = WeightedSampler::new(&[10.0, 15.0, 30.0, 25.0, 5.0, 15.0]).unwrap();
/// let face = die.sample(&mut create_rng(1)) + 1;
/// assert!((1..=6).contains(&face));
/// ```
#[derive(Debug, Clone)]
pub struct WeightedSampler {
    running: Vec<f64>,
    total: f64,
}

impl WeightedSampler {
    /// `None` when there is no weight above zero or the weights sum past
    /// `f64::MAX`.
    pub fn new(weights: &[f64]) -> Option<Self> {
        let mut total = 0.0;
        let running: Vec<f64> = weights
            .iter()
            .map(|&w| {
                if w > 0.0 && w.is_finite() {
                    total += w;
                }
                total
            })
            .collect();
        (total > 0.0 && total.is_finite()).then_some(Self { running, total })
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let u = rng.random_range(0.0..self.total);
        // Zero-weight entries repeat the previous running total and are
        // never the first one above `u`.
        let idx = self.running.partition_point(|&c| c <= u);
        idx.min(self.running.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Sum of the usable weights.
    pub fn total_weight(&self) -> f64 {
        self.total
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
        fn subset_is_distinct_and_in_range(
            seed: u64,
            n in 0_usize..200,
            k_frac in 0.0_f64..=1.0,
        ) {
            let k = (n as f64 * k_frac).floor() as usize;
            let s = sample_indices(n, k, &mut create_rng(seed)).unwrap();
            prop_assert_eq!(s.len(), k);
            prop_assert!(s.iter().all(|&i| i < n));
            let mut distinct = s;
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(distinct.len(), k);
        }

        #[test]
        fn weighted_draw_has_positive_weight(
            seed: u64,
            weights in proptest::collection::vec(0.0_f64..5.0, 1..12),
        ) {
            if let Some(sampler) = WeightedSampler::new(&weights) {
                let idx = sampler.sample(&mut create_rng(seed));
                prop_assert!(weights[idx] > 0.0);
            }
        }
    }
}
