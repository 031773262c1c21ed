//! Finite labeled populations.
//!
//! A [`Population`] is a multiset of labels built from `(label, count)`
//! pairs, e.g. 500 supporters of party A, 300 of B and 200 of C. It is
//! immutable once built and is only ever read by the estimator, so one
//! population can be shared across all parallel partitions of a run.
//!
//! Samples are drawn without replacement and uniformly over all
//! k-subsets via [`random::sample_indices`](crate::random::sample_indices);
//! the members are never pre-shuffled.

use rand::Rng;

use crate::error::{EstimatorError, Result};
use crate::random;

/// Finite multiset of labeled members.
///
/// Each distinct label is stored once; members refer to their label by
/// index.
///
/// # Examples
/// ```
/// use probsim::population::Population;
/// let pop = Population::from_counts([("A", 3), ("B", 2)]).unwrap();
/// assert_eq!(pop.len(), 5);
/// assert_eq!(pop.count_of(&"A"), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Population<L> {
    labels: Vec<L>,
    counts: Vec<usize>,
    members: Vec<usize>,
}

impl<L: PartialEq> Population<L> {
    /// Builds a population from `(label, count)` pairs.
    ///
    /// Repeated labels are combined. Zero counts are allowed as long as
    /// the population as a whole is non-empty.
    ///
    /// # Errors
    /// `InvalidConfiguration` if the total member count is zero.
    pub fn from_counts<I>(groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = (L, usize)>,
    {
        let mut labels: Vec<L> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        let mut members = Vec::new();
        for (label, count) in groups {
            let slot = match labels.iter().position(|l| *l == label) {
                Some(i) => i,
                None => {
                    labels.push(label);
                    counts.push(0);
                    labels.len() - 1
                }
            };
            counts[slot] += count;
            members.extend(std::iter::repeat(slot).take(count));
        }
        if members.is_empty() {
            return Err(EstimatorError::invalid("population is empty"));
        }
        Ok(Self {
            labels,
            counts,
            members,
        })
    }

    /// Number of members with the given label.
    pub fn count_of(&self, label: &L) -> usize {
        self.labels
            .iter()
            .position(|l| l == label)
            .map_or(0, |i| self.counts[i])
    }
}

impl<L> Population<L> {
    /// Total number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a constructed population.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Distinct labels in first-seen order.
    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    /// `(label, count)` pairs in first-seen order.
    pub fn groups(&self) -> impl Iterator<Item = (&L, usize)> {
        self.labels.iter().zip(self.counts.iter().copied())
    }

    /// Label of the member at `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn member(&self, index: usize) -> &L {
        &self.labels[self.members[index]]
    }

    /// Draws `k` members without replacement, uniformly over all
    /// k-subsets. The order of the returned labels carries no meaning.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `k > self.len()`.
    pub fn sample<R: Rng>(&self, k: usize, rng: &mut R) -> Result<Vec<&L>> {
        let indices = random::sample_indices(self.len(), k, rng).ok_or_else(|| {
            EstimatorError::invalid(format!(
                "sample size {k} exceeds population size {}",
                self.len()
            ))
        })?;
        Ok(indices.into_iter().map(|i| self.member(i)).collect())
    }

    /// Like [`sample`](Self::sample), but writes into a reusable buffer.
    /// The caller guarantees `k <= self.len()`.
    pub(crate) fn sample_into<'a, R: Rng>(&'a self, k: usize, rng: &mut R, out: &mut Vec<&'a L>) {
        out.clear();
        if let Some(indices) = random::sample_indices(self.len(), k, rng) {
            out.extend(indices.into_iter().map(|i| self.member(i)));
        }
    }
}
