//! Laplace-smoothed categorical distribution over symbol-pair ids.
//!
//! Inference workers each fold alignments into a private distribution; the
//! partial results are merged by plain count addition.

use rustc_hash::FxHashMap;

use crate::types::PhoneticStringAlignment;
use crate::symbols::SymbolTable;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairDistribution {
    counts: FxHashMap<u64, f64>,
    total: f64,
}

impl PairDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pair: u64, weight: f64) {
        *self.counts.entry(pair).or_insert(0.0) += weight;
        self.total += weight;
    }

    /// Count every aligned symbol pair of `alignment` once.
    pub fn add_alignment(&mut self, symbols: &SymbolTable, alignment: &PhoneticStringAlignment) {
        for (a, b) in alignment.pairs() {
            self.add(symbols.pair_id(a, b), 1.0);
        }
    }

    /// Elementwise addition, used as the join step after parallel accumulation.
    pub fn merge(mut self, other: PairDistribution) -> PairDistribution {
        if self.counts.len() < other.counts.len() {
            return other.merge(self);
        }
        for (pair, count) in other.counts {
            *self.counts.entry(pair).or_insert(0.0) += count;
        }
        self.total += other.total;
        self
    }

    pub fn count(&self, pair: u64) -> f64 {
        self.counts.get(&pair).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn observed(&self) -> impl Iterator<Item = u64> + '_ {
        self.counts.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Laplace-smoothed probability over `outcomes` outcomes.
    ///
    /// `smoothing_ratio · total` extra mass is spread evenly over all outcomes,
    /// so a pair unseen in two distributions of different size gets the same
    /// probability in both. An empty distribution is uniform.
    pub fn probability(&self, pair: u64, smoothing_ratio: f64, outcomes: usize) -> f64 {
        let outcomes = outcomes.max(1) as f64;
        if self.total <= 0.0 {
            return 1.0 / outcomes;
        }
        let pseudo_count = smoothing_ratio * self.total / outcomes;
        (self.count(pair) + pseudo_count) / (self.total * (1.0 + smoothing_ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_adds_counts() {
        let mut left = PairDistribution::new();
        left.add(3, 1.0);
        left.add(4, 2.0);
        let mut right = PairDistribution::new();
        right.add(4, 1.0);
        right.add(9, 5.0);

        let merged = left.merge(right);
        assert_eq!(merged.count(3), 1.0);
        assert_eq!(merged.count(4), 3.0);
        assert_eq!(merged.count(9), 5.0);
        assert_eq!(merged.total(), 9.0);
    }

    #[test]
    fn test_smoothed_probability_sums_to_one() {
        let mut dist = PairDistribution::new();
        dist.add(0, 3.0);
        dist.add(2, 1.0);
        let total: f64 = (0..4).map(|pair| dist.probability(pair, 0.5, 4)).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(dist.probability(1, 0.5, 4) > 0.0);
    }

    #[test]
    fn test_empty_distribution() {
        let dist = PairDistribution::new();
        assert_eq!(dist.probability(7, 0.2, 10), 0.1);
    }

    #[test]
    fn test_unseen_pair_independent_of_mass() {
        let mut small = PairDistribution::new();
        small.add(1, 10.0);
        let mut large = PairDistribution::new();
        large.add(1, 500.0);
        large.add(2, 500.0);
        let unseen_small = small.probability(3, 0.2, 16);
        let unseen_large = large.probability(3, 0.2, 16);
        assert!((unseen_small - unseen_large).abs() < 1e-15);
    }
}
