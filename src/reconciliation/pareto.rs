//! Pareto Submodule (of Reconciliation)
//!
//! Reduces a multiset of cost vectors to its Pareto frontier: the vectors
//! that can be optimal somewhere in the configured cost ranges, deduplicated
//! with summed multiplicities, mutually non-dominated, in scan order.
//!
//! This module contains the type: `ParetoFrontier`
//!
use itertools::Itertools;

use crate::reconciliation::cost_vector::CostVector;
use crate::reconciliation::CostRange;

/// Frontier maintenance for one cost range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParetoFrontier {
    range: CostRange,
}

impl ParetoFrontier {
    pub fn new(range: CostRange) -> Self {
        ParetoFrontier { range }
    }
    pub fn range(&self) -> CostRange {
        self.range
    }
    /// Returns the Pareto frontier of `candidates`.
    ///
    /// The steps run in a fixed order: range filter, coalescing of equal
    /// counts, sort by scan key, adjacent-pair prefilter, then the full
    /// minimality check against the range-filtered multiset. Changing the
    /// order changes which ties survive.
    /// # Arguments
    /// * `candidates` - cost vectors, possibly with repeated counts
    pub fn filter(&self, candidates: Vec<CostVector>) -> Vec<CostVector> {
        let in_range = self.range_filter(candidates);
        if in_range.is_empty() {
            return in_range;
        }
        let unique = coalesce(&in_range);
        adjacent_prefilter(&unique)
            .into_iter()
            .filter(|v| is_minimal(v, &in_range))
            .collect()
    }
    /// Drops the vectors whose cheapest cost in range exceeds the best
    /// dearest cost in range: they are never optimal inside the ranges.
    pub fn range_filter(&self, candidates: Vec<CostVector>) -> Vec<CostVector> {
        let r = self.range;
        let lub = candidates
            .iter()
            .map(|v| v.cost_at(r.switch_hi(), r.loss_hi()))
            .fold(f64::INFINITY, f64::min);
        candidates
            .into_iter()
            .filter(|v| v.cost_at(r.switch_lo(), r.loss_lo()) <= lub)
            .collect()
    }
}

/// Merges vectors with equal counts, summing multiplicities, and sorts the
/// result by scan key.
fn coalesce(vectors: &[CostVector]) -> Vec<CostVector> {
    vectors
        .iter()
        .copied()
        .into_grouping_map_by(|v| v.counts())
        .fold(0u128, |total, _, v| total.saturating_add(v.count()))
        .into_iter()
        .map(|([c, d, s, l], count)| CostVector::new(c, d, s, l, count))
        .sorted_by(|a, b| a.lex_cmp(b))
        .collect()
}

/// Keeps the first vector and each vector not tied with its predecessor in
/// scan order on cospeciations, duplications and switches. A tied vector
/// has more losses than its predecessor, so it is dominated.
fn adjacent_prefilter(sorted: &[CostVector]) -> Vec<CostVector> {
    let Some(first) = sorted.first() else {
        return vec![];
    };
    std::iter::once(*first)
        .chain(
            sorted
                .iter()
                .tuple_windows()
                .filter(|(pred, cur)| (pred.c(), pred.d(), pred.s()) != (cur.c(), cur.d(), cur.s()))
                .map(|(_, cur)| *cur),
        )
        .collect()
}

fn is_minimal(v: &CostVector, set: &[CostVector]) -> bool {
    !set.iter().any(|w| w.dominates(v))
}
