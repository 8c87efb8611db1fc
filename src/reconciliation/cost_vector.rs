//! Cost Vector Submodule (of Reconciliation)
//!
//! A cost vector counts the events of one (partial) reconciliation:
//! cospeciations, duplications, host switches and losses, plus the number of
//! distinct event assignments that collapse onto the same counts.
//!
//! This module contains the type: `CostVector`
//!
use std::cmp::Ordering;
use std::fmt::Display;
use std::ops::Add;

/// Event counts `[c, d, s, l]` of a cost vector, without its multiplicity.
pub type Counts = [u32; 4];

const UNBOUNDED: u32 = u32::MAX;

/// Event counts of a reconciliation together with their multiplicity.
///
/// Two orders live on cost vectors. Dominance, component-wise over all four
/// counts, is the optimality criterion. The lexicographic key is a canonical
/// scan order used to build frontiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CostVector {
    c: u32,
    d: u32,
    s: u32,
    l: u32,
    count: u128,
}

impl CostVector {
    /// One cospeciation event.
    pub const COSPECIATION: CostVector = CostVector::new(1, 0, 0, 0, 1);
    /// One duplication event.
    pub const DUPLICATION: CostVector = CostVector::new(0, 1, 0, 0, 1);
    /// One host switch event.
    pub const SWITCH: CostVector = CostVector::new(0, 0, 1, 0, 1);
    /// One loss event.
    pub const LOSS: CostVector = CostVector::new(0, 0, 0, 1, 1);
    /// A parasite tip sitting on its mapped host tip: no events, one way.
    pub const TIP_MATCH: CostVector = CostVector::new(0, 0, 0, 0, 1);
    /// No valid assignment exists.
    pub const INFEASIBLE: CostVector = CostVector {
        c: UNBOUNDED,
        d: UNBOUNDED,
        s: UNBOUNDED,
        l: UNBOUNDED,
        count: 0,
    };

    /// Creates a cost vector.
    /// # Arguments
    /// * `c`, `d`, `s`, `l` - cospeciation, duplication, switch and loss counts
    /// * `count` - number of distinct event assignments with these counts
    pub const fn new(c: u32, d: u32, s: u32, l: u32, count: u128) -> Self {
        CostVector { c, d, s, l, count }
    }
    // ------ Getters
    pub fn c(&self) -> u32 {
        self.c
    }
    pub fn d(&self) -> u32 {
        self.d
    }
    pub fn s(&self) -> u32 {
        self.s
    }
    pub fn l(&self) -> u32 {
        self.l
    }
    /// Number of distinct event assignments collapsing to these counts.
    pub fn count(&self) -> u128 {
        self.count
    }
    pub fn counts(&self) -> Counts {
        [self.c, self.d, self.s, self.l]
    }
    pub fn is_infeasible(&self) -> bool {
        self.c == UNBOUNDED
    }
    /// Same counts, different multiplicity.
    pub fn with_count(self, count: u128) -> Self {
        if self.is_infeasible() {
            return CostVector::INFEASIBLE;
        }
        CostVector { count, ..self }
    }
    // ------ Functionality
    /// Adds this unit event vector to every vector of `list`.
    pub fn scale(self, list: &[CostVector]) -> Vec<CostVector> {
        list.iter().map(|v| self + *v).collect()
    }
    /// Total cost at one point of the cost plane, duplication weighing 1 and
    /// cospeciation 0.
    /// # Arguments
    /// * `switch` - cost of one host switch
    /// * `loss` - cost of one loss
    pub fn cost_at(&self, switch: f64, loss: f64) -> f64 {
        if self.is_infeasible() {
            return f64::INFINITY;
        }
        self.d as f64 + self.s as f64 * switch + self.l as f64 * loss
    }
    /// True when `self` is no larger than `other` in every event count and
    /// strictly smaller in at least one.
    pub fn dominates(&self, other: &CostVector) -> bool {
        if self.is_infeasible() {
            return false;
        }
        if other.is_infeasible() {
            return true;
        }
        let (mine, theirs) = (self.counts(), other.counts());
        mine.iter().zip(&theirs).all(|(a, b)| a <= b) && mine != theirs
    }
    /// Canonical scan key: cospeciations, duplications, switches, losses.
    pub fn lex_key(&self) -> (u32, u32, u32, u32) {
        (self.c, self.d, self.s, self.l)
    }
    pub fn lex_cmp(&self, other: &CostVector) -> Ordering {
        self.lex_key().cmp(&other.lex_key())
    }
}

impl Add for CostVector {
    type Output = CostVector;

    /// Counts add up, multiplicities multiply: two independent
    /// sub-solutions combine in every pairing.
    fn add(self, other: CostVector) -> CostVector {
        if self.is_infeasible() || other.is_infeasible() {
            return CostVector::INFEASIBLE;
        }
        CostVector {
            c: self.c.saturating_add(other.c),
            d: self.d.saturating_add(other.d),
            s: self.s.saturating_add(other.s),
            l: self.l.saturating_add(other.l),
            count: self.count.saturating_mul(other.count),
        }
    }
}

impl Display for CostVector {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_infeasible() {
            write!(f, "<infeasible>")
        } else {
            write!(f, "<{}, {}, {}, {}>", self.c, self.d, self.s, self.l)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sums_counts_and_multiplies_multiplicity() {
        let v = CostVector::new(1, 2, 0, 3, 2);
        let w = CostVector::new(0, 1, 1, 0, 3);
        assert_eq!(v + w, CostVector::new(1, 3, 1, 3, 6));
    }

    #[test]
    fn infeasible_absorbs_addition() {
        let v = CostVector::new(1, 0, 0, 0, 4);
        assert!((v + CostVector::INFEASIBLE).is_infeasible());
        assert!((CostVector::INFEASIBLE + v).is_infeasible());
        assert_eq!((CostVector::INFEASIBLE + v).count(), 0);
    }

    #[test]
    fn scale_tags_every_element() {
        let list = [CostVector::TIP_MATCH, CostVector::new(0, 1, 0, 0, 2)];
        let tagged = CostVector::LOSS.scale(&list);
        assert_eq!(
            tagged,
            vec![CostVector::new(0, 0, 0, 1, 1), CostVector::new(0, 1, 0, 1, 2)]
        );
    }

    #[test]
    fn dominance_is_strict() {
        let v = CostVector::new(0, 1, 0, 1, 1);
        let w = CostVector::new(0, 1, 1, 1, 1);
        assert!(v.dominates(&w));
        assert!(!w.dominates(&v));
        assert!(!v.dominates(&v));
        // trading a duplication for a loss is incomparable
        let x = CostVector::new(0, 0, 0, 2, 1);
        assert!(!v.dominates(&x) && !x.dominates(&v));
    }

    #[test]
    fn dominance_counts_cospeciations() {
        let fewer = CostVector::new(0, 1, 0, 0, 1);
        let more = CostVector::new(1, 1, 0, 0, 1);
        assert!(fewer.dominates(&more));
        // a cospeciation traded for a duplication is incomparable
        let cospeciating = CostVector::new(1, 0, 0, 1, 1);
        let duplicating = CostVector::new(0, 1, 0, 1, 1);
        assert!(!cospeciating.dominates(&duplicating) && !duplicating.dominates(&cospeciating));
    }

    #[test]
    fn lex_key_starts_with_cospeciations() {
        let v = CostVector::new(0, 3, 3, 3, 1);
        let w = CostVector::new(1, 0, 0, 0, 1);
        assert_eq!(v.lex_cmp(&w), Ordering::Less);
    }

    #[test]
    fn feasible_dominates_infeasible() {
        let v = CostVector::new(5, 5, 5, 5, 1);
        assert!(v.dominates(&CostVector::INFEASIBLE));
        assert!(!CostVector::INFEASIBLE.dominates(&v));
        assert!(!CostVector::INFEASIBLE.dominates(&CostVector::INFEASIBLE));
    }

    #[test]
    fn cost_at_weights_duplication_as_unit() {
        let v = CostVector::new(3, 2, 1, 4, 1);
        assert_eq!(v.cost_at(2.0, 0.5), 2.0 + 2.0 + 2.0);
        assert_eq!(CostVector::INFEASIBLE.cost_at(1.0, 1.0), f64::INFINITY);
    }

    #[test]
    fn display() {
        assert_eq!(CostVector::new(1, 2, 3, 4, 9).to_string(), "<1, 2, 3, 4>");
        assert_eq!(CostVector::INFEASIBLE.to_string(), "<infeasible>");
    }
}
