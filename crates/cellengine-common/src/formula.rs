//! The additive formula language: literals and cell references summed
//! left-to-right with wrapping 32-bit arithmetic.

use crate::cell_id::CellId;

/// One term of a formula: either a signed literal or a reference to
/// another cell's current value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Addend {
    Literal(i32),
    Ref(CellId),
}

/// An ordered sequence of addends. The cell's value is the wrapping sum of
/// the addends evaluated left-to-right.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Formula(Vec<Addend>);

impl Formula {
    pub fn new(addends: Vec<Addend>) -> Self {
        Self(addends)
    }

    pub fn addends(&self) -> &[Addend] {
        &self.0
    }

    /// Iterates over the `Ref` addends only, in formula order.
    pub fn iter_refs(&self) -> impl Iterator<Item = CellId> + '_ {
        self.0.iter().filter_map(|a| match a {
            Addend::Ref(id) => Some(*id),
            Addend::Literal(_) => None,
        })
    }

    /// True when the formula contains no `Ref` addends — these cells form
    /// the BFS starting set.
    pub fn is_literal_only(&self) -> bool {
        self.0.iter().all(|a| matches!(a, Addend::Literal(_)))
    }

    /// Wrapping 32-bit sum, resolving each `Ref` addend through `value_of`.
    pub fn evaluate(&self, mut value_of: impl FnMut(CellId) -> i32) -> i32 {
        let mut total: i32 = 0;
        for addend in &self.0 {
            let term = match addend {
                Addend::Literal(v) => *v,
                Addend::Ref(id) => value_of(*id),
            };
            total = total.wrapping_add(term);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_only_sums_without_lookups() {
        let f = Formula::new(vec![Addend::Literal(1), Addend::Literal(2)]);
        assert!(f.is_literal_only());
        assert_eq!(f.evaluate(|_| panic!("no refs expected")), 3);
    }

    #[test]
    fn wraps_on_overflow() {
        let f = Formula::new(vec![Addend::Literal(i32::MAX), Addend::Literal(1)]);
        assert_eq!(f.evaluate(|_| 0), i32::MIN);
    }

    #[test]
    fn refs_resolve_through_callback() {
        let f = Formula::new(vec![Addend::Ref(CellId(0)), Addend::Literal(3)]);
        assert_eq!(f.evaluate(|id| if id == CellId(0) { 10 } else { 0 }), 13);
        assert_eq!(f.iter_refs().collect::<Vec<_>>(), vec![CellId(0)]);
    }

    proptest::proptest! {
        #[test]
        fn evaluate_matches_wrapping_sum_of_literals(literals in proptest::collection::vec(proptest::prelude::any::<i32>(), 0..8)) {
            let f = Formula::new(literals.iter().copied().map(Addend::Literal).collect());
            let expected = literals.iter().fold(0i32, |acc, &v| acc.wrapping_add(v));
            proptest::prop_assert_eq!(f.evaluate(|_| panic!("no refs in this formula")), expected);
        }
    }
}
