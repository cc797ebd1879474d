//! Total order over interval endpoints.
//!
//! Every bound is placed on an extended line: `-inf`, then for each datum `v`
//! the three positions `v-` (excluded max), `v` (included bound) and `v+`
//! (excluded min), then `+inf`. Two edges on the same datum whose positions
//! differ by one step touch without a gap; the comparison reports that as
//! adjacency so OR composition can fuse touching intervals.

use crate::value::Datum;
use std::{cmp::Ordering, ops::Bound};

///
/// BoundOrdering
///
/// Five-valued edge comparison result.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoundOrdering {
    Less,
    LessAdjacent,
    Equal,
    GreaterAdjacent,
    Greater,
}

impl BoundOrdering {
    /// Collapse adjacency into a plain ordering.
    #[must_use]
    pub const fn to_ordering(self) -> Ordering {
        match self {
            Self::Less | Self::LessAdjacent => Ordering::Less,
            Self::Equal => Ordering::Equal,
            Self::GreaterAdjacent | Self::Greater => Ordering::Greater,
        }
    }

    #[must_use]
    pub const fn is_lt(self) -> bool {
        matches!(self, Self::Less | Self::LessAdjacent)
    }

    #[must_use]
    pub const fn is_le(self) -> bool {
        matches!(self, Self::Less | Self::LessAdjacent | Self::Equal)
    }

    #[must_use]
    pub const fn is_gt(self) -> bool {
        matches!(self, Self::Greater | Self::GreaterAdjacent)
    }

    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Less => Self::Greater,
            Self::LessAdjacent => Self::GreaterAdjacent,
            Self::Equal => Self::Equal,
            Self::GreaterAdjacent => Self::LessAdjacent,
            Self::Greater => Self::Less,
        }
    }
}

///
/// Edge
///
/// Borrowed endpoint placed on the extended line.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Edge<'a> {
    NegInf,
    At { datum: &'a Datum, bias: i8 },
    PosInf,
}

impl<'a> Edge<'a> {
    /// Place a lower bound.
    pub(crate) const fn of_min(bound: &'a Bound<Datum>) -> Self {
        match bound {
            Bound::Unbounded => Self::NegInf,
            Bound::Included(datum) => Self::At { datum, bias: 0 },
            Bound::Excluded(datum) => Self::At { datum, bias: 1 },
        }
    }

    /// Place an upper bound.
    pub(crate) const fn of_max(bound: &'a Bound<Datum>) -> Self {
        match bound {
            Bound::Unbounded => Self::PosInf,
            Bound::Included(datum) => Self::At { datum, bias: 0 },
            Bound::Excluded(datum) => Self::At { datum, bias: -1 },
        }
    }
}

/// Compare two edges on the extended line.
pub(crate) fn compare_edges(left: Edge<'_>, right: Edge<'_>) -> BoundOrdering {
    match (left, right) {
        (Edge::NegInf, Edge::NegInf) | (Edge::PosInf, Edge::PosInf) => BoundOrdering::Equal,
        (Edge::NegInf, _) | (_, Edge::PosInf) => BoundOrdering::Less,
        (_, Edge::NegInf) | (Edge::PosInf, _) => BoundOrdering::Greater,
        (
            Edge::At {
                datum: left,
                bias: left_bias,
            },
            Edge::At {
                datum: right,
                bias: right_bias,
            },
        ) => match left.cmp(right) {
            Ordering::Less => BoundOrdering::Less,
            Ordering::Greater => BoundOrdering::Greater,
            Ordering::Equal => match left_bias - right_bias {
                0 => BoundOrdering::Equal,
                -1 => BoundOrdering::LessAdjacent,
                1 => BoundOrdering::GreaterAdjacent,
                diff if diff < 0 => BoundOrdering::Less,
                _ => BoundOrdering::Greater,
            },
        },
    }
}

/// Compare two lower bounds.
#[must_use]
pub fn cmp_min_min(left: &Bound<Datum>, right: &Bound<Datum>) -> BoundOrdering {
    compare_edges(Edge::of_min(left), Edge::of_min(right))
}

/// Compare two upper bounds.
#[must_use]
pub fn cmp_max_max(left: &Bound<Datum>, right: &Bound<Datum>) -> BoundOrdering {
    compare_edges(Edge::of_max(left), Edge::of_max(right))
}

/// Compare a lower bound against an upper bound.
#[must_use]
pub fn cmp_min_max(min: &Bound<Datum>, max: &Bound<Datum>) -> BoundOrdering {
    compare_edges(Edge::of_min(min), Edge::of_max(max))
}

/// Compare an upper bound against a lower bound.
#[must_use]
pub fn cmp_max_min(max: &Bound<Datum>, min: &Bound<Datum>) -> BoundOrdering {
    compare_edges(Edge::of_max(max), Edge::of_min(min))
}

/// True when `[min, max]` contains at least one point of the extended line.
#[must_use]
pub fn is_nonempty(min: &Bound<Datum>, max: &Bound<Datum>) -> bool {
    cmp_min_max(min, max).is_le()
}

/// Upper bound that ends immediately before the given lower bound starts.
pub(crate) fn max_before(min: &Bound<Datum>) -> Bound<Datum> {
    match min {
        Bound::Included(datum) => Bound::Excluded(datum.clone()),
        Bound::Excluded(datum) => Bound::Included(datum.clone()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// Lower bound that starts immediately after the given upper bound ends.
pub(crate) fn min_after(max: &Bound<Datum>) -> Bound<Datum> {
    match max {
        Bound::Included(datum) => Bound::Excluded(datum.clone()),
        Bound::Excluded(datum) => Bound::Included(datum.clone()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// Point membership of `value` in `[min, max]`.
#[must_use]
pub fn contains_datum(min: &Bound<Datum>, max: &Bound<Datum>, value: &Datum) -> bool {
    let point = Edge::At {
        datum: value,
        bias: 0,
    };

    compare_edges(Edge::of_min(min), point).is_le()
        && compare_edges(point, Edge::of_max(max)).is_le()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inc(v: i64) -> Bound<Datum> {
        Bound::Included(Datum::from(v))
    }

    fn exc(v: i64) -> Bound<Datum> {
        Bound::Excluded(Datum::from(v))
    }

    #[test]
    fn identical_closed_bounds_compare_equal() {
        assert_eq!(cmp_min_min(&inc(5), &inc(5)), BoundOrdering::Equal);
        assert_eq!(cmp_max_max(&inc(5), &inc(5)), BoundOrdering::Equal);
        assert_eq!(cmp_min_max(&inc(5), &inc(5)), BoundOrdering::Equal);
    }

    #[test]
    fn touching_open_closed_boundaries_are_adjacent() {
        // [.., 5) then [5, ..
        assert_eq!(cmp_max_min(&exc(5), &inc(5)), BoundOrdering::LessAdjacent);
        // [.., 5] then (5, ..
        assert_eq!(cmp_max_min(&inc(5), &exc(5)), BoundOrdering::LessAdjacent);
        // [.., 5) then (5, .. leaves 5 uncovered
        assert_eq!(cmp_max_min(&exc(5), &exc(5)), BoundOrdering::Less);
    }

    #[test]
    fn unbounded_sentinels_sort_outside_finite_values() {
        let null = Bound::Included(Datum::Null);

        assert_eq!(cmp_min_min(&Bound::Unbounded, &null), BoundOrdering::Less);
        assert_eq!(
            cmp_max_max(&Bound::Unbounded, &inc(i64::MAX)),
            BoundOrdering::Greater
        );
        assert_eq!(
            cmp_min_max(&Bound::Unbounded, &Bound::Unbounded),
            BoundOrdering::Less
        );
    }

    #[test]
    fn null_sorts_below_non_null() {
        let null = Bound::Included(Datum::Null);

        assert_eq!(cmp_min_min(&null, &inc(i64::MIN)), BoundOrdering::Less);
        assert_eq!(cmp_max_max(&inc(i64::MIN), &null), BoundOrdering::Greater);
    }

    #[test]
    fn emptiness_follows_open_flags() {
        assert!(is_nonempty(&inc(5), &inc(5)));
        assert!(!is_nonempty(&inc(5), &exc(5)));
        assert!(!is_nonempty(&exc(5), &inc(5)));
        assert!(is_nonempty(&exc(5), &exc(6)));
        assert!(!is_nonempty(&inc(6), &inc(5)));
    }

    #[test]
    fn complement_edges_touch_their_source() {
        assert_eq!(cmp_max_min(&max_before(&inc(3)), &inc(3)), BoundOrdering::LessAdjacent);
        assert_eq!(cmp_max_min(&inc(3), &min_after(&inc(3))), BoundOrdering::LessAdjacent);
        assert_eq!(cmp_max_min(&exc(3), &min_after(&exc(3))), BoundOrdering::LessAdjacent);
    }

    #[test]
    fn contains_datum_respects_open_ends() {
        assert!(contains_datum(&inc(1), &exc(3), &Datum::from(1)));
        assert!(!contains_datum(&inc(1), &exc(3), &Datum::from(3)));
        assert!(!contains_datum(&Bound::Unbounded, &inc(0), &Datum::from(1)));
        assert!(contains_datum(&Bound::Unbounded, &Bound::Unbounded, &Datum::Null));
    }

    #[test]
    fn reverse_mirrors_every_variant() {
        for ordering in [
            BoundOrdering::Less,
            BoundOrdering::LessAdjacent,
            BoundOrdering::Equal,
            BoundOrdering::GreaterAdjacent,
            BoundOrdering::Greater,
        ] {
            assert_eq!(ordering.reverse().reverse(), ordering);
            assert_eq!(ordering.reverse().to_ordering(), ordering.to_ordering().reverse());
        }
    }
}
