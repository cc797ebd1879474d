//! Builders and assertions shared by unit tests.

use crate::{
    graph::{ListId, RangeContext, RefcountMode},
    model::{Direction, FieldId},
    value::Datum,
};
use std::{collections::BTreeSet, ops::Bound};

/// Values every brute-force domain ranges over, besides NULL.
pub(crate) const DOMAIN: std::ops::RangeInclusive<i64> = -1..=6;

pub(crate) fn int(value: i64) -> Datum {
    Datum::from(value)
}

pub(crate) fn inc(value: i64) -> Bound<Datum> {
    Bound::Included(int(value))
}

pub(crate) fn exc(value: i64) -> Bound<Datum> {
    Bound::Excluded(int(value))
}

pub(crate) fn field(keypart: u16) -> FieldId {
    FieldId(u32::from(keypart))
}

pub(crate) fn range(
    ctx: &mut RangeContext,
    keypart: u16,
    min: Bound<Datum>,
    max: Bound<Datum>,
) -> Option<ListId> {
    Some(ctx.single_interval(keypart, field(keypart), Direction::Asc, min, max))
}

pub(crate) fn point(ctx: &mut RangeContext, keypart: u16, value: i64) -> Option<ListId> {
    range(ctx, keypart, inc(value), inc(value))
}

pub(crate) fn points(ctx: &mut RangeContext, keypart: u16, values: &[i64]) -> Option<ListId> {
    let mut acc = Some(ctx.impossible_list());
    for &value in values {
        let leaf = point(ctx, keypart, value);
        acc = ctx.or_lists(acc, leaf);
    }

    acc
}

/// Bounds of a list's intervals, in order.
pub(crate) fn spans(ctx: &RangeContext, list: ListId) -> Vec<(Bound<Datum>, Bound<Datum>)> {
    ctx.intervals(list)
        .map(|id| {
            let node = ctx.interval(id);
            (node.min().clone(), node.max().clone())
        })
        .collect()
}

/// Every tuple over `keyparts` columns drawn from NULL and `DOMAIN`.
pub(crate) fn tuple_domain(keyparts: usize) -> Vec<Vec<Datum>> {
    let column: Vec<Datum> = std::iter::once(Datum::Null)
        .chain(DOMAIN.map(int))
        .collect();

    let mut tuples = vec![Vec::new()];
    for _ in 0..keyparts {
        tuples = tuples
            .into_iter()
            .flat_map(|prefix| {
                column.iter().map(move |value| {
                    let mut tuple = prefix.clone();
                    tuple.push(value.clone());
                    tuple
                })
            })
            .collect();
    }

    tuples
}

/// Distinct lists reachable from `roots`.
pub(crate) fn reachable_lists(ctx: &RangeContext, roots: &[Option<ListId>]) -> usize {
    let mut seen = BTreeSet::new();
    let mut pending: Vec<ListId> = roots.iter().flatten().copied().collect();

    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        for interval in ctx.intervals(id) {
            pending.extend(ctx.interval(interval).next());
        }
    }

    seen.len()
}

/// Structure, exact refcounts, and no leaked live lists.
pub(crate) fn assert_healthy(ctx: &RangeContext, roots: &[Option<ListId>]) {
    for root in roots.iter().flatten() {
        ctx.check_list(*root).expect("list structure should hold");
    }
    ctx.check_refcounts(roots, RefcountMode::Exact)
        .expect("refcounts should match owners");
    assert_eq!(
        ctx.live_lists(),
        reachable_lists(ctx, roots),
        "every live list should be reachable from a root"
    );
}
