//! Leaf builder: turns one comparison on one keypart into an interval list.


use crate::{
    graph::{ListId, RangeContext},
    model::{Direction, FieldId},
    value::{Datum, Value},
};
use std::ops::Bound;

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Between(BetweenArg),
    In,
    IsNull,
    IsNotNull,
}

///
/// BetweenArg
///
/// Which side of a BETWEEN one operand supplies.
/// `None` means the operand carries both bounds as a two-value list.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BetweenArg {
    #[default]
    None,
    LowerBound,
    UpperBound,
}

///
/// Operand
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    /// No operand, as for `IS NULL`.
    None,
    Value(Value),
    List(Vec<Value>),
    /// Value bound only at execution time, such as an outer reference.
    Deferred,
}

///
/// LeafTarget
///
/// Keypart a leaf is being built for.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LeafTarget {
    pub field: FieldId,
    pub keypart: u16,
    pub direction: Direction,
}

///
/// LeafOutcome
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LeafOutcome {
    /// The comparison cannot restrict this keypart.
    Unrepresentable,
    /// The comparison matches nothing.
    Impossible,
    Range(ListId),
}

///
/// LeafBuilder
///

pub trait LeafBuilder {
    fn build(
        &self,
        ctx: &mut RangeContext,
        target: LeafTarget,
        op: CompareOp,
        operand: &Operand,
    ) -> LeafOutcome;
}

///
/// ComparisonLeafBuilder
///
/// Reference builder for plain comparisons. Comparisons against NULL are
/// never true, so `x < NULL` and friends are impossible, and ordered
/// comparisons exclude NULL keys.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ComparisonLeafBuilder;

impl LeafBuilder for ComparisonLeafBuilder {
    fn build(
        &self,
        ctx: &mut RangeContext,
        target: LeafTarget,
        op: CompareOp,
        operand: &Operand,
    ) -> LeafOutcome {
        // Phase 1: operand-free and deferred shapes.
        match (op, operand) {
            (CompareOp::IsNull, _) => {
                return interval(
                    ctx,
                    target,
                    Bound::Included(Datum::Null),
                    Bound::Included(Datum::Null),
                );
            }
            (CompareOp::IsNotNull, _) => {
                return interval(ctx, target, above_null(), Bound::Unbounded);
            }
            (_, Operand::Deferred) => {
                return LeafOutcome::Range(ctx.deferred_list(target.keypart, target.field));
            }
            (_, Operand::None) => return LeafOutcome::Unrepresentable,
            _ => {}
        }

        // Phase 2: value comparisons.
        match (op, operand) {
            (CompareOp::In, Operand::List(values)) => in_list(ctx, target, values),
            (CompareOp::Between(BetweenArg::None), Operand::List(values)) => {
                match values.as_slice() {
                    [low, high] => between(ctx, target, low, high),
                    _ => LeafOutcome::Unrepresentable,
                }
            }
            (op, Operand::Value(value)) => {
                if value.is_null() {
                    return LeafOutcome::Impossible;
                }
                let datum = value.to_datum();

                let (min, max) = match op {
                    CompareOp::Eq | CompareOp::In => {
                        (Bound::Included(datum.clone()), Bound::Included(datum))
                    }
                    CompareOp::Lt => (above_null(), Bound::Excluded(datum)),
                    CompareOp::Le | CompareOp::Between(BetweenArg::UpperBound) => {
                        (above_null(), Bound::Included(datum))
                    }
                    CompareOp::Gt => (Bound::Excluded(datum), Bound::Unbounded),
                    CompareOp::Ge | CompareOp::Between(BetweenArg::LowerBound) => {
                        (Bound::Included(datum), Bound::Unbounded)
                    }
                    CompareOp::Between(BetweenArg::None)
                    | CompareOp::IsNull
                    | CompareOp::IsNotNull => return LeafOutcome::Unrepresentable,
                };

                interval(ctx, target, min, max)
            }
            _ => LeafOutcome::Unrepresentable,
        }
    }
}

// Lower bound that admits every non-null key.
const fn above_null() -> Bound<Datum> {
    Bound::Excluded(Datum::Null)
}

fn interval(
    ctx: &mut RangeContext,
    target: LeafTarget,
    min: Bound<Datum>,
    max: Bound<Datum>,
) -> LeafOutcome {
    let list = ctx.single_interval(target.keypart, target.field, target.direction, min, max);
    if ctx.list(list).is_impossible() {
        ctx.release(Some(list));
        return LeafOutcome::Impossible;
    }

    LeafOutcome::Range(list)
}

fn between(ctx: &mut RangeContext, target: LeafTarget, low: &Value, high: &Value) -> LeafOutcome {
    if low.is_null() || high.is_null() {
        return LeafOutcome::Impossible;
    }

    interval(
        ctx,
        target,
        Bound::Included(low.to_datum()),
        Bound::Included(high.to_datum()),
    )
}

// NULL members never match and are skipped.
fn in_list(ctx: &mut RangeContext, target: LeafTarget, values: &[Value]) -> LeafOutcome {
    let mut acc = Some(ctx.impossible_list());
    for value in values.iter().filter(|value| !value.is_null()) {
        let datum = value.to_datum();
        let point = ctx.single_interval(
            target.keypart,
            target.field,
            target.direction,
            Bound::Included(datum.clone()),
            Bound::Included(datum),
        );
        acc = ctx.or_lists(acc, Some(point));
    }

    match acc {
        None => LeafOutcome::Unrepresentable,
        Some(list) if ctx.list(list).is_impossible() => {
            ctx.release(Some(list));
            LeafOutcome::Impossible
        }
        Some(list) => LeafOutcome::Range(list),
    }
}
