use crate::{
    leaf::{BetweenArg, CompareOp, Operand},
    model::FieldId,
    value::Value,
};
use std::ops::{BitAnd, BitOr};

///
/// Predicate AST
///
/// Schema-agnostic boolean predicate over indexed fields.
/// Interpretation happens in the walker; this layer only describes shape.
///

///
/// ComparePredicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComparePredicate {
    pub field: FieldId,
    pub op: CompareOp,
    pub operand: Operand,
}

impl ComparePredicate {
    #[must_use]
    pub const fn new(field: FieldId, op: CompareOp, operand: Operand) -> Self {
        Self { field, op, operand }
    }
}

///
/// Predicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    True,
    False,
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare(ComparePredicate),
}

impl Predicate {
    #[must_use]
    pub const fn and(preds: Vec<Self>) -> Self {
        Self::And(preds)
    }

    #[must_use]
    pub const fn or(preds: Vec<Self>) -> Self {
        Self::Or(preds)
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(pred: Self) -> Self {
        Self::Not(Box::new(pred))
    }

    #[must_use]
    pub const fn compare(field: FieldId, op: CompareOp, operand: Operand) -> Self {
        Self::Compare(ComparePredicate::new(field, op, operand))
    }

    #[must_use]
    pub const fn eq(field: FieldId, value: Value) -> Self {
        Self::compare(field, CompareOp::Eq, Operand::Value(value))
    }

    #[must_use]
    pub const fn lt(field: FieldId, value: Value) -> Self {
        Self::compare(field, CompareOp::Lt, Operand::Value(value))
    }

    #[must_use]
    pub const fn lte(field: FieldId, value: Value) -> Self {
        Self::compare(field, CompareOp::Le, Operand::Value(value))
    }

    #[must_use]
    pub const fn gt(field: FieldId, value: Value) -> Self {
        Self::compare(field, CompareOp::Gt, Operand::Value(value))
    }

    #[must_use]
    pub const fn gte(field: FieldId, value: Value) -> Self {
        Self::compare(field, CompareOp::Ge, Operand::Value(value))
    }

    #[must_use]
    pub fn between(field: FieldId, low: Value, high: Value) -> Self {
        Self::compare(
            field,
            CompareOp::Between(BetweenArg::None),
            Operand::List(vec![low, high]),
        )
    }

    #[must_use]
    pub const fn in_(field: FieldId, values: Vec<Value>) -> Self {
        Self::compare(field, CompareOp::In, Operand::List(values))
    }

    #[must_use]
    pub const fn is_null(field: FieldId) -> Self {
        Self::compare(field, CompareOp::IsNull, Operand::None)
    }

    #[must_use]
    pub const fn is_not_null(field: FieldId) -> Self {
        Self::compare(field, CompareOp::IsNotNull, Operand::None)
    }

    /// Comparison whose operand is only known at execution time.
    #[must_use]
    pub const fn deferred(field: FieldId, op: CompareOp) -> Self {
        Self::compare(field, op, Operand::Deferred)
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}
