use crate::{
    graph::RangeContext,
    leaf::{CompareOp, ComparisonLeafBuilder},
    model::{Direction, FieldId, IndexCatalog, IndexModel, KeyPart},
    plan::{PredicateTree, TreeKind},
    predicate::{Predicate, PredicateWalker},
    test_support::assert_healthy,
    value::Value,
};

const A: FieldId = FieldId(0);
const B: FieldId = FieldId(1);
const C: FieldId = FieldId(2);

// slot 0: (a, b), slot 1: (b), slot 2: (c desc, c)
fn catalog() -> IndexCatalog {
    IndexCatalog::try_new(vec![
        IndexModel::new("by_a_b", vec![KeyPart::asc(A), KeyPart::asc(B)]),
        IndexModel::new("by_b", vec![KeyPart::asc(B)]),
        IndexModel::new("by_c_c", vec![KeyPart::desc(C), KeyPart::asc(C)]),
    ])
    .expect("catalog should be valid")
}

fn compile(ctx: &mut RangeContext, catalog: &IndexCatalog, predicate: &Predicate) -> PredicateTree {
    PredicateWalker::new(catalog, ComparisonLeafBuilder).compile(ctx, predicate)
}

fn int(value: i64) -> Value {
    Value::Int(value)
}

#[test]
fn constants_map_to_special_trees() {
    let catalog = catalog();
    let mut ctx = RangeContext::default();

    let tree = compile(&mut ctx, &catalog, &Predicate::True);
    assert!(tree.is_always_true());
    assert!(!tree.is_inexact());
    assert_eq!(tree.slot_count(), 3);

    assert!(compile(&mut ctx, &catalog, &Predicate::False).is_impossible());
    assert!(compile(&mut ctx, &catalog, &Predicate::or(vec![])).is_impossible());

    let tree = compile(&mut ctx, &catalog, &Predicate::and(vec![]));
    assert!(tree.is_always_true());
    assert!(!tree.is_inexact());
}

#[test]
fn compare_fills_every_index_covering_the_field() {
    let catalog = catalog();
    let mut ctx = RangeContext::default();

    let tree = compile(&mut ctx, &catalog, &Predicate::eq(B, int(2)));

    assert_eq!(tree.present().iter().collect::<Vec<_>>(), vec![0, 1]);
    let on_first = tree.slot(0).expect("b is keypart 1 of index 0");
    let on_second = tree.slot(1).expect("b leads index 1");
    assert_eq!(ctx.list(on_first).keypart(), Some(1));
    assert_eq!(ctx.list(on_second).keypart(), Some(0));
    assert!(!tree.is_inexact());
    assert_healthy(&ctx, &tree.roots());
}

#[test]
fn repeated_field_constrains_every_position() {
    let catalog = catalog();
    let mut ctx = RangeContext::default();

    let tree = compile(&mut ctx, &catalog, &Predicate::eq(C, int(5)));
    let root = tree.slot(2).expect("c leads index 2");
    let first = ctx.intervals(root).next().expect("one interval");

    assert_eq!(ctx.interval(first).direction(), Direction::Desc);
    let next = ctx.interval(first).next().expect("second position chained");
    assert_eq!(ctx.list(next).keypart(), Some(1));
    assert_eq!(ctx.keypart_sub_list(&tree, 2, 1), Ok(Some(next)));
    assert_healthy(&ctx, &tree.roots());
}

#[test]
fn conjunction_chains_keyparts() {
    let catalog = catalog();
    let mut ctx = RangeContext::default();
    let predicate = Predicate::eq(A, int(1)) & Predicate::gt(B, int(4));

    let tree = compile(&mut ctx, &catalog, &predicate);

    let second = ctx
        .keypart_sub_list(&tree, 0, 1)
        .expect("prefix is a single point")
        .expect("b constrained");
    assert_eq!(ctx.list(second).len(), 1);
    // index 1 only sees the b conjunct
    assert!(tree.is_inexact());
    assert_healthy(&ctx, &tree.roots());
}

#[test]
fn disjunction_on_one_field_stays_exact() {
    let catalog = catalog();
    let mut ctx = RangeContext::default();
    let predicate = Predicate::in_(A, vec![int(1), int(3)]) | Predicate::eq(A, int(7));

    let tree = compile(&mut ctx, &catalog, &predicate);

    let root = tree.slot(0).expect("a leads index 0");
    assert_eq!(ctx.list(root).len(), 3);
    assert!(tree.merges().is_empty());
    assert!(!tree.is_inexact());
    assert_healthy(&ctx, &tree.roots());
}

#[test]
fn disjunction_across_indexes_uses_index_merge() {
    let catalog = catalog();
    let mut ctx = RangeContext::default();
    let predicate = Predicate::eq(A, int(1)) | Predicate::eq(C, int(2));

    let tree = compile(&mut ctx, &catalog, &predicate);

    assert_eq!(tree.kind(), TreeKind::HasRanges);
    assert_eq!(tree.merges().len(), 1);
    assert_eq!(
        tree.merges()[0].indexes().iter().collect::<Vec<_>>(),
        vec![0, 2]
    );
    ctx.check_tree(&tree).expect("tree invariants hold");
    assert_healthy(&ctx, &tree.roots());
}

#[test]
fn negation_folds_constants_only() {
    let catalog = catalog();
    let mut ctx = RangeContext::default();

    let tree = compile(&mut ctx, &catalog, &Predicate::not(Predicate::eq(A, int(1))));
    assert!(tree.is_always_true());
    assert!(tree.is_inexact());

    let tree = compile(&mut ctx, &catalog, &Predicate::not(Predicate::True));
    assert!(tree.is_impossible());

    let double = Predicate::not(Predicate::not(Predicate::eq(A, int(1))));
    let tree = compile(&mut ctx, &catalog, &double);
    assert!(tree.slot(0).is_some());
    assert!(!tree.is_inexact());
    ctx.release_tree(tree);
}

#[test]
fn unindexed_or_unrepresentable_compare_is_inexact_always_true() {
    let catalog = catalog();
    let mut ctx = RangeContext::default();

    let tree = compile(&mut ctx, &catalog, &Predicate::eq(FieldId(9), int(1)));
    assert!(tree.is_always_true());
    assert!(tree.is_inexact());

    let missing = Predicate::compare(A, CompareOp::Eq, crate::leaf::Operand::None);
    let tree = compile(&mut ctx, &catalog, &missing);
    assert!(tree.is_always_true());
    assert!(tree.is_inexact());
    assert_eq!(ctx.live_lists(), 0);
}

#[test]
fn null_comparison_makes_conjunction_impossible() {
    let catalog = catalog();
    let mut ctx = RangeContext::default();
    let predicate = Predicate::eq(B, int(3)) & Predicate::lt(A, Value::Null);

    let tree = compile(&mut ctx, &catalog, &predicate);

    assert!(tree.is_impossible());
    assert_eq!(ctx.live_lists(), 0);
}

#[test]
fn deferred_compare_marks_list_deferred() {
    let catalog = catalog();
    let mut ctx = RangeContext::default();
    let predicate = Predicate::gte(A, int(2)) & Predicate::deferred(A, CompareOp::Lt);

    let tree = compile(&mut ctx, &catalog, &predicate);

    let root = tree.slot(0).expect("a leads index 0");
    assert!(ctx.list(root).is_deferred());
    assert_healthy(&ctx, &tree.roots());
}
