use crate::{
    MAX_KEYPARTS,
    config::RangeConfig,
    error::{ErrorClass, ErrorOrigin, InternalError},
    graph::{ListId, RangeContext},
    obs::{MetricsEvent, MetricsSink, with_metrics_sink},
    plan::{KeypartLookupError, PredicateTree, TreeKind},
    test_support::{assert_healthy, inc, point, points, range, spans},
};
use std::cell::RefCell;

const SLOTS: usize = 2;

#[derive(Default)]
struct CaptureSink {
    events: RefCell<Vec<MetricsEvent>>,
}

impl MetricsSink for CaptureSink {
    fn record(&self, event: MetricsEvent) {
        self.events.borrow_mut().push(event);
    }
}

fn on_slot(ctx: &mut RangeContext, index: usize, list: Option<ListId>) -> PredicateTree {
    ctx.single_slot_tree(SLOTS, index, list)
}

// index 0 gets `left`, index 1 gets `right`, so the OR needs a merge
fn merge_tree(ctx: &mut RangeContext, left: i64, right: i64) -> PredicateTree {
    let a = point(ctx, 0, left);
    let b = point(ctx, 0, right);
    let left = on_slot(ctx, 0, a);
    let right = on_slot(ctx, 1, b);

    ctx.or_trees(left, right)
}

fn member_on(tree: &PredicateTree, index: usize) -> &PredicateTree {
    tree.merges()[0]
        .iter()
        .find(|member| member.present().contains(index))
        .expect("a member should hold the index")
}

///
/// AND
///

#[test]
fn and_trees_intersects_shared_slot() {
    let mut ctx = RangeContext::default();
    let a = range(&mut ctx, 0, inc(1), inc(5));
    let b = range(&mut ctx, 0, inc(3), inc(8));
    let left = on_slot(&mut ctx, 0, a);
    let right = on_slot(&mut ctx, 0, b);

    let out = ctx.and_trees(left, right);

    assert_eq!(out.kind(), TreeKind::HasRanges);
    assert!(!out.is_inexact());
    let list = out.slot(0).expect("slot 0 restricted");
    assert_eq!(spans(&ctx, list), vec![(inc(3), inc(5))]);
    assert_healthy(&ctx, &out.roots());
}

#[test]
fn and_trees_keeps_one_sided_slots_inexact() {
    let mut ctx = RangeContext::default();
    let a = point(&mut ctx, 0, 1);
    let b = point(&mut ctx, 0, 2);
    let left = on_slot(&mut ctx, 0, a);
    let right = on_slot(&mut ctx, 1, b);

    let out = ctx.and_trees(left, right);

    assert_eq!(out.present().iter().collect::<Vec<_>>(), vec![0, 1]);
    assert!(out.is_inexact());
    assert_healthy(&ctx, &out.roots());
}

#[test]
fn and_trees_with_empty_slot_is_impossible() {
    let mut ctx = RangeContext::default();
    let a = range(&mut ctx, 0, inc(1), inc(2));
    let b = range(&mut ctx, 0, inc(5), inc(6));
    let left = on_slot(&mut ctx, 0, a);
    let right = on_slot(&mut ctx, 0, b);

    let out = ctx.and_trees(left, right);

    assert!(out.is_impossible());
    assert!(out.roots().is_empty());
    assert_eq!(ctx.live_lists(), 0);
}

#[test]
fn and_trees_with_always_true_keeps_other_side() {
    let mut ctx = RangeContext::default();
    let a = point(&mut ctx, 0, 4);
    let ranged = on_slot(&mut ctx, 0, a);

    let out = ctx.and_trees(PredicateTree::always_true(SLOTS, false), ranged);
    assert_eq!(out.slot(0), a);
    assert!(!out.is_inexact());

    // an unrepresentable conjunct leaves a re-check behind
    let out = ctx.and_trees(out, PredicateTree::always_true(SLOTS, true));
    assert_eq!(out.slot(0), a);
    assert!(out.is_inexact());
    assert_healthy(&ctx, &out.roots());
}

#[test]
fn and_trees_keeps_merges_alongside_ranges() {
    let mut ctx = RangeContext::default();
    let merged = merge_tree(&mut ctx, 1, 2);
    let c = point(&mut ctx, 0, 9);
    let ranged = on_slot(&mut ctx, 0, c);

    let out = ctx.and_trees(merged, ranged);

    assert_eq!(out.merges().len(), 1);
    assert_eq!(out.slot(0), c);
    assert!(out.is_inexact());
    ctx.check_tree(&out).expect("tree invariants hold");
    assert_healthy(&ctx, &out.roots());
}

///
/// OR
///

#[test]
fn or_trees_unifies_shared_slot() {
    let mut ctx = RangeContext::default();
    let a = range(&mut ctx, 0, inc(1), inc(2));
    let b = range(&mut ctx, 0, inc(4), inc(5));
    let left = on_slot(&mut ctx, 0, a);
    let right = on_slot(&mut ctx, 0, b);

    let out = ctx.or_trees(left, right);

    assert!(out.merges().is_empty());
    assert!(!out.is_inexact());
    let list = out.slot(0).expect("slot 0 restricted");
    assert_eq!(
        spans(&ctx, list),
        vec![(inc(1), inc(2)), (inc(4), inc(5))]
    );
    assert_healthy(&ctx, &out.roots());
}

#[test]
fn or_trees_on_disjoint_indexes_starts_index_merge() {
    let mut ctx = RangeContext::default();
    let a = point(&mut ctx, 0, 1);
    let b = point(&mut ctx, 0, 2);
    let left = on_slot(&mut ctx, 0, a);
    let right = on_slot(&mut ctx, 1, b);
    let sink = CaptureSink::default();

    let out = with_metrics_sink(&sink, || ctx.or_trees(left, right));

    assert!(
        sink.events
            .borrow()
            .contains(&MetricsEvent::IndexMergeFallback)
    );
    assert_eq!(out.kind(), TreeKind::HasRanges);
    assert!(out.without_ranges());
    assert!(!out.is_inexact());
    assert_eq!(out.merges().len(), 1);
    assert_eq!(out.merges()[0].len(), 2);
    assert_eq!(
        out.merges()[0].indexes().iter().collect::<Vec<_>>(),
        vec![0, 1]
    );
    ctx.check_tree(&out).expect("tree invariants hold");
    assert_healthy(&ctx, &out.roots());
}

#[test]
fn or_trees_discards_ungrounded_scans_when_configured() {
    let config = RangeConfig::default().with_discard_ungrounded_scans(true);
    let mut ctx = RangeContext::new(config);
    let a = point(&mut ctx, 1, 1);
    let b = point(&mut ctx, 0, 2);
    let left = on_slot(&mut ctx, 0, a);
    let right = on_slot(&mut ctx, 1, b);

    let out = ctx.or_trees(left, right);

    assert!(out.is_always_true());
    assert!(out.is_inexact());
    assert_eq!(ctx.live_lists(), 0);
}

#[test]
fn or_trees_keeps_ungrounded_scans_by_default() {
    let mut ctx = RangeContext::default();
    let a = point(&mut ctx, 1, 1);
    let b = point(&mut ctx, 0, 2);
    let left = on_slot(&mut ctx, 0, a);
    let right = on_slot(&mut ctx, 1, b);

    let out = ctx.or_trees(left, right);

    assert_eq!(out.merges().len(), 1);
    assert_eq!(out.merges()[0].len(), 2);
    assert_healthy(&ctx, &out.roots());
}

#[test]
fn or_trees_folds_range_tree_into_matching_member() {
    let mut ctx = RangeContext::default();
    let merged = merge_tree(&mut ctx, 1, 2);
    let c = point(&mut ctx, 0, 7);
    let ranged = on_slot(&mut ctx, 0, c);

    let out = ctx.or_trees(merged, ranged);

    assert_eq!(out.merges().len(), 1);
    assert_eq!(out.merges()[0].len(), 2);
    assert!(!out.is_inexact());
    let member = member_on(&out, 0);
    let list = member.slot(0).expect("member keeps its range");
    assert_eq!(
        spans(&ctx, list),
        vec![(inc(1), inc(1)), (inc(7), inc(7))]
    );
    ctx.check_tree(&out).expect("tree invariants hold");
    assert_healthy(&ctx, &out.roots());
}

#[test]
fn or_trees_of_two_merges_unifies_members() {
    let mut ctx = RangeContext::default();
    let left = merge_tree(&mut ctx, 1, 2);
    let right = merge_tree(&mut ctx, 3, 4);

    let out = ctx.or_trees(left, right);

    assert_eq!(out.merges().len(), 1);
    assert_eq!(out.merges()[0].len(), 2);
    assert!(!out.is_inexact());
    let on_first = member_on(&out, 0).slot(0).expect("range on index 0");
    let on_second = member_on(&out, 1).slot(1).expect("range on index 1");
    assert_eq!(ctx.list(on_first).len(), 2);
    assert_eq!(ctx.list(on_second).len(), 2);
    assert_healthy(&ctx, &out.roots());
}

#[test]
fn merge_past_tree_cap_degrades_to_always_true() {
    let config = RangeConfig {
        max_merge_trees: 1,
        ..RangeConfig::default()
    };
    let mut ctx = RangeContext::new(config);

    let out = merge_tree(&mut ctx, 1, 2);

    assert!(out.is_always_true());
    assert!(out.is_inexact());
    assert_eq!(ctx.live_lists(), 0);
}

#[test]
fn or_trees_with_impossible_is_identity() {
    let mut ctx = RangeContext::default();
    let a = points(&mut ctx, 0, &[2, 3]);
    let ranged = on_slot(&mut ctx, 1, a);

    let out = ctx.or_trees(PredicateTree::impossible(SLOTS), ranged);

    assert_eq!(out.slot(1), a);
    assert!(!out.is_inexact());
    assert_healthy(&ctx, &out.roots());
}

///
/// OWNERSHIP
///

#[test]
fn retained_tree_shares_lists_until_released() {
    let mut ctx = RangeContext::default();
    let a = point(&mut ctx, 0, 3);
    let tree = on_slot(&mut ctx, 0, a);
    let id = a.expect("leaf list");

    let copy = ctx.retain_tree(&tree);
    assert_eq!(copy.slot(0), a);
    assert_eq!(ctx.list(id).refcount(), 2);

    ctx.release_tree(copy);
    assert_eq!(ctx.list(id).refcount(), 1);

    ctx.release_tree(tree);
    assert_eq!(ctx.live_lists(), 0);
}

#[test]
fn single_slot_tree_maps_special_lists() {
    let mut ctx = RangeContext::default();

    let impossible = ctx.impossible_list();
    let out = on_slot(&mut ctx, 0, Some(impossible));
    assert!(out.is_impossible());

    let out = on_slot(&mut ctx, 0, None);
    assert!(out.is_always_true());
    assert_eq!(ctx.live_lists(), 0);
}

#[test]
fn check_tree_rejects_impossible_slot() {
    let mut ctx = RangeContext::default();
    let impossible = ctx.impossible_list();
    let mut tree = PredicateTree::always_true(SLOTS, false);
    tree.set_slot(0, Some(impossible));
    tree.settle();

    assert!(ctx.check_tree(&tree).is_err());
    ctx.release_tree(tree);
}

///
/// VALIDATE
///

fn three_keypart_tree(ctx: &mut RangeContext) -> PredicateTree {
    let a = point(ctx, 0, 1);
    let b = point(ctx, 1, 5);
    let c = range(ctx, 2, inc(1), inc(3));
    let ab = ctx.and_lists(a, b);
    let abc = ctx.and_lists(ab, c);

    on_slot(ctx, 0, abc)
}

#[test]
fn keypart_sub_list_walks_unique_prefix() {
    let mut ctx = RangeContext::default();
    let tree = three_keypart_tree(&mut ctx);

    let root = ctx.keypart_sub_list(&tree, 0, 0).expect("root lookup");
    assert_eq!(root, tree.slot(0));

    let second = ctx
        .keypart_sub_list(&tree, 0, 1)
        .expect("prefix is unique")
        .expect("keypart 1 restricted");
    assert_eq!(ctx.list(second).keypart(), Some(1));

    let third = ctx
        .keypart_sub_list(&tree, 0, 2)
        .expect("prefix is unique")
        .expect("keypart 2 restricted");
    assert_eq!(spans(&ctx, third), vec![(inc(1), inc(3))]);

    assert_eq!(ctx.keypart_sub_list(&tree, 0, 3), Ok(None));
    ctx.release_tree(tree);
}

#[test]
fn keypart_sub_list_rejects_disjunctive_prefix() {
    let mut ctx = RangeContext::default();
    let a = points(&mut ctx, 0, &[1, 2]);
    let b = point(&mut ctx, 1, 5);
    let ab = ctx.and_lists(a, b);
    let tree = on_slot(&mut ctx, 0, ab);

    assert_eq!(
        ctx.keypart_sub_list(&tree, 0, 1),
        Err(KeypartLookupError::DisjunctivePrefix {
            index: 0,
            keypart: 0
        })
    );
    ctx.release_tree(tree);
}

#[test]
fn keypart_sub_list_reports_missing_index_and_bad_keypart() {
    let mut ctx = RangeContext::default();
    let tree = three_keypart_tree(&mut ctx);
    let limit = u16::try_from(MAX_KEYPARTS).expect("limit fits u16");

    assert_eq!(
        ctx.keypart_sub_list(&tree, 1, 0),
        Err(KeypartLookupError::NoRangeOnIndex { index: 1 })
    );
    assert_eq!(
        ctx.keypart_sub_list(&tree, 0, limit),
        Err(KeypartLookupError::KeypartOutOfRange {
            keypart: limit,
            max: MAX_KEYPARTS
        })
    );
    ctx.release_tree(tree);
}

#[test]
fn keypart_sub_list_skips_unconstrained_leading_keypart() {
    let mut ctx = RangeContext::default();
    let a = point(&mut ctx, 1, 4);
    let tree = on_slot(&mut ctx, 0, a);

    assert_eq!(ctx.keypart_sub_list(&tree, 0, 0), Ok(None));
    ctx.release_tree(tree);
}

#[test]
fn lookup_errors_classify_as_unsupported_plans() {
    let err: InternalError = KeypartLookupError::DisjunctivePrefix {
        index: 2,
        keypart: 1,
    }
    .into();

    assert_eq!(err.class, ErrorClass::Unsupported);
    assert_eq!(err.origin, ErrorOrigin::Plan);
    assert!(err.message.contains("keypart 1 of index 2"));
}
