use crate::{
    graph::{ListId, RangeContext},
    leaf::{LeafBuilder, LeafOutcome, LeafTarget},
    model::IndexCatalog,
    plan::PredicateTree,
    predicate::{ComparePredicate, Predicate},
};

///
/// PredicateWalker
///
/// Compiles a predicate bottom-up: every comparison becomes one tree with a
/// slot per candidate index that covers its field, and boolean nodes fold
/// those trees through tree-level AND/OR.
///

#[derive(Debug)]
pub struct PredicateWalker<'a, B> {
    catalog: &'a IndexCatalog,
    builder: B,
}

impl<'a, B: LeafBuilder> PredicateWalker<'a, B> {
    #[must_use]
    pub const fn new(catalog: &'a IndexCatalog, builder: B) -> Self {
        Self { catalog, builder }
    }

    #[must_use]
    pub const fn catalog(&self) -> &IndexCatalog {
        self.catalog
    }

    /// Compile `predicate` into a tree owned by the caller.
    pub fn compile(&self, ctx: &mut RangeContext, predicate: &Predicate) -> PredicateTree {
        let slot_count = self.catalog.len();

        match predicate {
            Predicate::True => PredicateTree::always_true(slot_count, false),
            Predicate::False => PredicateTree::impossible(slot_count),
            Predicate::And(items) => {
                let mut items = items.iter();
                let Some(first) = items.next() else {
                    return PredicateTree::always_true(slot_count, false);
                };
                let mut acc = self.compile(ctx, first);
                for item in items {
                    let next = self.compile(ctx, item);
                    acc = ctx.and_trees(acc, next);
                }

                acc
            }
            Predicate::Or(items) => {
                let mut acc = PredicateTree::impossible(slot_count);
                for item in items {
                    let next = self.compile(ctx, item);
                    acc = ctx.or_trees(acc, next);
                }

                acc
            }
            Predicate::Not(inner) => self.compile_not(ctx, inner),
            Predicate::Compare(compare) => self.compile_compare(ctx, compare),
        }
    }

    // Negation only folds constants and double negation; anything else
    // is left to the residual filter.
    fn compile_not(&self, ctx: &mut RangeContext, inner: &Predicate) -> PredicateTree {
        let slot_count = self.catalog.len();

        match inner {
            Predicate::True => PredicateTree::impossible(slot_count),
            Predicate::False => PredicateTree::always_true(slot_count, false),
            Predicate::Not(pred) => self.compile(ctx, pred),
            _ => PredicateTree::always_true(slot_count, true),
        }
    }

    fn compile_compare(&self, ctx: &mut RangeContext, compare: &ComparePredicate) -> PredicateTree {
        let slot_count = self.catalog.len();
        let mut tree = PredicateTree::always_true(slot_count, false);

        for (slot, index) in self.catalog.iter() {
            // a field repeated inside one index constrains every position
            let mut acc: Option<ListId> = None;
            let mut built = false;

            for keypart in index.positions_of(compare.field) {
                let target = LeafTarget {
                    field: compare.field,
                    keypart,
                    direction: self.catalog.direction(slot, keypart),
                };
                let list = match self
                    .builder
                    .build(ctx, target, compare.op, &compare.operand)
                {
                    LeafOutcome::Unrepresentable => continue,
                    LeafOutcome::Impossible => {
                        ctx.release(acc);
                        ctx.release_tree(tree);
                        return PredicateTree::impossible(slot_count);
                    }
                    LeafOutcome::Range(list) => list,
                };

                acc = if built {
                    ctx.and_lists(acc, Some(list))
                } else {
                    Some(list)
                };
                built = true;
            }

            if acc.is_some_and(|id| ctx.list(id).is_impossible()) {
                ctx.release(acc);
                ctx.release_tree(tree);
                return PredicateTree::impossible(slot_count);
            }
            tree.set_slot(slot, acc);
        }

        tree.inexact = ctx.take_inexact() || tree.without_ranges();
        tree.settle();

        tree
    }
}
