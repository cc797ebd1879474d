//! Tree-level AND/OR over every candidate-index slot.

use crate::{
    error::InternalError,
    graph::{RangeContext, RefcountMode},
    obs::{ComposeKind, MetricsEvent, sink},
    plan::{IndexMergeAlternative, IndexSet, PredicateTree, merge::MergeOutcome},
};

impl RangeContext {
    ///
    /// AND
    ///

    /// Conjunction of two trees, consuming both.
    ///
    /// Slots are intersected pairwise; merge alternatives of both sides are
    /// kept side by side without expansion.
    pub fn and_trees(&mut self, left: PredicateTree, right: PredicateTree) -> PredicateTree {
        sink::record(MetricsEvent::Compose {
            kind: ComposeKind::TreeAnd,
        });
        let pending = self.take_inexact();

        let mut out = self.and_trees_inner(left, right);
        out.inexact |= pending | self.take_inexact();

        #[cfg(debug_assertions)]
        self.debug_check_tree(&out);

        out
    }

    fn and_trees_inner(&mut self, mut left: PredicateTree, right: PredicateTree) -> PredicateTree {
        debug_assert_eq!(left.slot_count(), right.slot_count());

        if left.is_impossible() {
            self.release_tree(right);
            return left;
        }
        if right.is_impossible() {
            self.release_tree(left);
            return right;
        }
        if right.is_always_true() {
            left.inexact |= right.inexact;
            return left;
        }
        if left.is_always_true() {
            let mut right = right;
            right.inexact |= left.inexact;
            return right;
        }

        let mut inexact = left.inexact || right.inexact;
        let PredicateTree {
            slots: right_slots,
            merges: right_merges,
            ..
        } = right;

        // Phase 1: intersect slot by slot.
        let mut impossible = false;
        for (index, right_list) in right_slots.into_iter().enumerate() {
            let left_list = left.take_slot(index);
            if impossible {
                self.release(left_list);
                self.release(right_list);
                continue;
            }

            let list = match (left_list, right_list) {
                (None, None) => continue,
                (Some(_), None) | (None, Some(_)) => {
                    inexact = true;
                    left_list.or(right_list)
                }
                (Some(_), Some(_)) => self.and_inner(left_list, right_list),
            };

            if list.is_some_and(|id| self.list(id).is_impossible()) {
                self.release(list);
                impossible = true;
                continue;
            }
            left.set_slot(index, list);
        }
        if impossible {
            return self.impossible_from(left, right_merges);
        }

        // Phase 2: keep both merge lists as a logical product.
        left.merges.extend(right_merges);
        if !left.merges.is_empty() {
            inexact = true;
        }

        left.inexact = inexact;
        left.settle();

        left
    }

    ///
    /// OR
    ///

    /// Disjunction of two trees, consuming both.
    pub fn or_trees(&mut self, left: PredicateTree, right: PredicateTree) -> PredicateTree {
        sink::record(MetricsEvent::Compose {
            kind: ComposeKind::TreeOr,
        });
        let pending = self.take_inexact();

        let mut out = self.or_trees_inner(left, right);
        out.inexact |= pending | self.take_inexact();

        #[cfg(debug_assertions)]
        self.debug_check_tree(&out);

        out
    }

    pub(crate) fn or_trees_inner(
        &mut self,
        left: PredicateTree,
        right: PredicateTree,
    ) -> PredicateTree {
        debug_assert_eq!(left.slot_count(), right.slot_count());
        let slot_count = left.slot_count();

        if left.is_impossible() {
            self.release_tree(left);
            return right;
        }
        if right.is_impossible() {
            self.release_tree(right);
            return left;
        }
        if left.is_always_true() || right.is_always_true() {
            let inexact = left.inexact || right.inexact;
            self.release_tree(left);
            self.release_tree(right);
            return PredicateTree::always_true(slot_count, inexact);
        }

        let common = self.common_ored_slots(&left, &right);
        if !common.is_empty() {
            return self.or_common_slots(left, right, common);
        }

        let mut inexact = left.inexact || right.inexact;
        let merges = match (left.merges.is_empty(), right.merges.is_empty()) {
            // Phase 1: two plain range trees start a new alternative.
            (true, true) => {
                sink::record(MetricsEvent::IndexMergeFallback);
                let (left, right) = if self.config().discard_ungrounded_scans {
                    (self.discard_ungrounded(left), self.discard_ungrounded(right))
                } else {
                    (left, right)
                };
                inexact |= left.inexact || right.inexact;

                if left.without_ranges() || right.without_ranges() {
                    self.release_tree(left);
                    self.release_tree(right);
                    Vec::new()
                } else {
                    match self.merge_pair(left, right) {
                        MergeOutcome::Kept(merge) => vec![merge],
                        MergeOutcome::AlwaysTrue => Vec::new(),
                    }
                }
            }

            // Phase 2: two merge-bearing trees OR their first alternatives;
            // their own ranges and later alternatives are given up.
            (false, false) => {
                inexact |= !left.without_ranges()
                    || !right.without_ranges()
                    || left.merges.len() > 1
                    || right.merges.len() > 1;
                let left_merge = self.detach_first_merge(left);
                let right_merge = self.detach_first_merge(right);

                match self.merge_or_merge(left_merge, right_merge) {
                    MergeOutcome::Kept(merge) => vec![merge],
                    MergeOutcome::AlwaysTrue => Vec::new(),
                }
            }

            // Phase 3: a range tree is folded into every alternative.
            (false, true) | (true, false) => {
                let (with_merges, ranges) = if left.merges.is_empty() {
                    (right, left)
                } else {
                    (left, right)
                };
                inexact |= !with_merges.without_ranges();
                let ranges = if self.config().discard_ungrounded_scans {
                    self.discard_ungrounded(ranges)
                } else {
                    ranges
                };
                inexact |= ranges.inexact;

                self.fold_into_merges(with_merges, ranges)
            }
        };

        if merges.is_empty() {
            return PredicateTree::always_true(slot_count, true);
        }

        let mut out = PredicateTree::always_true(slot_count, inexact);
        out.merges = merges;
        out.settle();

        out
    }

    /// Slots both trees hold, anchored on the same keypart.
    pub(crate) fn common_ored_slots(
        &self,
        left: &PredicateTree,
        right: &PredicateTree,
    ) -> IndexSet {
        let mut common = IndexSet::empty();
        for index in left.present().intersection(right.present()).iter() {
            let (Some(a), Some(b)) = (left.slot(index), right.slot(index)) else {
                continue;
            };
            if self.list(a).keypart() == self.list(b).keypart() {
                common.insert(index);
            }
        }

        common
    }

    fn or_common_slots(
        &mut self,
        mut left: PredicateTree,
        mut right: PredicateTree,
        common: IndexSet,
    ) -> PredicateTree {
        let slot_count = left.slot_count();
        let mut out = PredicateTree::always_true(slot_count, left.inexact || right.inexact);

        for index in common.iter() {
            let a = left.take_slot(index);
            let b = right.take_slot(index);
            let list = self.or_inner(a, b);
            out.set_slot(index, list);
        }

        // anything not unified is given up
        if !left.without_ranges()
            || !right.without_ranges()
            || !left.merges.is_empty()
            || !right.merges.is_empty()
        {
            out.inexact = true;
        }
        self.release_tree(left);
        self.release_tree(right);

        if out.without_ranges() {
            out.inexact = true;
        }
        out.settle();

        out
    }

    fn detach_first_merge(&mut self, mut tree: PredicateTree) -> IndexMergeAlternative {
        let first = tree.merges.remove(0);
        self.release_tree(tree);

        first
    }

    /// `(M1 AND M2) OR T` becomes `(M1 OR T) AND (M2 OR T)`; alternatives
    /// that turn always-true drop out of the conjunction.
    fn fold_into_merges(
        &mut self,
        mut with_merges: PredicateTree,
        ranges: PredicateTree,
    ) -> Vec<IndexMergeAlternative> {
        let merges = std::mem::take(&mut with_merges.merges);
        self.release_tree(with_merges);

        if ranges.without_ranges() {
            self.release_tree(ranges);
            for merge in merges {
                self.release_merge(merge);
            }
            return Vec::new();
        }

        let mut kept = Vec::with_capacity(merges.len());
        for merge in merges {
            let copy = self.retain_tree(&ranges);
            if let MergeOutcome::Kept(merge) = self.merge_add_tree(merge, copy) {
                kept.push(merge);
            }
        }
        self.release_tree(ranges);

        kept
    }

    /// Drop slots that cannot drive a scan on their own.
    fn discard_ungrounded(&mut self, mut tree: PredicateTree) -> PredicateTree {
        for index in tree.present().iter() {
            let grounded = tree
                .slot(index)
                .is_some_and(|id| self.list(id).keypart() == Some(0));
            if !grounded {
                let list = tree.take_slot(index);
                self.release(list);
                tree.inexact = true;
            }
        }
        tree.settle();

        tree
    }

    fn impossible_from(
        &mut self,
        left: PredicateTree,
        right_merges: Vec<IndexMergeAlternative>,
    ) -> PredicateTree {
        let slot_count = left.slot_count();
        self.release_tree(left);
        for merge in right_merges {
            self.release_merge(merge);
        }

        PredicateTree::impossible(slot_count)
    }

    ///
    /// CHECKS
    ///

    /// Verify every list a tree owns plus the merge-member invariants.
    pub fn check_tree(&self, tree: &PredicateTree) -> Result<(), InternalError> {
        let roots = tree.roots();
        for root in roots.iter().flatten() {
            self.check_list(*root)?;
            if self.list(*root).is_impossible() {
                return Err(InternalError::plan_invariant(format!(
                    "tree holds impossible list {root:?} in a slot"
                )));
            }
        }
        self.check_refcounts(&roots, RefcountMode::AtLeast)?;

        for merge in tree.merges() {
            let mut seen = IndexSet::empty();
            for member in merge.iter() {
                if !member.merges().is_empty() {
                    return Err(InternalError::plan_invariant(
                        "merge member carries its own merges",
                    ));
                }
                if !seen.intersection(member.present()).is_empty() {
                    return Err(InternalError::plan_invariant(
                        "two merge members hold ranges on the same index",
                    ));
                }
                for index in member.present().iter() {
                    seen.insert(index);
                }
            }
        }

        Ok(())
    }

    #[cfg(debug_assertions)]
    fn debug_check_tree(&self, tree: &PredicateTree) {
        if let Err(err) = self.check_tree(tree) {
            panic!("{}", err.display_with_class());
        }
    }
}
