use crate::{
    graph::RangeContext,
    plan::{IndexSet, PredicateTree},
};
use derive_more::Deref;

///
/// IndexMergeAlternative
///
/// Disjunction of independent single-index plans.
/// No two member trees hold a range on the same index, and members never
/// carry merges of their own.
///

#[derive(Debug, Default, Deref, Eq, PartialEq)]
pub struct IndexMergeAlternative {
    trees: Vec<PredicateTree>,
}

impl IndexMergeAlternative {
    pub(crate) fn into_trees(self) -> Vec<PredicateTree> {
        self.trees
    }

    /// Union of the slots held by all members.
    #[must_use]
    pub fn indexes(&self) -> IndexSet {
        let mut set = IndexSet::empty();
        for tree in &self.trees {
            for index in tree.present().iter() {
                set.insert(index);
            }
        }

        set
    }
}

///
/// MergeOutcome
///

#[derive(Debug)]
pub(crate) enum MergeOutcome {
    Kept(IndexMergeAlternative),
    AlwaysTrue,
}

impl RangeContext {
    pub(crate) fn retain_merge(&mut self, merge: &IndexMergeAlternative) -> IndexMergeAlternative {
        IndexMergeAlternative {
            trees: merge.trees.iter().map(|tree| self.retain_tree(tree)).collect(),
        }
    }

    pub(crate) fn release_merge(&mut self, merge: IndexMergeAlternative) {
        for tree in merge.trees {
            self.release_tree(tree);
        }
    }

    /// Start an alternative from two range trees that cannot be unified.
    pub(crate) fn merge_pair(&mut self, left: PredicateTree, right: PredicateTree) -> MergeOutcome {
        match self.merge_add_tree(IndexMergeAlternative::default(), left) {
            MergeOutcome::Kept(merge) => self.merge_add_tree(merge, right),
            MergeOutcome::AlwaysTrue => {
                self.release_tree(right);
                MergeOutcome::AlwaysTrue
            }
        }
    }

    /// Fold one range tree into an alternative.
    ///
    /// The tree is ORed into the first member it can be unified with;
    /// otherwise it is appended after giving up any index another member
    /// already holds.
    pub(crate) fn merge_add_tree(
        &mut self,
        mut merge: IndexMergeAlternative,
        mut tree: PredicateTree,
    ) -> MergeOutcome {
        debug_assert!(tree.merges().is_empty(), "merge members carry no merges");

        if let Some(pos) = merge
            .trees
            .iter()
            .position(|member| !self.common_ored_slots(member, &tree).is_empty())
        {
            let member = merge.trees.swap_remove(pos);
            let ored = self.or_trees_inner(member, tree);
            if ored.is_always_true() {
                self.release_tree(ored);
                self.release_merge(merge);
                return MergeOutcome::AlwaysTrue;
            }
            merge.trees.push(ored);

            return MergeOutcome::Kept(merge);
        }

        // Phase 1: give up indexes another member already covers.
        let taken = merge.indexes().intersection(tree.present());
        if !taken.is_empty() {
            for index in taken.iter() {
                let list = tree.take_slot(index);
                self.release(list);
            }
            tree.inexact = true;
            tree.settle();
        }
        if tree.without_ranges() {
            self.release_tree(tree);
            self.release_merge(merge);
            return MergeOutcome::AlwaysTrue;
        }

        // Phase 2: append within the size cap.
        if merge.trees.len() >= self.config().max_merge_trees {
            self.release_tree(tree);
            self.release_merge(merge);
            self.mark_inexact();
            return MergeOutcome::AlwaysTrue;
        }
        merge.trees.push(tree);

        MergeOutcome::Kept(merge)
    }

    /// OR every member of `right` into `left`.
    pub(crate) fn merge_or_merge(
        &mut self,
        left: IndexMergeAlternative,
        right: IndexMergeAlternative,
    ) -> MergeOutcome {
        let mut acc = Some(left);

        for tree in right.trees {
            match acc.take() {
                Some(merge) => {
                    if let MergeOutcome::Kept(next) = self.merge_add_tree(merge, tree) {
                        acc = Some(next);
                    }
                }
                // already collapsed; remaining members are dropped
                None => self.release_tree(tree),
            }
        }

        acc.map_or(MergeOutcome::AlwaysTrue, MergeOutcome::Kept)
    }
}
