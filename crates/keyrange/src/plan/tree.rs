use crate::{
    MAX_CANDIDATE_INDEXES,
    graph::{ListId, RangeContext},
    plan::IndexMergeAlternative,
};

///
/// TreeKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TreeKind {
    Impossible,
    AlwaysTrue,
    HasRanges,
}

///
/// IndexSet
///
/// Presence bitmap over candidate-index slots.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IndexSet(u64);

impl IndexSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn contains(self, index: usize) -> bool {
        index < MAX_CANDIDATE_INDEXES && self.0 & (1 << index) != 0
    }

    pub const fn insert(&mut self, index: usize) {
        debug_assert!(index < MAX_CANDIDATE_INDEXES);
        self.0 |= 1 << index;
    }

    pub const fn remove(&mut self, index: usize) {
        if index < MAX_CANDIDATE_INDEXES {
            self.0 &= !(1 << index);
        }
    }

    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Set slots in ascending order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        let mut bits = self.0;

        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let index = bits.trailing_zeros() as usize;
            bits &= bits - 1;

            Some(index)
        })
    }
}

///
/// PredicateTree
///
/// Per-index range description of one predicate.
///
/// Each present slot owns one reference to its list. Trees are not `Clone`:
/// duplicating one must go through `RangeContext::retain_tree` so refcounts
/// stay in step, and dropping one must go through `release_tree`.
///

#[derive(Debug, Eq, PartialEq)]
pub struct PredicateTree {
    pub(crate) kind: TreeKind,
    pub(crate) slots: Vec<Option<ListId>>,
    pub(crate) present: IndexSet,
    pub(crate) merges: Vec<IndexMergeAlternative>,
    pub(crate) inexact: bool,
}

impl PredicateTree {
    /// No index restriction. `inexact` marks an unrepresentable predicate
    /// whose rows must still be re-checked.
    #[must_use]
    pub fn always_true(slot_count: usize, inexact: bool) -> Self {
        Self::with_kind(TreeKind::AlwaysTrue, slot_count, inexact)
    }

    /// Provably empty predicate.
    #[must_use]
    pub fn impossible(slot_count: usize) -> Self {
        Self::with_kind(TreeKind::Impossible, slot_count, false)
    }

    fn with_kind(kind: TreeKind, slot_count: usize, inexact: bool) -> Self {
        debug_assert!(slot_count <= MAX_CANDIDATE_INDEXES);

        Self {
            kind,
            slots: vec![None; slot_count],
            present: IndexSet::empty(),
            merges: Vec::new(),
            inexact,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> TreeKind {
        self.kind
    }

    #[must_use]
    pub const fn is_impossible(&self) -> bool {
        matches!(self.kind, TreeKind::Impossible)
    }

    #[must_use]
    pub const fn is_always_true(&self) -> bool {
        matches!(self.kind, TreeKind::AlwaysTrue)
    }

    /// True when the described ranges may include rows that fail the
    /// original predicate.
    #[must_use]
    pub const fn is_inexact(&self) -> bool {
        self.inexact
    }

    #[must_use]
    pub const fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Range list for one candidate index, if any.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<ListId> {
        self.slots.get(index).copied().flatten()
    }

    #[must_use]
    pub const fn present(&self) -> IndexSet {
        self.present
    }

    #[must_use]
    pub fn merges(&self) -> &[IndexMergeAlternative] {
        &self.merges
    }

    /// Every list reference this tree owns, merges included.
    #[must_use]
    pub fn roots(&self) -> Vec<Option<ListId>> {
        let mut roots: Vec<Option<ListId>> = self.present.iter().map(|i| self.slots[i]).collect();
        for merge in &self.merges {
            for tree in merge.iter() {
                roots.extend(tree.roots());
            }
        }

        roots
    }

    pub(crate) fn set_slot(&mut self, index: usize, list: Option<ListId>) {
        self.slots[index] = list;
        if list.is_some() {
            self.present.insert(index);
        } else {
            self.present.remove(index);
        }
    }

    pub(crate) fn take_slot(&mut self, index: usize) -> Option<ListId> {
        self.present.remove(index);
        self.slots[index].take()
    }

    /// Recompute the kind of a non-impossible tree from its contents.
    pub(crate) fn settle(&mut self) {
        if self.is_impossible() {
            return;
        }
        self.kind = if self.present.is_empty() && self.merges.is_empty() {
            TreeKind::AlwaysTrue
        } else {
            TreeKind::HasRanges
        };
    }

    /// True when no slot holds a range (merges aside).
    #[must_use]
    pub const fn without_ranges(&self) -> bool {
        self.present.is_empty()
    }
}

impl RangeContext {
    /// Build a tree holding one list on one slot.
    ///
    /// `None` yields an always-true tree and an impossible list an
    /// impossible tree.
    pub fn single_slot_tree(
        &mut self,
        slot_count: usize,
        index: usize,
        list: Option<ListId>,
    ) -> PredicateTree {
        let Some(id) = list else {
            return PredicateTree::always_true(slot_count, self.take_inexact());
        };
        if self.list(id).is_impossible() {
            self.release(list);
            return PredicateTree::impossible(slot_count);
        }

        let mut tree = PredicateTree::always_true(slot_count, self.take_inexact());
        tree.set_slot(index, list);
        tree.settle();

        tree
    }

    /// Duplicate a tree, taking one more reference to every list it holds.
    pub fn retain_tree(&mut self, tree: &PredicateTree) -> PredicateTree {
        let mut copy = PredicateTree::with_kind(tree.kind, tree.slot_count(), tree.inexact);
        for index in tree.present.iter() {
            let list = self.retain(tree.slots[index]);
            copy.set_slot(index, list);
        }
        copy.merges = tree
            .merges
            .iter()
            .map(|merge| self.retain_merge(merge))
            .collect();

        copy
    }

    /// Drop every reference a tree holds.
    pub fn release_tree(&mut self, tree: PredicateTree) {
        for list in tree.slots {
            self.release(list);
        }
        for merge in tree.merges {
            for member in merge.into_trees() {
                self.release_tree(member);
            }
        }
    }
}
