//! Arena storage for interval and list nodes.
//!
//! Nodes are appended and never freed individually; a whole arena is dropped
//! when its compilation pass ends. Links between nodes are plain indices, so
//! rotations and re-linking are index swaps.

use crate::graph::node::{IntervalNode, ListNode};
use std::{
    fmt,
    ops::{Index, IndexMut},
};

///
/// IntervalId
///
/// Index of one interval node. `NIL` is the reserved sentinel used for absent
/// tree and list links.
///

#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct IntervalId(u32);

impl IntervalId {
    pub const NIL: Self = Self(u32::MAX);

    #[must_use]
    pub const fn is_nil(self) -> bool {
        self.0 == u32::MAX
    }

    /// `None` for the sentinel, `Some(self)` otherwise.
    #[must_use]
    pub const fn get(self) -> Option<Self> {
        if self.is_nil() { None } else { Some(self) }
    }

    const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            write!(f, "I(nil)")
        } else {
            write!(f, "I{}", self.0)
        }
    }
}

///
/// ListId
///
/// Index of one interval-list node.
///

#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ListId(u32);

impl ListId {
    const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

///
/// RangeArena
///
/// Bump-style storage for one compilation pass.
///

#[derive(Debug, Default)]
pub(crate) struct RangeArena {
    intervals: Vec<IntervalNode>,
    lists: Vec<ListNode>,
}

impl RangeArena {
    /// Number of interval nodes ever allocated in this arena.
    pub(crate) const fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Store an interval node and return its index.
    ///
    /// # Panics
    ///
    /// Panics if the arena would grow to the sentinel index.
    pub(crate) fn push_interval(&mut self, node: IntervalNode) -> IntervalId {
        let id = u32::try_from(self.intervals.len())
            .ok()
            .filter(|raw| *raw != u32::MAX)
            .expect("interval arena exhausted its index space");
        self.intervals.push(node);

        IntervalId(id)
    }

    /// Store a list node and return its index.
    ///
    /// # Panics
    ///
    /// Panics if the arena outgrows the `u32` index space.
    pub(crate) fn push_list(&mut self, node: ListNode) -> ListId {
        let id = u32::try_from(self.lists.len()).expect("list arena exhausted its index space");
        self.lists.push(node);

        ListId(id)
    }

    /// Iterate over all list nodes in allocation order.
    pub(crate) fn lists(&self) -> impl Iterator<Item = (ListId, &ListNode)> {
        self.lists
            .iter()
            .enumerate()
            .filter_map(|(slot, node)| u32::try_from(slot).ok().map(|raw| (ListId(raw), node)))
    }
}

impl Index<IntervalId> for RangeArena {
    type Output = IntervalNode;

    fn index(&self, id: IntervalId) -> &Self::Output {
        debug_assert!(!id.is_nil(), "dereferenced the nil interval sentinel");
        &self.intervals[id.slot()]
    }
}

impl IndexMut<IntervalId> for RangeArena {
    fn index_mut(&mut self, id: IntervalId) -> &mut Self::Output {
        debug_assert!(!id.is_nil(), "dereferenced the nil interval sentinel");
        &mut self.intervals[id.slot()]
    }
}

impl Index<ListId> for RangeArena {
    type Output = ListNode;

    fn index(&self, id: ListId) -> &Self::Output {
        &self.lists[id.slot()]
    }
}

impl IndexMut<ListId> for RangeArena {
    fn index_mut(&mut self, id: ListId) -> &mut Self::Output {
        &mut self.lists[id.slot()]
    }
}
