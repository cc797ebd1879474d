//! Structural checks over the interval graph.
//!
//! These walk whole lists and are meant for debug builds and tests; release
//! composition never calls them.

use crate::{
    error::InternalError,
    graph::{
        RangeContext,
        arena::{IntervalId, ListId},
        bound::{BoundOrdering, cmp_max_min, cmp_min_min, is_nonempty},
        node::{Color, ListKind},
    },
};
use std::collections::{BTreeMap, BTreeSet};

///
/// RefcountMode
///
/// `Exact` requires each refcount to equal the owners found from the given
/// roots; `AtLeast` tolerates extra holders outside the walked roots.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefcountMode {
    Exact,
    AtLeast,
}

impl RangeContext {
    /// Verify tree shape, ordering, linkage and length of one list and all
    /// lists reachable from it.
    pub fn check_list(&self, list: ListId) -> Result<(), InternalError> {
        let mut seen = BTreeSet::new();
        let mut pending = vec![list];

        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            self.check_one_list(id)?;

            for interval in self.intervals(id) {
                if let Some(next) = self.arena[interval].next {
                    pending.push(next);
                }
            }
        }

        Ok(())
    }

    fn check_one_list(&self, list: ListId) -> Result<(), InternalError> {
        let node = &self.arena[list];
        if node.refcount == 0 {
            return Err(InternalError::graph_invariant(format!(
                "list {list:?} is reachable with refcount 0"
            )));
        }

        let ListKind::KeyRange {
            root,
            first,
            last,
            len,
            keypart,
            ..
        } = node.kind
        else {
            return Ok(());
        };

        if len == 0 {
            return Err(InternalError::graph_invariant(format!(
                "key range {list:?} has no intervals"
            )));
        }
        if let Some(root) = root.get() {
            if !self.arena[root].parent.is_nil() {
                return Err(InternalError::graph_invariant(format!(
                    "root of {list:?} has a parent"
                )));
            }
            if self.arena[root].color != Color::Black {
                return Err(InternalError::graph_invariant(format!(
                    "root of {list:?} is red"
                )));
            }
        }
        self.black_height(list, root)?;

        // Phase 1: in-order walk agrees with the threaded links.
        let mut in_order = Vec::with_capacity(len);
        self.collect_in_order(root, &mut in_order);
        let threaded: Vec<IntervalId> = self.intervals(list).collect();
        if in_order != threaded {
            return Err(InternalError::graph_invariant(format!(
                "threaded order of {list:?} disagrees with tree order"
            )));
        }
        if threaded.len() != len {
            return Err(InternalError::graph_invariant(format!(
                "{list:?} records len {len} but holds {}",
                threaded.len()
            )));
        }
        if threaded.first().copied() != first.get() || threaded.last().copied() != last.get() {
            return Err(InternalError::graph_invariant(format!(
                "first/last of {list:?} are stale"
            )));
        }

        // Phase 2: each interval is well-formed and strictly follows its
        // predecessor without overlap.
        for (pos, &id) in threaded.iter().enumerate() {
            let interval = &self.arena[id];
            if interval.keypart != keypart {
                return Err(InternalError::graph_invariant(format!(
                    "{id:?} in {list:?} is on keypart {} instead of {keypart}",
                    interval.keypart
                )));
            }
            if !is_nonempty(&interval.min, &interval.max) {
                return Err(InternalError::graph_invariant(format!(
                    "{id:?} in {list:?} is empty"
                )));
            }
            if let Some(next) = interval.next
                && self.arena[next]
                    .keypart()
                    .is_some_and(|later| later <= keypart)
            {
                return Err(InternalError::graph_invariant(format!(
                    "continuation of {id:?} does not move to a later keypart"
                )));
            }
            if pos > 0 {
                let prev = &self.arena[threaded[pos - 1]];
                if !cmp_min_min(&prev.min, &interval.min).is_lt()
                    || !matches!(
                        cmp_max_min(&prev.max, &interval.min),
                        BoundOrdering::Less | BoundOrdering::LessAdjacent
                    )
                {
                    return Err(InternalError::graph_invariant(format!(
                        "{id:?} in {list:?} overlaps its predecessor"
                    )));
                }
            }
        }

        Ok(())
    }

    fn collect_in_order(&self, node: IntervalId, out: &mut Vec<IntervalId>) {
        if let Some(id) = node.get() {
            self.collect_in_order(self.arena[id].left, out);
            out.push(id);
            self.collect_in_order(self.arena[id].right, out);
        }
    }

    // Black height of a subtree, or an error when a rule is broken.
    fn black_height(&self, list: ListId, node: IntervalId) -> Result<usize, InternalError> {
        let Some(id) = node.get() else {
            return Ok(1);
        };

        let interval = &self.arena[id];
        for child in [interval.left, interval.right] {
            if let Some(child) = child.get()
                && self.arena[child].parent != id
            {
                return Err(InternalError::graph_invariant(format!(
                    "{child:?} in {list:?} has a stale parent link"
                )));
            }
        }
        if interval.color == Color::Red
            && (self.color(interval.left) == Color::Red || self.color(interval.right) == Color::Red)
        {
            return Err(InternalError::graph_invariant(format!(
                "red {id:?} in {list:?} has a red child"
            )));
        }

        let left = self.black_height(list, interval.left)?;
        let right = self.black_height(list, interval.right)?;
        if left != right {
            return Err(InternalError::graph_invariant(format!(
                "black heights under {id:?} in {list:?} differ ({left} vs {right})"
            )));
        }

        Ok(left + usize::from(interval.color == Color::Black))
    }

    /// Count owners of every list reachable from `roots` and compare them with
    /// the stored refcounts.
    ///
    /// Each root entry counts as one owner, and so does each interval whose
    /// continuation points at the list.
    pub fn check_refcounts(
        &self,
        roots: &[Option<ListId>],
        mode: RefcountMode,
    ) -> Result<(), InternalError> {
        let mut owners: BTreeMap<ListId, u32> = BTreeMap::new();
        let mut visited = BTreeSet::new();
        let mut pending = Vec::new();

        for root in roots.iter().flatten() {
            *owners.entry(*root).or_default() += 1;
            pending.push(*root);
        }

        while let Some(id) = pending.pop() {
            if !visited.insert(id) {
                continue;
            }
            for interval in self.intervals(id) {
                if let Some(next) = self.arena[interval].next {
                    *owners.entry(next).or_default() += 1;
                    pending.push(next);
                }
            }
        }

        for (id, expected) in owners {
            let actual = self.arena[id].refcount;
            let ok = match mode {
                RefcountMode::Exact => actual == expected,
                RefcountMode::AtLeast => actual >= expected,
            };
            if !ok {
                return Err(InternalError::graph_invariant(format!(
                    "{id:?} has refcount {actual} but {expected} owners were found"
                )));
            }
        }

        Ok(())
    }

    /// Total number of live (refcount > 0) lists in the arena.
    #[must_use]
    pub fn live_lists(&self) -> usize {
        self.arena
            .lists()
            .filter(|(_, node)| node.refcount > 0)
            .count()
    }
}
