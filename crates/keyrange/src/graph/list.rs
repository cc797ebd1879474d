//! Reference counting, copy-on-write and structural queries over lists.

use crate::{
    graph::{
        RangeContext,
        arena::{IntervalId, ListId},
        bound::contains_datum,
        node::{IntervalNode, ListKind},
    },
    obs::{MetricsEvent, sink},
    value::Datum,
};
use std::ops::Bound;

impl RangeContext {
    ///
    /// REFERENCES
    ///

    /// Take one more reference to `list` and hand it back.
    pub fn retain(&mut self, list: Option<ListId>) -> Option<ListId> {
        if let Some(id) = list {
            let node = &mut self.arena[id];
            node.refcount = node.refcount.saturating_add(1);
        }

        list
    }

    /// Drop one reference; a list reaching zero drops its continuations.
    pub fn release(&mut self, list: Option<ListId>) {
        let mut pending: Vec<ListId> = list.into_iter().collect();

        while let Some(id) = pending.pop() {
            let node = &mut self.arena[id];
            debug_assert!(node.refcount > 0, "released a dead list {id:?}");
            node.refcount = node.refcount.saturating_sub(1);
            if node.refcount > 0 {
                continue;
            }

            let mut cursor = node.first();
            while let Some(interval) = cursor.get() {
                let interval = &mut self.arena[interval];
                if let Some(next) = interval.next.take() {
                    pending.push(next);
                }
                cursor = interval.succ;
            }
        }
    }

    /// Return a list this caller may mutate, cloning it when shared.
    ///
    /// Consumes the caller's reference to `list` and returns an owned,
    /// exclusively held list with the same contents.
    pub(crate) fn make_exclusive(&mut self, list: ListId) -> ListId {
        if self.arena[list].refcount <= 1 {
            return list;
        }

        let copy = self.clone_list(list);
        self.arena[list].refcount -= 1;

        copy
    }

    /// Shallow copy: new interval nodes, shared continuations.
    fn clone_list(&mut self, list: ListId) -> ListId {
        let kind = self.arena[list].kind;
        let (keypart, deferred) = match kind {
            ListKind::KeyRange {
                keypart, deferred, ..
            } => (keypart, deferred),
            ListKind::Deferred { keypart, field } => return self.deferred_list(keypart, field),
            ListKind::Impossible => return self.impossible_list(),
        };

        let copy = self.empty_key_range(keypart, deferred);
        let mut cursor = self.arena[list].first();
        let mut copied = 0u64;
        while let Some(id) = cursor.get() {
            let source = &self.arena[id];
            let node = IntervalNode::detached(
                source.keypart,
                source.field,
                source.direction,
                source.min.clone(),
                source.max.clone(),
                source.next,
            );
            cursor = source.succ;

            self.retain(node.next);
            let fresh = self.alloc_interval(node);
            self.rb_insert(copy, fresh);
            copied += 1;
        }

        sink::record(MetricsEvent::ListCloned { intervals: copied });

        copy
    }

    /// Mark an owned key range as depending on a deferred value.
    pub(crate) fn set_deferred(&mut self, list: ListId) -> ListId {
        if let ListKind::KeyRange { deferred: true, .. } = self.arena[list].kind {
            return list;
        }

        let list = self.make_exclusive(list);
        if let ListKind::KeyRange { deferred, .. } = &mut self.arena[list].kind {
            *deferred = true;
        }

        list
    }

    ///
    /// INTERVAL EDITS
    ///

    /// Allocate and link a new interval into an owned list.
    pub(crate) fn insert_interval(&mut self, list: ListId, node: IntervalNode) -> IntervalId {
        let id = self.alloc_interval(node);
        self.rb_insert(list, id);

        id
    }

    /// Unlink an interval, drop its continuation, and demote an emptied list.
    pub(crate) fn delete_interval(&mut self, list: ListId, interval: IntervalId) {
        self.rb_remove(list, interval);
        let next = self.arena[interval].next.take();
        self.release(next);
        self.demote_if_empty(list);
    }

    ///
    /// QUERIES
    ///

    /// Structural equality: same intervals with equal continuations.
    #[must_use]
    pub fn lists_equal(&self, left: Option<ListId>, right: Option<ListId>) -> bool {
        let (left, right) = match (left, right) {
            (None, None) => return true,
            (Some(left), Some(right)) => (left, right),
            _ => return false,
        };
        if left == right {
            return true;
        }

        match (self.arena[left].kind, self.arena[right].kind) {
            (ListKind::Impossible, ListKind::Impossible) => true,
            (
                ListKind::Deferred { keypart: a, .. },
                ListKind::Deferred { keypart: b, .. },
            ) => a == b,
            (
                ListKind::KeyRange {
                    keypart: kp_a,
                    len: len_a,
                    deferred: def_a,
                    ..
                },
                ListKind::KeyRange {
                    keypart: kp_b,
                    len: len_b,
                    deferred: def_b,
                    ..
                },
            ) => {
                if kp_a != kp_b || len_a != len_b || def_a != def_b {
                    return false;
                }

                self.intervals(left).zip(self.intervals(right)).all(|(a, b)| {
                    let (a, b) = (&self.arena[a], &self.arena[b]);
                    a.min == b.min && a.max == b.max && self.lists_equal(a.next, b.next)
                })
            }
            _ => false,
        }
    }

    /// Brute-force membership of a full key tuple.
    ///
    /// Deferred lists and missing tuple components count as matching, so this
    /// answers "may the scan return this tuple".
    #[must_use]
    pub fn contains(&self, list: Option<ListId>, tuple: &[Datum]) -> bool {
        let Some(id) = list else {
            return true;
        };

        match self.arena[id].kind {
            ListKind::Impossible => false,
            ListKind::Deferred { .. } => true,
            ListKind::KeyRange { keypart, .. } => {
                let Some(value) = tuple.get(usize::from(keypart)) else {
                    return true;
                };

                let probe = Bound::Included(value.clone());
                let Some(floor) = self.find_floor(id, &probe).get() else {
                    return false;
                };
                let node = &self.arena[floor];

                contains_datum(&node.min, &node.max, value) && self.contains(node.next, tuple)
            }
        }
    }
}
