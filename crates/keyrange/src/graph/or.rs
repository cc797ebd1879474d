//! Disjunction of interval lists.

use crate::{
    graph::{
        RangeContext,
        arena::{IntervalId, ListId},
        bound::{BoundOrdering, cmp_max_max, cmp_max_min, cmp_min_min, max_before, min_after},
        node::{IntervalNode, ListKind},
    },
    model::{Direction, FieldId},
    obs::{CollapseKind, ComposeKind, MetricsEvent, sink},
    value::Datum,
};
use std::{cmp::Ordering, ops::Bound};

///
/// Fragment
///
/// Detached piece of the right-hand operand being merged into the result.
/// Owns one reference to its continuation.
///

struct Fragment {
    field: FieldId,
    direction: Direction,
    min: Bound<Datum>,
    max: Bound<Datum>,
    next: Option<ListId>,
}

impl RangeContext {
    /// Union two lists, consuming one reference of each.
    ///
    /// Lists anchored on different keyparts cannot be unioned without losing
    /// precision; the result is then always-true and the context is marked
    /// inexact.
    pub fn or_lists(&mut self, left: Option<ListId>, right: Option<ListId>) -> Option<ListId> {
        sink::record(MetricsEvent::Compose {
            kind: ComposeKind::ListOr,
        });

        self.or_inner(left, right)
    }

    pub(crate) fn or_inner(
        &mut self,
        left: Option<ListId>,
        right: Option<ListId>,
    ) -> Option<ListId> {
        let (left, right) = match (left, right) {
            (None, other) | (other, None) => {
                self.release(other);
                return None;
            }
            (Some(left), Some(right)) => (left, right),
        };

        if left == right {
            self.release(Some(right));
            return Some(left);
        }

        match (self.arena[left].kind, self.arena[right].kind) {
            (ListKind::Impossible, _) => {
                self.release(Some(left));
                Some(right)
            }
            (_, ListKind::Impossible) => {
                self.release(Some(right));
                Some(left)
            }
            (ListKind::Deferred { .. }, _) => {
                self.release(Some(right));
                Some(left)
            }
            (_, ListKind::Deferred { .. }) => {
                self.release(Some(left));
                Some(right)
            }
            (
                ListKind::KeyRange {
                    keypart: left_part,
                    len: left_len,
                    ..
                },
                ListKind::KeyRange {
                    keypart: right_part,
                    len: right_len,
                    ..
                },
            ) => {
                if left_part != right_part {
                    self.release(Some(left));
                    self.release(Some(right));
                    self.mark_inexact();
                    return None;
                }
                if self.budget_exhausted() {
                    self.release(Some(left));
                    self.release(Some(right));
                    return None;
                }
                if self.lists_equal(Some(left), Some(right)) {
                    self.release(Some(right));
                    return Some(left);
                }

                // merge into an owned operand when possible, else the longer one
                let left_owned = self.arena[left].refcount == 1;
                let right_owned = self.arena[right].refcount == 1;
                let keep_left = match (left_owned, right_owned) {
                    (true, false) => true,
                    (false, true) => false,
                    _ => left_len >= right_len,
                };

                if keep_left {
                    self.or_same_keypart(left, right)
                } else {
                    self.or_same_keypart(right, left)
                }
            }
        }
    }

    fn or_same_keypart(&mut self, base: ListId, other: ListId) -> Option<ListId> {
        let other_deferred = self.arena[other].is_deferred();
        let base = self.make_exclusive(base);
        if other_deferred
            && let ListKind::KeyRange { deferred, .. } = &mut self.arena[base].kind
        {
            *deferred = true;
        }

        // Phase 1: detach the other operand into owned fragments.
        let mut fragments = Vec::with_capacity(self.arena[other].len());
        let mut cursor = self.arena[other].first();
        while let Some(id) = cursor.get() {
            let node = &self.arena[id];
            let fragment = Fragment {
                field: node.field,
                direction: node.direction,
                min: node.min.clone(),
                max: node.max.clone(),
                next: node.next,
            };
            cursor = node.succ;

            self.retain(fragment.next);
            fragments.push(fragment);
        }
        self.release(Some(other));

        // Phase 2: merge each fragment.
        for fragment in fragments {
            self.merge_fragment(base, fragment);
        }

        // Phase 3: a fused (-inf, +inf) interval collapses the list.
        let first = self.arena[base].first();
        if let Some(first) = first.get()
            && matches!(
                (&self.arena[first].min, &self.arena[first].max),
                (Bound::Unbounded, Bound::Unbounded)
            )
        {
            return self.collapse_full(base, first);
        }

        Some(base)
    }

    fn collapse_full(&mut self, list: ListId, full: IntervalId) -> Option<ListId> {
        let node = &self.arena[full];
        let (keypart, field, had_next) = (node.keypart, node.field, node.next.is_some());
        let deferred = self.arena[list].is_deferred();

        if had_next {
            self.mark_inexact();
        }
        self.release(Some(list));
        sink::record(MetricsEvent::Collapsed {
            kind: CollapseKind::AlwaysTrue,
        });

        deferred.then(|| self.deferred_list(keypart, field))
    }

    /// Merge one fragment into an owned list, splitting where continuations
    /// differ and fusing where they are equal.
    fn merge_fragment(&mut self, list: ListId, mut cur: Fragment) {
        let keypart = self.arena[list].keypart().unwrap_or_default();
        let mut cursor = self.first_reaching(list, &cur.min);

        loop {
            let Some(x) = cursor.get() else {
                self.insert_fragment(list, keypart, cur);
                return;
            };

            // gap before x
            if cmp_max_min(&cur.max, &self.arena[x].min) == BoundOrdering::Less {
                self.insert_fragment(list, keypart, cur);
                return;
            }

            let xn = &self.arena[x];
            if self.lists_equal(xn.next, cur.next) {
                // fuse x into the fragment and keep scanning
                if cmp_min_min(&xn.min, &cur.min).is_lt() {
                    cur.min = xn.min.clone();
                }
                if cmp_max_max(&xn.max, &cur.max).is_gt() {
                    cur.max = xn.max.clone();
                }
                cursor = xn.succ;

                self.rb_remove(list, x);
                let stale = self.arena[x].next.take();
                self.release(stale);
                continue;
            }

            // touching only, with different continuations
            if cmp_max_min(&xn.max, &cur.min) == BoundOrdering::LessAdjacent {
                cursor = xn.succ;
                continue;
            }
            if cmp_max_min(&cur.max, &xn.min) == BoundOrdering::LessAdjacent {
                self.insert_fragment(list, keypart, cur);
                return;
            }

            // Phase 1: align the lower bounds.
            match cmp_min_min(&cur.min, &xn.min).to_ordering() {
                Ordering::Less => {
                    let head = Fragment {
                        field: cur.field,
                        direction: cur.direction,
                        min: cur.min.clone(),
                        max: max_before(&xn.min),
                        next: cur.next,
                    };
                    cur.min = xn.min.clone();
                    self.retain(head.next);
                    self.insert_fragment(list, keypart, head);
                }
                Ordering::Greater => {
                    let head = Fragment {
                        field: xn.field,
                        direction: xn.direction,
                        min: xn.min.clone(),
                        max: max_before(&cur.min),
                        next: xn.next,
                    };
                    self.arena[x].min = cur.min.clone();
                    self.retain(head.next);
                    self.insert_fragment(list, keypart, head);
                }
                Ordering::Equal => {}
            }

            // Phase 2: union the overlapping part and carry the remainder.
            match cmp_max_max(&cur.max, &self.arena[x].max).to_ordering() {
                Ordering::Equal => {
                    self.or_into(x, cur.next);
                    return;
                }
                Ordering::Less => {
                    let xn = &self.arena[x];
                    let tail = Fragment {
                        field: xn.field,
                        direction: xn.direction,
                        min: min_after(&cur.max),
                        max: xn.max.clone(),
                        next: xn.next,
                    };
                    self.arena[x].max = cur.max.clone();
                    self.retain(tail.next);
                    self.insert_fragment(list, keypart, tail);
                    self.or_into(x, cur.next);
                    return;
                }
                Ordering::Greater => {
                    let carried = self.retain(cur.next);
                    self.or_into(x, carried);
                    cur.min = min_after(&self.arena[x].max);
                    cursor = self.arena[x].succ;
                }
            }
        }
    }

    /// Replace the continuation of `x` with its union with `next`.
    fn or_into(&mut self, x: IntervalId, next: Option<ListId>) {
        let current = self.arena[x].next.take();
        self.arena[x].next = self.or_inner(current, next);
    }

    fn insert_fragment(&mut self, list: ListId, keypart: u16, fragment: Fragment) {
        self.insert_interval(
            list,
            IntervalNode::detached(
                keypart,
                fragment.field,
                fragment.direction,
                fragment.min,
                fragment.max,
                fragment.next,
            ),
        );
    }
}
