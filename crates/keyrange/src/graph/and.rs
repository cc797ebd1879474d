//! Conjunction of interval lists.

use crate::{
    graph::{
        RangeContext,
        arena::ListId,
        bound::{cmp_max_max, cmp_min_min, is_nonempty},
        node::{IntervalNode, ListKind},
    },
    obs::{ComposeKind, MetricsEvent, sink},
};
use std::cmp::Ordering;

impl RangeContext {
    /// Intersect two lists, consuming one reference of each.
    ///
    /// Lists on different keyparts are combined by attaching the later one as
    /// a continuation of every interval of the earlier one. Absorbing an
    /// always-true operand is exact at this level.
    pub fn and_lists(&mut self, left: Option<ListId>, right: Option<ListId>) -> Option<ListId> {
        sink::record(MetricsEvent::Compose {
            kind: ComposeKind::ListAnd,
        });

        self.and_inner(left, right)
    }

    pub(crate) fn and_inner(
        &mut self,
        left: Option<ListId>,
        right: Option<ListId>,
    ) -> Option<ListId> {
        let (left, right) = match (left, right) {
            (None, other) | (other, None) => return other,
            (Some(left), Some(right)) => (left, right),
        };

        if left == right {
            self.release(Some(right));
            return Some(left);
        }

        match (self.arena[left].kind, self.arena[right].kind) {
            (ListKind::Impossible, _) => {
                self.release(Some(right));
                Some(left)
            }
            (_, ListKind::Impossible) => {
                self.release(Some(left));
                Some(right)
            }
            (ListKind::Deferred { .. }, ListKind::Deferred { .. }) => {
                self.release(Some(right));
                Some(left)
            }
            (ListKind::Deferred { .. }, ListKind::KeyRange { .. }) => {
                self.release(Some(left));
                Some(self.set_deferred(right))
            }
            (ListKind::KeyRange { .. }, ListKind::Deferred { .. }) => {
                self.release(Some(right));
                Some(self.set_deferred(left))
            }
            (
                ListKind::KeyRange {
                    keypart: left_part,
                    ..
                },
                ListKind::KeyRange {
                    keypart: right_part,
                    ..
                },
            ) => {
                if self.budget_exhausted() {
                    self.release(Some(left));
                    self.release(Some(right));
                    return None;
                }

                let list = match left_part.cmp(&right_part) {
                    Ordering::Equal => self.and_same_keypart(left, right),
                    Ordering::Less => self.and_later_keypart(left, right),
                    Ordering::Greater => self.and_later_keypart(right, left),
                };

                Some(list)
            }
        }
    }

    /// Attach `later` beneath every interval of `earlier`.
    ///
    /// Intervals sharing one continuation share one conjunction result.
    fn and_later_keypart(&mut self, earlier: ListId, later: ListId) -> ListId {
        let earlier = self.make_exclusive(earlier);
        let mut memo: Vec<(Option<ListId>, Option<ListId>)> = Vec::new();

        let mut cursor = self.arena[earlier].first();
        while let Some(id) = cursor.get() {
            cursor = self.arena[id].succ;

            let old = self.arena[id].next.take();
            let fresh = if let Some(&(_, cached)) = memo.iter().find(|(key, _)| *key == old) {
                self.release(old);
                self.retain(cached)
            } else {
                let later = self.retain(Some(later));
                let fresh = self.and_inner(old, later);
                memo.push((old, self.retain(fresh)));
                fresh
            };

            self.arena[id].next = fresh;
            if fresh.is_some_and(|next| self.arena[next].is_impossible()) {
                self.delete_interval(earlier, id);
            }
        }

        for (_, cached) in memo {
            self.release(cached);
        }
        self.release(Some(later));
        self.demote_if_empty(earlier);

        earlier
    }

    /// Sweep two sorted lists on one keypart, emitting pairwise overlaps.
    fn and_same_keypart(&mut self, left: ListId, right: ListId) -> ListId {
        let keypart = self.arena[left].keypart().unwrap_or_default();
        let deferred = self.arena[left].is_deferred() || self.arena[right].is_deferred();
        let out = self.empty_key_range(keypart, deferred);

        let mut a = self.arena[left].first();
        let mut b = self.arena[right].first();
        while let (Some(ia), Some(ib)) = (a.get(), b.get()) {
            let (na, nb) = (&self.arena[ia], &self.arena[ib]);

            let min = if cmp_min_min(&na.min, &nb.min).is_lt() {
                nb.min.clone()
            } else {
                na.min.clone()
            };
            let ends = cmp_max_max(&na.max, &nb.max).to_ordering();
            let max = if ends.is_lt() {
                na.max.clone()
            } else {
                nb.max.clone()
            };
            let (field, direction) = (na.field, na.direction);
            let (next_a, next_b) = (na.next, nb.next);

            if is_nonempty(&min, &max) {
                let next_a = self.retain(next_a);
                let next_b = self.retain(next_b);
                let next = self.and_inner(next_a, next_b);

                if next.is_some_and(|next| self.arena[next].is_impossible()) {
                    self.release(next);
                } else {
                    self.insert_interval(
                        out,
                        IntervalNode::detached(keypart, field, direction, min, max, next),
                    );
                }
            }

            match ends {
                Ordering::Less => a = self.arena[ia].succ,
                Ordering::Greater => b = self.arena[ib].succ,
                Ordering::Equal => {
                    a = self.arena[ia].succ;
                    b = self.arena[ib].succ;
                }
            }
        }

        self.release(Some(left));
        self.release(Some(right));
        self.demote_if_empty(out);

        out
    }
}
