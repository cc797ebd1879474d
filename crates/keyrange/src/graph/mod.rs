//! Shared interval graph: arena-backed interval lists, their copy-on-write
//! reference counting, and the AND/OR composition primitives.
//!
//! Ownership contract: every `Option<ListId>` handed to a composition routine
//! carries one reference that the routine consumes, and every returned handle
//! carries one reference owned by the caller. `None` means "no restriction"
//! (always-true). Shared lists are never mutated in place.

mod and;
mod arena;
mod bound;
mod invariants;
mod key;
mod list;
mod node;
mod or;
mod rbtree;


pub use arena::{IntervalId, ListId};
pub use bound::{
    BoundOrdering, cmp_max_max, cmp_max_min, cmp_min_max, cmp_min_min, contains_datum, is_nonempty,
};
pub use invariants::RefcountMode;
pub use key::{KeyPathError, SearchRange};
pub use node::{IntervalNode, ListKind, ListNode};

use crate::{
    config::RangeConfig,
    model::{Direction, FieldId},
    obs::{CollapseKind, MetricsEvent, sink},
    value::Datum,
};
use arena::RangeArena;
use node::Color;
use std::ops::Bound;

///
/// RangeContext
///
/// Owns the arena and budget for one predicate compilation pass.
/// Every node allocated through this context is dropped with it.
///

#[derive(Debug)]
pub struct RangeContext {
    pub(crate) arena: RangeArena,
    config: RangeConfig,
    inexact: bool,
}

impl RangeContext {
    #[must_use]
    pub fn new(config: RangeConfig) -> Self {
        Self {
            arena: RangeArena::default(),
            config,
            inexact: false,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &RangeConfig {
        &self.config
    }

    /// Interval nodes allocated so far in this pass.
    #[must_use]
    pub const fn allocated_intervals(&self) -> usize {
        self.arena.interval_count()
    }

    #[must_use]
    pub fn list(&self, id: ListId) -> &ListNode {
        &self.arena[id]
    }

    #[must_use]
    pub fn interval(&self, id: IntervalId) -> &IntervalNode {
        &self.arena[id]
    }

    /// Intervals of a list in ascending order; empty for non-range lists.
    pub fn intervals(&self, list: ListId) -> impl Iterator<Item = IntervalId> + '_ {
        let mut cursor = self.arena[list].first();

        std::iter::from_fn(move || {
            let current = cursor.get()?;
            cursor = self.arena[current].succ;

            Some(current)
        })
    }

    ///
    /// LEAF CONSTRUCTORS
    ///

    /// Build a single-interval list; an empty `[min, max]` yields `Impossible`.
    pub fn single_interval(
        &mut self,
        keypart: u16,
        field: FieldId,
        direction: Direction,
        min: Bound<Datum>,
        max: Bound<Datum>,
    ) -> ListId {
        if !is_nonempty(&min, &max) {
            return self.impossible_list();
        }

        let list = self.empty_key_range(keypart, false);
        let node = self.alloc_interval(IntervalNode::detached(
            keypart, field, direction, min, max, None,
        ));
        self.rb_insert(list, node);

        list
    }

    /// Build a provably empty list.
    pub fn impossible_list(&mut self) -> ListId {
        self.arena.push_list(ListNode::new(ListKind::Impossible))
    }

    /// Build a list whose range depends on a value bound only at execution time.
    pub fn deferred_list(&mut self, keypart: u16, field: FieldId) -> ListId {
        self.arena
            .push_list(ListNode::new(ListKind::Deferred { keypart, field }))
    }

    ///
    /// INEXACTNESS
    ///

    /// Return and clear the inexact flag accumulated since the last call.
    pub const fn take_inexact(&mut self) -> bool {
        let inexact = self.inexact;
        self.inexact = false;

        inexact
    }

    pub(crate) const fn mark_inexact(&mut self) {
        self.inexact = true;
    }

    ///
    /// ALLOCATION
    ///

    pub(crate) fn alloc_interval(&mut self, node: IntervalNode) -> IntervalId {
        self.arena.push_interval(node)
    }

    pub(crate) fn empty_key_range(&mut self, keypart: u16, deferred: bool) -> ListId {
        self.arena.push_list(ListNode::new(ListKind::KeyRange {
            root: IntervalId::NIL,
            first: IntervalId::NIL,
            last: IntervalId::NIL,
            len: 0,
            keypart,
            deferred,
        }))
    }

    /// True once the allocation ceiling has been passed.
    ///
    /// Checked at the entry of every composition step; a step that sees it
    /// releases its operands and degrades to always-true.
    pub(crate) fn budget_exhausted(&mut self) -> bool {
        let allocated = self.arena.interval_count();
        if allocated <= self.config.max_intervals {
            return false;
        }

        sink::record(MetricsEvent::BudgetExhausted {
            allocated: u64::try_from(allocated).unwrap_or(u64::MAX),
            limit: u64::try_from(self.config.max_intervals).unwrap_or(u64::MAX),
        });
        self.mark_inexact();

        true
    }

    /// Turn a transiently empty key range into `Impossible`.
    pub(crate) fn demote_if_empty(&mut self, list: ListId) {
        let node = &mut self.arena[list];
        if matches!(node.kind, ListKind::KeyRange { len: 0, .. }) {
            node.kind = ListKind::Impossible;
            sink::record(MetricsEvent::Collapsed {
                kind: CollapseKind::Impossible,
            });
        }
    }

    pub(crate) fn color(&self, id: IntervalId) -> Color {
        id.get().map_or(Color::Black, |id| self.arena[id].color)
    }
}

impl Default for RangeContext {
    fn default() -> Self {
        Self::new(RangeConfig::default())
    }
}
