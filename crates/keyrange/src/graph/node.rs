use crate::{
    graph::arena::{IntervalId, ListId},
    model::{Direction, FieldId},
    value::Datum,
};
use std::ops::Bound;

///
/// Color
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Color {
    Red,
    Black,
}

///
/// IntervalNode
///
/// One elementary range over a single keypart plus its optional continuation
/// on later keyparts. Bounds are stored in ascending value order regardless
/// of the keypart direction.
///

#[derive(Clone, Debug)]
pub struct IntervalNode {
    pub(crate) keypart: u16,
    pub(crate) field: FieldId,
    pub(crate) direction: Direction,
    pub(crate) min: Bound<Datum>,
    pub(crate) max: Bound<Datum>,
    pub(crate) next: Option<ListId>,

    // balanced-tree linkage
    pub(crate) parent: IntervalId,
    pub(crate) left: IntervalId,
    pub(crate) right: IntervalId,
    pub(crate) color: Color,

    // in-order linkage
    pub(crate) prev: IntervalId,
    pub(crate) succ: IntervalId,
}

impl IntervalNode {
    /// Build a detached node; linkage is filled in on insertion.
    pub(crate) const fn detached(
        keypart: u16,
        field: FieldId,
        direction: Direction,
        min: Bound<Datum>,
        max: Bound<Datum>,
        next: Option<ListId>,
    ) -> Self {
        Self {
            keypart,
            field,
            direction,
            min,
            max,
            next,
            parent: IntervalId::NIL,
            left: IntervalId::NIL,
            right: IntervalId::NIL,
            color: Color::Red,
            prev: IntervalId::NIL,
            succ: IntervalId::NIL,
        }
    }

    #[must_use]
    pub const fn keypart(&self) -> u16 {
        self.keypart
    }

    #[must_use]
    pub const fn field(&self) -> FieldId {
        self.field
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub const fn min(&self) -> &Bound<Datum> {
        &self.min
    }

    #[must_use]
    pub const fn max(&self) -> &Bound<Datum> {
        &self.max
    }

    /// Continuation on later keyparts, if any.
    #[must_use]
    pub const fn next(&self) -> Option<ListId> {
        self.next
    }

    /// True when both bounds are closed on the same datum.
    #[must_use]
    pub fn is_point(&self) -> bool {
        matches!((&self.min, &self.max), (Bound::Included(lo), Bound::Included(hi)) if lo == hi)
    }
}

///
/// ListKind
///
/// Tagged state of one interval list.
/// Always-true is never a list: it is the absence of one (`None`).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListKind {
    KeyRange {
        root: IntervalId,
        first: IntervalId,
        last: IntervalId,
        len: usize,
        keypart: u16,
        deferred: bool,
    },
    Deferred {
        keypart: u16,
        field: FieldId,
    },
    Impossible,
}

///
/// ListNode
///

#[derive(Clone, Debug)]
pub struct ListNode {
    pub(crate) kind: ListKind,
    pub(crate) refcount: u32,
}

impl ListNode {
    pub(crate) const fn new(kind: ListKind) -> Self {
        Self { kind, refcount: 1 }
    }

    #[must_use]
    pub const fn kind(&self) -> &ListKind {
        &self.kind
    }

    #[must_use]
    pub const fn refcount(&self) -> u32 {
        self.refcount
    }

    #[must_use]
    pub const fn is_impossible(&self) -> bool {
        matches!(self.kind, ListKind::Impossible)
    }

    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(
            self.kind,
            ListKind::Deferred { .. } | ListKind::KeyRange { deferred: true, .. }
        )
    }

    /// Anchoring keypart, `None` for impossible lists.
    #[must_use]
    pub const fn keypart(&self) -> Option<u16> {
        match self.kind {
            ListKind::KeyRange { keypart, .. } | ListKind::Deferred { keypart, .. } => {
                Some(keypart)
            }
            ListKind::Impossible => None,
        }
    }

    /// Number of intervals; zero for non-range lists.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self.kind {
            ListKind::KeyRange { len, .. } => len,
            ListKind::Deferred { .. } | ListKind::Impossible => 0,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn first(&self) -> IntervalId {
        match self.kind {
            ListKind::KeyRange { first, .. } => first,
            ListKind::Deferred { .. } | ListKind::Impossible => IntervalId::NIL,
        }
    }

    pub(crate) const fn root(&self) -> IntervalId {
        match self.kind {
            ListKind::KeyRange { root, .. } => root,
            ListKind::Deferred { .. } | ListKind::Impossible => IntervalId::NIL,
        }
    }
}
