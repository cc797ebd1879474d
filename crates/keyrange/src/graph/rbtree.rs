//! Red-black maintenance for interval lists.
//!
//! Each key-range list keeps its intervals in a balanced tree ordered by the
//! lower bound, threaded with `prev`/`succ` links for in-order walks. Nodes
//! live in the shared arena; the list node carries root, first, last and len.

use crate::{
    graph::{
        RangeContext,
        arena::{IntervalId, ListId},
        bound::{BoundOrdering, cmp_max_min, cmp_min_min},
        node::{Color, ListKind},
    },
    value::Datum,
};
use std::ops::Bound;

///
/// ListHeader
///
/// Mutable view of the tree header fields of one key-range list.
///

struct ListHeader {
    root: IntervalId,
    first: IntervalId,
    last: IntervalId,
    len: usize,
}

impl RangeContext {
    fn header(&self, list: ListId) -> ListHeader {
        match self.arena[list].kind {
            ListKind::KeyRange {
                root,
                first,
                last,
                len,
                ..
            } => ListHeader {
                root,
                first,
                last,
                len,
            },
            ListKind::Deferred { .. } | ListKind::Impossible => ListHeader {
                root: IntervalId::NIL,
                first: IntervalId::NIL,
                last: IntervalId::NIL,
                len: 0,
            },
        }
    }

    fn store_header(&mut self, list: ListId, header: &ListHeader) {
        if let ListKind::KeyRange {
            root,
            first,
            last,
            len,
            ..
        } = &mut self.arena[list].kind
        {
            *root = header.root;
            *first = header.first;
            *last = header.last;
            *len = header.len;
        } else {
            debug_assert!(false, "tree maintenance on a non-range list");
        }
    }

    fn set_root(&mut self, list: ListId, new_root: IntervalId) {
        if let ListKind::KeyRange { root, .. } = &mut self.arena[list].kind {
            *root = new_root;
        }
    }

    ///
    /// LOOKUP
    ///

    /// Last interval whose lower bound does not exceed `min`.
    pub(crate) fn find_floor(&self, list: ListId, min: &Bound<Datum>) -> IntervalId {
        let mut cursor = self.arena[list].root();
        let mut best = IntervalId::NIL;

        while let Some(id) = cursor.get() {
            let node = &self.arena[id];
            if cmp_min_min(&node.min, min).is_le() {
                best = id;
                cursor = node.right;
            } else {
                cursor = node.left;
            }
        }

        best
    }

    /// First interval that overlaps or touches a range starting at `min`.
    pub(crate) fn first_reaching(&self, list: ListId, min: &Bound<Datum>) -> IntervalId {
        let floor = self.find_floor(list, min);
        let mut cursor = if floor.is_nil() {
            self.arena[list].first()
        } else {
            floor
        };

        // a predecessor can still end adjacent to `min`
        if let Some(id) = cursor.get()
            && let Some(prev) = self.arena[id].prev.get()
            && cmp_max_min(&self.arena[prev].max, min) != BoundOrdering::Less
        {
            cursor = prev;
        }

        while let Some(id) = cursor.get() {
            if cmp_max_min(&self.arena[id].max, min) != BoundOrdering::Less {
                break;
            }
            cursor = self.arena[id].succ;
        }

        cursor
    }

    ///
    /// INSERT
    ///

    /// Link a detached node into `list`, keeping order by lower bound.
    pub(crate) fn rb_insert(&mut self, list: ListId, node: IntervalId) {
        let mut header = self.header(list);

        // Phase 1: plain binary-search descent.
        let mut parent = IntervalId::NIL;
        let mut cursor = header.root;
        let mut goes_left = false;
        while let Some(id) = cursor.get() {
            parent = id;
            goes_left = cmp_min_min(&self.arena[node].min, &self.arena[id].min).is_lt();
            cursor = if goes_left {
                self.arena[id].left
            } else {
                self.arena[id].right
            };
        }

        {
            let fresh = &mut self.arena[node];
            fresh.parent = parent;
            fresh.left = IntervalId::NIL;
            fresh.right = IntervalId::NIL;
            fresh.color = Color::Red;
        }

        // Phase 2: thread the in-order links.
        if parent.is_nil() {
            header.root = node;
            header.first = node;
            header.last = node;
            self.arena[node].prev = IntervalId::NIL;
            self.arena[node].succ = IntervalId::NIL;
        } else if goes_left {
            self.arena[parent].left = node;
            let prev = self.arena[parent].prev;
            self.arena[node].prev = prev;
            self.arena[node].succ = parent;
            self.arena[parent].prev = node;
            match prev.get() {
                Some(prev) => self.arena[prev].succ = node,
                None => header.first = node,
            }
        } else {
            self.arena[parent].right = node;
            let succ = self.arena[parent].succ;
            self.arena[node].prev = parent;
            self.arena[node].succ = succ;
            self.arena[parent].succ = node;
            match succ.get() {
                Some(succ) => self.arena[succ].prev = node,
                None => header.last = node,
            }
        }

        header.len += 1;
        self.store_header(list, &header);

        // Phase 3: restore colouring.
        self.insert_fixup(list, node);
    }

    fn insert_fixup(&mut self, list: ListId, mut node: IntervalId) {
        loop {
            let parent = self.arena[node].parent;
            if parent.is_nil() || self.arena[parent].color == Color::Black {
                break;
            }
            // a red parent is never the root, so the grandparent exists
            let grand = self.arena[parent].parent;

            if parent == self.arena[grand].left {
                let uncle = self.arena[grand].right;
                if self.color(uncle) == Color::Red {
                    self.arena[parent].color = Color::Black;
                    self.arena[uncle].color = Color::Black;
                    self.arena[grand].color = Color::Red;
                    node = grand;
                    continue;
                }
                if node == self.arena[parent].right {
                    node = parent;
                    self.rotate_left(list, node);
                }
                let parent = self.arena[node].parent;
                let grand = self.arena[parent].parent;
                self.arena[parent].color = Color::Black;
                self.arena[grand].color = Color::Red;
                self.rotate_right(list, grand);
            } else {
                let uncle = self.arena[grand].left;
                if self.color(uncle) == Color::Red {
                    self.arena[parent].color = Color::Black;
                    self.arena[uncle].color = Color::Black;
                    self.arena[grand].color = Color::Red;
                    node = grand;
                    continue;
                }
                if node == self.arena[parent].left {
                    node = parent;
                    self.rotate_right(list, node);
                }
                let parent = self.arena[node].parent;
                let grand = self.arena[parent].parent;
                self.arena[parent].color = Color::Black;
                self.arena[grand].color = Color::Red;
                self.rotate_left(list, grand);
            }
        }

        let root = self.arena[list].root();
        if let Some(root) = root.get() {
            self.arena[root].color = Color::Black;
        }
    }

    ///
    /// DELETE
    ///

    /// Unlink `node` from `list`. Its continuation is left untouched and the
    /// list may be left transiently empty.
    pub(crate) fn rb_remove(&mut self, list: ListId, node: IntervalId) {
        // Phase 1: splice the in-order thread.
        let (prev, succ) = (self.arena[node].prev, self.arena[node].succ);
        let mut header = self.header(list);
        match prev.get() {
            Some(prev) => self.arena[prev].succ = succ,
            None => header.first = succ,
        }
        match succ.get() {
            Some(succ) => self.arena[succ].prev = prev,
            None => header.last = prev,
        }
        header.len -= 1;
        self.store_header(list, &header);

        // Phase 2: structural removal, tracking the parent of the hole
        // explicitly because the hole may be the nil sentinel.
        let left = self.arena[node].left;
        let right = self.arena[node].right;
        let removed_color;
        let hole;
        let hole_parent;

        if left.is_nil() {
            removed_color = self.arena[node].color;
            hole = right;
            hole_parent = self.arena[node].parent;
            self.transplant(list, node, right);
        } else if right.is_nil() {
            removed_color = self.arena[node].color;
            hole = left;
            hole_parent = self.arena[node].parent;
            self.transplant(list, node, left);
        } else {
            // in-order successor is the minimum of the right subtree
            let mut heir = right;
            while let Some(next) = self.arena[heir].left.get() {
                heir = next;
            }
            removed_color = self.arena[heir].color;
            hole = self.arena[heir].right;

            if self.arena[heir].parent == node {
                hole_parent = heir;
            } else {
                hole_parent = self.arena[heir].parent;
                self.transplant(list, heir, hole);
                self.arena[heir].right = right;
                self.arena[right].parent = heir;
            }

            self.transplant(list, node, heir);
            self.arena[heir].left = left;
            self.arena[left].parent = heir;
            self.arena[heir].color = self.arena[node].color;
        }

        {
            let gone = &mut self.arena[node];
            gone.parent = IntervalId::NIL;
            gone.left = IntervalId::NIL;
            gone.right = IntervalId::NIL;
            gone.prev = IntervalId::NIL;
            gone.succ = IntervalId::NIL;
        }

        // Phase 3: restore colouring.
        if removed_color == Color::Black {
            self.delete_fixup(list, hole, hole_parent);
        }
    }

    fn delete_fixup(&mut self, list: ListId, mut node: IntervalId, mut parent: IntervalId) {
        while node != self.arena[list].root() && self.color(node) == Color::Black {
            let Some(p) = parent.get() else {
                break;
            };

            if node == self.arena[p].left {
                let mut sibling = self.arena[p].right;
                if self.color(sibling) == Color::Red {
                    self.arena[sibling].color = Color::Black;
                    self.arena[p].color = Color::Red;
                    self.rotate_left(list, p);
                    sibling = self.arena[p].right;
                }
                if sibling.is_nil() {
                    node = p;
                    parent = self.arena[p].parent;
                    continue;
                }
                let (near, far) = (self.arena[sibling].left, self.arena[sibling].right);
                if self.color(near) == Color::Black && self.color(far) == Color::Black {
                    self.arena[sibling].color = Color::Red;
                    node = p;
                    parent = self.arena[p].parent;
                } else {
                    if self.color(far) == Color::Black {
                        self.arena[near].color = Color::Black;
                        self.arena[sibling].color = Color::Red;
                        self.rotate_right(list, sibling);
                        sibling = self.arena[p].right;
                    }
                    self.arena[sibling].color = self.arena[p].color;
                    self.arena[p].color = Color::Black;
                    let far = self.arena[sibling].right;
                    if let Some(far) = far.get() {
                        self.arena[far].color = Color::Black;
                    }
                    self.rotate_left(list, p);
                    node = self.arena[list].root();
                    parent = IntervalId::NIL;
                }
            } else {
                let mut sibling = self.arena[p].left;
                if self.color(sibling) == Color::Red {
                    self.arena[sibling].color = Color::Black;
                    self.arena[p].color = Color::Red;
                    self.rotate_right(list, p);
                    sibling = self.arena[p].left;
                }
                if sibling.is_nil() {
                    node = p;
                    parent = self.arena[p].parent;
                    continue;
                }
                let (near, far) = (self.arena[sibling].right, self.arena[sibling].left);
                if self.color(near) == Color::Black && self.color(far) == Color::Black {
                    self.arena[sibling].color = Color::Red;
                    node = p;
                    parent = self.arena[p].parent;
                } else {
                    if self.color(far) == Color::Black {
                        self.arena[near].color = Color::Black;
                        self.arena[sibling].color = Color::Red;
                        self.rotate_left(list, sibling);
                        sibling = self.arena[p].left;
                    }
                    self.arena[sibling].color = self.arena[p].color;
                    self.arena[p].color = Color::Black;
                    let far = self.arena[sibling].left;
                    if let Some(far) = far.get() {
                        self.arena[far].color = Color::Black;
                    }
                    self.rotate_right(list, p);
                    node = self.arena[list].root();
                    parent = IntervalId::NIL;
                }
            }
        }

        if let Some(node) = node.get() {
            self.arena[node].color = Color::Black;
        }
    }

    ///
    /// ROTATIONS
    ///

    fn transplant(&mut self, list: ListId, old: IntervalId, new: IntervalId) {
        let parent = self.arena[old].parent;
        match parent.get() {
            None => self.set_root(list, new),
            Some(parent) if self.arena[parent].left == old => self.arena[parent].left = new,
            Some(parent) => self.arena[parent].right = new,
        }
        if let Some(new) = new.get() {
            self.arena[new].parent = parent;
        }
    }

    fn rotate_left(&mut self, list: ListId, pivot: IntervalId) {
        let child = self.arena[pivot].right;
        let inner = self.arena[child].left;

        self.arena[pivot].right = inner;
        if let Some(inner) = inner.get() {
            self.arena[inner].parent = pivot;
        }
        self.transplant(list, pivot, child);
        self.arena[child].left = pivot;
        self.arena[pivot].parent = child;
    }

    fn rotate_right(&mut self, list: ListId, pivot: IntervalId) {
        let child = self.arena[pivot].left;
        let inner = self.arena[child].right;

        self.arena[pivot].left = inner;
        if let Some(inner) = inner.get() {
            self.arena[inner].parent = pivot;
        }
        self.transplant(list, pivot, child);
        self.arena[child].right = pivot;
        self.arena[pivot].parent = child;
    }
}
