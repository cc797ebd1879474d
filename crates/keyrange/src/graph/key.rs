//! Search-key materialization over descent paths.
//!
//! A descent path picks one interval per keypart, each a member of the
//! previous interval's continuation. The low and high composite keys are
//! prefix keys: an `Included` low starts at the first key carrying the prefix,
//! an `Excluded` low starts after every key carrying it, and symmetrically for
//! the high key.

use crate::{
    error::InternalError,
    graph::{
        RangeContext,
        arena::{IntervalId, ListId},
        node::ListKind,
    },
    model::Direction,
    value::{Datum, push_inverted},
};
use std::ops::Bound;
use thiserror::Error as ThisError;

///
/// KeyPathError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum KeyPathError {
    #[error("descent path is empty")]
    EmptyPath,

    #[error("descent path starts at keypart {keypart}, expected keypart 0")]
    UngroundedPath { keypart: u16 },

    #[error("interval at keypart {keypart} is not in its predecessor's continuation")]
    Detached { keypart: u16 },

    #[error("range enumeration exceeded {limit} ranges")]
    RangeLimit { limit: usize },
}

impl From<KeyPathError> for InternalError {
    fn from(err: KeyPathError) -> Self {
        Self::key_invalid(err.to_string())
    }
}

///
/// SearchRange
///
/// Byte-level bounds of one index scan.
/// `deferred` is set when some list on the path depends on a value bound at
/// execution time, so the range is a superset to be refined later.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchRange {
    pub low: Bound<Vec<u8>>,
    pub high: Bound<Vec<u8>>,
    pub deferred: bool,
}

impl SearchRange {
    /// Scan of the whole index.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            low: Bound::Unbounded,
            high: Bound::Unbounded,
            deferred: false,
        }
    }
}

#[derive(Clone, Copy)]
enum Side {
    Low,
    High,
}

impl RangeContext {
    /// Build the search range selected by one descent path.
    pub fn materialize_path(&self, path: &[IntervalId]) -> Result<SearchRange, KeyPathError> {
        let (&head, rest) = path.split_first().ok_or(KeyPathError::EmptyPath)?;
        if self.arena[head].keypart != 0 {
            return Err(KeyPathError::UngroundedPath {
                keypart: self.arena[head].keypart,
            });
        }

        // Phase 1: check membership and collect deferred markers.
        let mut deferred = false;
        let mut prev = head;
        for &id in rest {
            let keypart = self.arena[id].keypart;
            let Some(list) = self.arena[prev].next else {
                return Err(KeyPathError::Detached { keypart });
            };
            if !self.intervals(list).any(|member| member == id) {
                return Err(KeyPathError::Detached { keypart });
            }
            deferred |= self.arena[list].is_deferred();
            prev = id;
        }
        if let Some(tail) = self.arena[prev].next {
            deferred |= self.arena[tail].is_deferred();
        }

        // Phase 2: encode both ends.
        Ok(SearchRange {
            low: self.edge_key(path, Side::Low),
            high: self.edge_key(path, Side::High),
            deferred,
        })
    }

    fn edge_key(&self, path: &[IntervalId], side: Side) -> Bound<Vec<u8>> {
        let mut out = Vec::new();
        let mut expected = 0u16;

        for &id in path {
            let node = &self.arena[id];
            // a skipped keypart ends the usable prefix
            if node.keypart != expected {
                break;
            }

            let bound = match (side, node.direction) {
                (Side::Low, Direction::Asc) | (Side::High, Direction::Desc) => &node.min,
                (Side::Low, Direction::Desc) | (Side::High, Direction::Asc) => &node.max,
            };
            match bound {
                Bound::Unbounded => break,
                Bound::Included(datum) => push_component(&mut out, datum, node.direction),
                Bound::Excluded(datum) => {
                    push_component(&mut out, datum, node.direction);
                    return Bound::Excluded(out);
                }
            }

            expected = expected.saturating_add(1);
        }

        if out.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(out)
        }
    }

    /// Enumerate the search ranges of a keypart-0 list.
    ///
    /// Descent continues below an interval only while the prefix so far is
    /// a single point and the continuation covers the very next keypart;
    /// otherwise the path ends and its range covers the rest.
    ///
    /// `limit` is clamped to `RangeConfig::max_enumerated_ranges`.
    pub fn enumerate_ranges(
        &self,
        list: Option<ListId>,
        limit: usize,
    ) -> Result<Vec<SearchRange>, KeyPathError> {
        let limit = limit.min(self.config.max_enumerated_ranges);
        let Some(id) = list else {
            return Ok(vec![SearchRange::full()]);
        };

        match self.arena[id].kind {
            ListKind::Impossible => Ok(Vec::new()),
            ListKind::Deferred { .. } => Ok(vec![SearchRange {
                deferred: true,
                ..SearchRange::full()
            }]),
            ListKind::KeyRange {
                keypart, deferred, ..
            } => {
                if keypart != 0 {
                    return Err(KeyPathError::UngroundedPath { keypart });
                }

                let mut out = Vec::new();
                let mut path = Vec::new();
                self.collect_ranges(id, &mut path, &mut out, limit)?;
                if deferred {
                    for range in &mut out {
                        range.deferred = true;
                    }
                }

                Ok(out)
            }
        }
    }

    fn collect_ranges(
        &self,
        list: ListId,
        path: &mut Vec<IntervalId>,
        out: &mut Vec<SearchRange>,
        limit: usize,
    ) -> Result<(), KeyPathError> {
        for id in self.intervals(list) {
            path.push(id);

            let node = &self.arena[id];
            let descend = node.next.filter(|next| {
                node.is_point()
                    && matches!(
                        self.arena[*next].kind,
                        ListKind::KeyRange { keypart, .. } if keypart == node.keypart + 1
                    )
            });

            if let Some(next) = descend {
                self.collect_ranges(next, path, out, limit)?;
            } else {
                if out.len() >= limit {
                    return Err(KeyPathError::RangeLimit { limit });
                }
                out.push(self.materialize_path(path)?);
            }

            path.pop();
        }

        Ok(())
    }
}

// Append one keypart; descending keyparts store the inverted segment.
fn push_component(out: &mut Vec<u8>, datum: &Datum, direction: Direction) {
    match direction {
        Direction::Asc => datum.write_component(out),
        Direction::Desc => {
            let mut segment = Vec::new();
            datum.write_component(&mut segment);
            push_inverted(out, &segment);
        }
    }
}
