use crate::{
    MAX_KEYPARTS,
    error::InternalError,
    graph::{ListId, ListKind, RangeContext},
    plan::PredicateTree,
};
use thiserror::Error as ThisError;

///
/// KeypartLookupError
///
/// Reason a single scan prefix cannot be derived for a keypart.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum KeypartLookupError {
    #[error("no range on index {index}")]
    NoRangeOnIndex { index: usize },

    #[error("keypart {keypart} of index {index} has no unique conjunctive condition")]
    DisjunctivePrefix { index: usize, keypart: u16 },

    #[error("keypart {keypart} is out of range (limit {max})")]
    KeypartOutOfRange { keypart: u16, max: usize },
}

impl From<KeypartLookupError> for InternalError {
    fn from(err: KeypartLookupError) -> Self {
        Self::plan_unsupported(err.to_string())
    }
}

impl RangeContext {
    /// Sub-list of `index` anchored at `keypart`.
    ///
    /// Every earlier keypart must carry exactly one interval. Returns
    /// `Ok(None)` when the prefix is unique but nothing constrains `keypart`.
    /// The returned handle is borrowed from the tree; retain it to keep it.
    pub fn keypart_sub_list(
        &self,
        tree: &PredicateTree,
        index: usize,
        keypart: u16,
    ) -> Result<Option<ListId>, KeypartLookupError> {
        if usize::from(keypart) >= MAX_KEYPARTS {
            return Err(KeypartLookupError::KeypartOutOfRange {
                keypart,
                max: MAX_KEYPARTS,
            });
        }
        let mut cursor = tree
            .slot(index)
            .ok_or(KeypartLookupError::NoRangeOnIndex { index })?;

        for prefix in 0..keypart {
            // the prefix keypart must be constrained by exactly one interval
            let first = match self.list(cursor).kind() {
                ListKind::KeyRange {
                    keypart: anchor,
                    first,
                    len: 1,
                    ..
                } if *anchor == prefix => *first,
                _ => {
                    return Err(KeypartLookupError::DisjunctivePrefix {
                        index,
                        keypart: prefix,
                    });
                }
            };

            match self.interval(first).next() {
                Some(next) => cursor = next,
                None if prefix + 1 == keypart => return Ok(None),
                None => {
                    return Err(KeypartLookupError::DisjunctivePrefix {
                        index,
                        keypart: prefix + 1,
                    });
                }
            }
        }

        match self.list(cursor).keypart() {
            Some(anchor) if anchor == keypart => Ok(Some(cursor)),
            _ => Ok(None),
        }
    }
}
