use crate::{
    MAX_CANDIDATE_INDEXES, MAX_KEYPARTS,
    error::InternalError,
    model::{Direction, FieldId},
};
use thiserror::Error as ThisError;

///
/// CatalogError
///
/// Reason a candidate-index catalog could not be accepted.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CatalogError {
    #[error("candidate index count {count} exceeds limit {max}")]
    TooManyIndexes { count: usize, max: usize },

    #[error("index '{index}' has no keyparts")]
    EmptyIndex { index: String },

    #[error("index '{index}' has {count} keyparts (limit {max})")]
    TooManyKeyparts {
        index: String,
        count: usize,
        max: usize,
    },
}

impl From<CatalogError> for InternalError {
    fn from(err: CatalogError) -> Self {
        Self::catalog_invalid(err.to_string())
    }
}

///
/// KeyPart
/// One column position within a candidate index.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyPart {
    pub field: FieldId,
    pub direction: Direction,
}

impl KeyPart {
    #[must_use]
    pub const fn asc(field: FieldId) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    #[must_use]
    pub const fn desc(field: FieldId) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }
}

///
/// IndexModel
///
/// Candidate index shape as seen by range analysis: a name for diagnostics
/// and the ordered keyparts.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexModel {
    pub name: String,
    pub keyparts: Vec<KeyPart>,
}

impl IndexModel {
    #[must_use]
    pub fn new(name: impl Into<String>, keyparts: Vec<KeyPart>) -> Self {
        Self {
            name: name.into(),
            keyparts,
        }
    }

    /// Keypart positions (ascending) at which `field` appears in this index.
    pub fn positions_of(&self, field: FieldId) -> impl Iterator<Item = u16> + '_ {
        self.keyparts
            .iter()
            .enumerate()
            .filter(move |(_, part)| part.field == field)
            .filter_map(|(position, _)| u16::try_from(position).ok())
    }

    #[must_use]
    pub fn keypart(&self, position: u16) -> Option<&KeyPart> {
        self.keyparts.get(usize::from(position))
    }
}

///
/// IndexCatalog
///
/// Ordered candidate indexes for one predicate; slot `i` of every predicate
/// tree built against this catalog refers to `indexes[i]`.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexCatalog {
    indexes: Vec<IndexModel>,
}

impl IndexCatalog {
    /// Validate and wrap a candidate-index list.
    pub fn try_new(indexes: Vec<IndexModel>) -> Result<Self, CatalogError> {
        if indexes.len() > MAX_CANDIDATE_INDEXES {
            return Err(CatalogError::TooManyIndexes {
                count: indexes.len(),
                max: MAX_CANDIDATE_INDEXES,
            });
        }

        for index in &indexes {
            if index.keyparts.is_empty() {
                return Err(CatalogError::EmptyIndex {
                    index: index.name.clone(),
                });
            }
            if index.keyparts.len() > MAX_KEYPARTS {
                return Err(CatalogError::TooManyKeyparts {
                    index: index.name.clone(),
                    count: index.keyparts.len(),
                    max: MAX_KEYPARTS,
                });
            }
        }

        Ok(Self { indexes })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.indexes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&IndexModel> {
        self.indexes.get(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &IndexModel)> {
        self.indexes.iter().enumerate()
    }

    /// Direction of one keypart, defaulting to ascending for unknown slots.
    #[must_use]
    pub fn direction(&self, slot: usize, keypart: u16) -> Direction {
        self.get(slot)
            .and_then(|index| index.keypart(keypart))
            .map_or(Direction::Asc, |part| part.direction)
    }
}
