use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured error with a stable internal classification.
/// Composition outcomes (impossible, always-true, deferred, budget exhaustion)
/// are never reported through this type; it covers invalid inputs and
/// structural invariant violations only.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    /// Construct an InternalError from its classification and message.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a graph-origin invariant violation.
    pub(crate) fn graph_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Graph,
            message.into(),
        )
    }

    /// Construct a plan-origin invariant violation.
    pub(crate) fn plan_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Plan,
            message.into(),
        )
    }

    /// Construct a config-origin invalid-input error.
    pub(crate) fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidInput, ErrorOrigin::Config, message.into())
    }

    /// Construct a catalog-origin invalid-input error.
    pub(crate) fn catalog_invalid(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvalidInput,
            ErrorOrigin::Catalog,
            message.into(),
        )
    }

    /// Construct a key-origin invalid-input error.
    pub(crate) fn key_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidInput, ErrorOrigin::Key, message.into())
    }

    /// Construct a plan-origin unsupported error.
    pub(crate) fn plan_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Plan, message.into())
    }

    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(self.class, ErrorClass::InvariantViolation)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    InvalidInput,
    Unsupported,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidInput => "invalid_input",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Catalog,
    Config,
    Graph,
    Key,
    Plan,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Catalog => "catalog",
            Self::Config => "config",
            Self::Graph => "graph",
            Self::Key => "key",
            Self::Plan => "plan",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_class_prefixes_origin_and_class() {
        let err = InternalError::graph_invariant("refcount mismatch on list #3");

        assert!(err.is_invariant_violation());
        assert_eq!(
            err.display_with_class(),
            "graph:invariant_violation: refcount mismatch on list #3"
        );
    }

    #[test]
    fn constructors_pick_expected_taxonomy() {
        let err = InternalError::key_invalid("empty path");
        assert_eq!(err.class, ErrorClass::InvalidInput);
        assert_eq!(err.origin, ErrorOrigin::Key);

        let err = InternalError::plan_unsupported("nested merge");
        assert_eq!(err.class, ErrorClass::Unsupported);
        assert_eq!(err.origin, ErrorOrigin::Plan);
    }
}
