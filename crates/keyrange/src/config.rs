//! Range-analysis limits and policy switches.
//!
//! Limits stay policy-owned at the context boundary instead of inside the
//! composition routines, so every AND/OR step consults one shared budget.

use crate::error::InternalError;
use serde::Deserialize;
use thiserror::Error as ThisError;

/// Default interval allocation ceiling for one compilation pass.
pub const DEFAULT_MAX_INTERVALS: usize = 16_000;

/// Default cap on member trees of one index-merge alternative.
pub const DEFAULT_MAX_MERGE_TREES: usize = 64;

/// Default cap on ranges produced by one enumeration.
pub const DEFAULT_MAX_ENUMERATED_RANGES: usize = 4_096;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("range config parse failed: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("range config limit '{field}' must be positive")]
    ZeroLimit { field: &'static str },
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::config_invalid(err.to_string())
    }
}

///
/// RangeConfig
///
/// Hard limits and switches for one range-analysis context.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RangeConfig {
    /// Interval allocation ceiling; composition past it degrades to always-true.
    pub max_intervals: usize,

    /// Drop candidate clauses not anchored at keypart 0 before index merging.
    pub discard_ungrounded_scans: bool,

    /// Member-tree cap for one index-merge alternative.
    pub max_merge_trees: usize,

    /// Range cap for `RangeContext::enumerate_ranges`.
    pub max_enumerated_ranges: usize,
}

impl RangeConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Reject limits that would make every composition degrade immediately.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_intervals == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_intervals",
            });
        }
        if self.max_merge_trees == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_merge_trees",
            });
        }
        if self.max_enumerated_ranges == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_enumerated_ranges",
            });
        }

        Ok(())
    }

    #[must_use]
    pub const fn with_max_intervals(mut self, max_intervals: usize) -> Self {
        self.max_intervals = max_intervals;
        self
    }

    #[must_use]
    pub const fn with_discard_ungrounded_scans(mut self, discard: bool) -> Self {
        self.discard_ungrounded_scans = discard;
        self
    }
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            max_intervals: DEFAULT_MAX_INTERVALS,
            discard_ungrounded_scans: false,
            max_merge_trees: DEFAULT_MAX_MERGE_TREES,
            max_enumerated_ranges: DEFAULT_MAX_ENUMERATED_RANGES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = RangeConfig::from_toml_str("").expect("empty config should parse");

        assert_eq!(config, RangeConfig::default());
    }

    #[test]
    fn document_overrides_selected_fields() {
        let config = RangeConfig::from_toml_str(
            "max_intervals = 128\ndiscard_ungrounded_scans = true\n",
        )
        .expect("config should parse");

        assert_eq!(config.max_intervals, 128);
        assert!(config.discard_ungrounded_scans);
        assert_eq!(config.max_merge_trees, DEFAULT_MAX_MERGE_TREES);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RangeConfig::from_toml_str("max_nodes = 3").expect_err("unknown key");

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let err = RangeConfig::from_toml_str("max_intervals = 0").expect_err("zero limit");
        let internal = InternalError::from(err);

        assert_eq!(
            internal.message,
            "range config limit 'max_intervals' must be positive"
        );
    }
}
