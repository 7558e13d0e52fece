//! Generator configuration
//!
//! Hosts usually hand this over as JSON next to the type registry. Every field has a
//! default, so `{}` is a valid configuration.

use std::collections::BTreeMap;

use error_stack::Report;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::Error;
use crate::error::Result;

/// Default limit for automatically derived nested mappings
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 16;

/// How a collection-valued target property is written when it has both a setter and an adder
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionStrategy {
    /// Replace the collection through the setter; fall back to the adder when there is no
    /// setter
    #[default]
    PreferSetter,
    /// Merge element by element through the adder whenever one exists
    PreferAdderWhenAvailable,
    /// Like `PreferSetter`, but never mutate a getter-only collection in place
    SetterOnly,
}

/// Which correlation wins when an exact-name match and a singular/plural match point at
/// different target properties
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NamePrecedence {
    /// Exact name matches are settled before any heuristic match
    #[default]
    ExactName,
    /// For collection properties the singular/plural match is tried first
    Singularized,
}

/// Session-wide generator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Strategy for methods that do not set their own
    pub collection_strategy: CollectionStrategy,
    /// Tie-break between exact and heuristic name correlation
    pub name_precedence:     NamePrecedence,
    /// Domain-specific plural to singular overrides, checked before the built-in tables
    pub singular_overrides:  BTreeMap<String, String>,
    /// Maximum depth of automatically derived nested mappings
    pub max_nesting_depth:   usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            collection_strategy: CollectionStrategy::default(),
            name_precedence:     NamePrecedence::default(),
            singular_overrides:  BTreeMap::new(),
            max_nesting_depth:   DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl GeneratorConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Report::new(Error::invalid_config("generator configuration", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Add a plural to singular override
    #[must_use]
    pub fn with_singular(mut self, plural: impl Into<String>, singular: impl Into<String>) -> Self {
        self.singular_overrides
            .insert(plural.into(), singular.into());
        self
    }

    /// Set the default collection strategy
    #[must_use]
    pub const fn with_collection_strategy(mut self, strategy: CollectionStrategy) -> Self {
        self.collection_strategy = strategy;
        self
    }

    /// Set the name precedence
    #[must_use]
    pub const fn with_name_precedence(mut self, precedence: NamePrecedence) -> Self {
        self.name_precedence = precedence;
        self
    }

    /// Check that overrides are usable property-name words
    pub fn validate(&self) -> Result<()> {
        for (plural, singular) in &self.singular_overrides {
            let valid = |word: &str| {
                !word.is_empty()
                    && word
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            };
            if !valid(plural) || !valid(singular) {
                return Err(Report::new(Error::invalid_config(
                    "singular override",
                    format!("`{plural}` -> `{singular}` must be lowercase snake_case words"),
                )));
            }
        }
        if self.max_nesting_depth == 0 {
            return Err(Report::new(Error::invalid_config(
                "max_nesting_depth",
                "must be at least 1",
            )));
        }
        Ok(())
    }
}
