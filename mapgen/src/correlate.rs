//! Pairs source properties with target properties
//!
//! Exact names are tried first. Collection-valued source properties may additionally match
//! through their singular forms in either direction (`teeth` on the source, adder-only
//! `tooth` on the target, or the other way round). A target claimed by one source is not
//! offered to another.

use std::collections::HashSet;

use error_stack::Report;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::NamePrecedence;
use crate::error::{Error, Result};
use crate::inflection::Inflector;
use crate::method::PropertyOptions;
use crate::shape::{BeanShape, Property};

/// How a correlation was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    /// Same property name
    Exact,
    /// Singular/plural match; lower tiers are more specific
    Singularized {
        /// Position of the matching candidate among the singular forms
        tier: usize,
    },
}

/// A source property paired with the target property it writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelatedProperty {
    /// Property read from the source
    pub source:     Property,
    /// Property written on the target
    pub target:     Property,
    /// How the pair was found
    pub match_kind: MatchKind,
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    Exact,
    Heuristic,
}

/// Correlates the properties of two shapes
pub struct PropertyCorrelator<'a> {
    inflector:  &'a Inflector,
    precedence: NamePrecedence,
}

impl<'a> PropertyCorrelator<'a> {
    /// Create a correlator
    pub const fn new(inflector: &'a Inflector, precedence: NamePrecedence) -> Self {
        Self {
            inflector,
            precedence,
        }
    }

    /// Correlate every readable source property with at most one target property
    ///
    /// The result follows source declaration order. Properties without a partner are not an
    /// error and simply do not appear.
    pub fn correlate(
        &self,
        source: &BeanShape,
        target: &BeanShape,
        options: &PropertyOptions,
    ) -> Result<Vec<CorrelatedProperty>> {
        let sources: Vec<&Property> = source.readable_properties().collect();
        let targets: Vec<&Property> = target
            .properties
            .iter()
            .filter(|property| !options.is_ignored(&property.name))
            .collect();

        let passes = match self.precedence {
            NamePrecedence::ExactName => [Pass::Exact, Pass::Heuristic],
            NamePrecedence::Singularized => [Pass::Heuristic, Pass::Exact],
        };

        let mut pairs: Vec<Option<(usize, MatchKind)>> = vec![None; sources.len()];
        let mut claimed: HashSet<usize> = HashSet::new();

        for pass in passes {
            for (source_index, source_property) in sources.iter().enumerate() {
                if pairs[source_index].is_some() {
                    continue;
                }
                let found = match pass {
                    Pass::Exact => Self::exact_match(source_property, &targets, &claimed),
                    Pass::Heuristic => {
                        self.heuristic_match(source_property, &targets, &claimed)?
                    },
                };
                if let Some((target_index, match_kind)) = found {
                    claimed.insert(target_index);
                    pairs[source_index] = Some((target_index, match_kind));
                }
            }
        }

        let mut correlated = Vec::new();
        for (source_property, pair) in sources.into_iter().zip(pairs) {
            let Some((target_index, match_kind)) = pair else {
                debug!(
                    source_type = %source.type_name,
                    target_type = %target.type_name,
                    property = %source_property.name,
                    "No target property correlates; property left unmapped"
                );
                continue;
            };
            let target_property = targets[target_index];
            debug!(
                property = %source_property.name,
                target = %target_property.name,
                ?match_kind,
                "Correlated property"
            );
            correlated.push(CorrelatedProperty {
                source: source_property.clone(),
                target: target_property.clone(),
                match_kind,
            });
        }
        Ok(correlated)
    }

    fn exact_match(
        source: &Property,
        targets: &[&Property],
        claimed: &HashSet<usize>,
    ) -> Option<(usize, MatchKind)> {
        targets
            .iter()
            .enumerate()
            .find(|(index, target)| !claimed.contains(index) && target.name == source.name)
            .map(|(index, _)| (index, MatchKind::Exact))
    }

    /// Best singular/plural match for a collection-valued source property
    ///
    /// Several targets at the best tier are ambiguous unless the source also has an exact
    /// match, which then settles it.
    fn heuristic_match(
        &self,
        source: &Property,
        targets: &[&Property],
        claimed: &HashSet<usize>,
    ) -> Result<Option<(usize, MatchKind)>> {
        if !source.is_collection() {
            return Ok(None);
        }

        let scored: Vec<(usize, usize)> = targets
            .iter()
            .enumerate()
            .filter(|(index, target)| {
                !claimed.contains(index) && target.is_collection() && target.name != source.name
            })
            .filter_map(|(index, target)| {
                self.tier(&source.name, &target.name).map(|tier| (tier, index))
            })
            .collect();

        let Some(best_tier) = scored.iter().map(|(tier, _)| *tier).min() else {
            return Ok(None);
        };
        let best: Vec<usize> = scored
            .iter()
            .filter(|(tier, _)| *tier == best_tier)
            .map(|(_, index)| *index)
            .collect();

        match best.as_slice() {
            [index] => Ok(Some((*index, MatchKind::Singularized { tier: best_tier }))),
            _ => {
                if let Some(exact) = Self::exact_match(source, targets, claimed) {
                    return Ok(Some(exact));
                }
                Err(Report::new(Error::AmbiguousCorrelation {
                    source_property: source.name.clone(),
                    candidates:      best
                        .iter()
                        .map(|index| targets[*index].name.clone())
                        .collect(),
                }))
            },
        }
    }

    /// Tier of the closer direction: the target named after a singular of the source, or
    /// the source named after a singular of the target
    fn tier(&self, source_name: &str, target_name: &str) -> Option<usize> {
        let forward = self.inflector.singular_tier(source_name, target_name);
        let backward = self.inflector.singular_tier(target_name, source_name);
        match (forward, backward) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
