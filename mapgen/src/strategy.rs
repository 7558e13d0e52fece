//! Chooses how each correlated property is written
//!
//! Mutation-point availability always overrides the configured strategy: the strategy only
//! decides between a setter and an adder when the target offers both. A getter-only
//! collection is mutated in place under every strategy.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use tracing::{debug, warn};

use crate::config::CollectionStrategy;
use crate::correlate::CorrelatedProperty;
use crate::type_name::ContainerKind;

/// Which member receives merged elements
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MergeVia {
    /// One adder call per element
    Adder,
    /// The collection obtained through the getter, mutated in place
    Getter,
}

/// What the generated code does for one property
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyAction {
    /// Pass the source value to the setter unchanged
    Assign,
    /// Convert the source value, then pass it to the setter
    ConvertAssign,
    /// Append each converted source element, in source order
    MergeAdd {
        /// Member receiving the elements
        via: MergeVia,
    },
    /// Build a new collection from the converted elements and pass it to the setter
    ReplaceSet,
}

impl PropertyAction {
    /// Whether the action works element by element
    pub const fn is_element_wise(self) -> bool {
        matches!(self, Self::MergeAdd { .. } | Self::ReplaceSet)
    }
}

/// Per-method action selection
#[derive(Debug, Clone, Copy)]
pub struct CollectionStrategySelector {
    strategy:        CollectionStrategy,
    existing_target: bool,
}

impl CollectionStrategySelector {
    /// Selector for a method using `strategy`
    pub const fn new(strategy: CollectionStrategy, existing_target: bool) -> Self {
        Self {
            strategy,
            existing_target,
        }
    }

    /// Whether `pair` is written element by element
    pub const fn is_collection_pair(pair: &CorrelatedProperty) -> bool {
        pair.source.is_collection() && pair.target.is_collection()
    }

    /// Whether the target collection iterates in the order elements were added
    ///
    /// Unknown containers are assumed to keep insertion order.
    pub fn keeps_source_order(pair: &CorrelatedProperty) -> bool {
        pair.target
            .value_type
            .container_kind()
            .is_none_or(ContainerKind::preserves_insertion_order)
    }

    /// The action for `pair`, or `None` when the target cannot be written
    ///
    /// `has_conversion` tells whether values (or elements) need converting.
    pub fn select(&self, pair: &CorrelatedProperty, has_conversion: bool) -> Option<PropertyAction> {
        let target = &pair.target;

        if !Self::is_collection_pair(pair) {
            if !target.has_setter() {
                debug!(property = %target.name, "Target property has no setter; skipped");
                return None;
            }
            return Some(if has_conversion {
                PropertyAction::ConvertAssign
            } else {
                PropertyAction::Assign
            });
        }

        let action = match (target.has_setter(), target.has_adder()) {
            (true, true) => match self.strategy {
                CollectionStrategy::PreferAdderWhenAvailable => PropertyAction::MergeAdd {
                    via: MergeVia::Adder,
                },
                CollectionStrategy::PreferSetter | CollectionStrategy::SetterOnly => {
                    PropertyAction::ReplaceSet
                },
            },
            (true, false) => PropertyAction::ReplaceSet,
            (false, true) => PropertyAction::MergeAdd {
                via: MergeVia::Adder,
            },
            (false, false) if target.is_readable() => PropertyAction::MergeAdd {
                via: MergeVia::Getter,
            },
            (false, false) => {
                debug!(property = %target.name, "Target collection is not writable; skipped");
                return None;
            },
        };

        if !Self::keeps_source_order(pair) {
            warn!(
                property = %target.name,
                collection = %target.value_type,
                "Target collection does not keep insertion order; source order is lost"
            );
        }

        debug!(
            property = %target.name,
            strategy = %self.strategy,
            existing_target = self.existing_target,
            %action,
            "Selected collection action"
        );
        Some(action)
    }
}
