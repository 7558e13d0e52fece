//! Abstract mapping-method signatures and their per-property options

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::CollectionStrategy;
use crate::type_name::TypeName;

/// Options for one target property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropertyOption {
    /// Concrete type to produce where the declared type is a supertype
    pub target_type_hint: Option<TypeName>,
    /// Leave the target property untouched
    pub ignore:           bool,
}

/// Per-property options keyed by target property name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyOptions(BTreeMap<String, PropertyOption>);

impl PropertyOptions {
    /// Whether the target property is excluded from mapping
    pub fn is_ignored(&self, property: &str) -> bool {
        self.0.get(property).is_some_and(|option| option.ignore)
    }

    /// Target type hint for a property
    pub fn target_type_hint(&self, property: &str) -> Option<&TypeName> {
        self.0
            .get(property)
            .and_then(|option| option.target_type_hint.as_ref())
    }

    /// Exclude a target property
    #[must_use]
    pub fn ignoring(mut self, property: impl Into<String>) -> Self {
        self.0.entry(property.into()).or_default().ignore = true;
        self
    }

    /// Produce `hint` for a target property
    #[must_use]
    pub fn with_target_type_hint(
        mut self,
        property: impl Into<String>,
        hint: impl Into<TypeName>,
    ) -> Self {
        self.0.entry(property.into()).or_default().target_type_hint = Some(hint.into());
        self
    }
}

/// Signature of a mapping method the generator implements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingMethod {
    /// Method name, e.g. `source_to_target`
    pub name:                          String,
    /// Type read from
    pub source_type:                   TypeName,
    /// Type written to
    pub target_type:                   TypeName,
    /// The caller supplies the target instance instead of the method creating one
    #[serde(default)]
    pub has_existing_target_parameter: bool,
    /// Failure types the method may raise
    #[serde(default)]
    pub declared_failures:             Vec<TypeName>,
    /// Collection strategy; the generator default applies when unset
    #[serde(default)]
    pub strategy:                      Option<CollectionStrategy>,
    /// Options keyed by target property name
    #[serde(default)]
    pub property_options:              PropertyOptions,
}

impl MappingMethod {
    /// A method creating a new `target_type` from a `source_type`
    pub fn new(
        name: impl Into<String>,
        source_type: impl Into<TypeName>,
        target_type: impl Into<TypeName>,
    ) -> Self {
        Self {
            name:                          name.into(),
            source_type:                   source_type.into(),
            target_type:                   target_type.into(),
            has_existing_target_parameter: false,
            declared_failures:             Vec::new(),
            strategy:                      None,
            property_options:              PropertyOptions::default(),
        }
    }

    /// Switch to the merge-into-existing-target form
    #[must_use]
    pub const fn updating_existing_target(mut self) -> Self {
        self.has_existing_target_parameter = true;
        self
    }

    /// Declare failure types
    #[must_use]
    pub fn declaring<I, T>(mut self, failures: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.declared_failures
            .extend(failures.into_iter().map(Into::into));
        self
    }

    /// Set the collection strategy for this method
    #[must_use]
    pub const fn with_strategy(mut self, strategy: CollectionStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Produce `hint` for a target property
    #[must_use]
    pub fn with_target_type_hint(
        mut self,
        property: impl Into<String>,
        hint: impl Into<TypeName>,
    ) -> Self {
        self.property_options = self.property_options.with_target_type_hint(property, hint);
        self
    }

    /// Leave a target property untouched
    #[must_use]
    pub fn ignoring(mut self, property: impl Into<String>) -> Self {
        self.property_options = self.property_options.ignoring(property);
        self
    }

    /// Whether this method maps `source` into `target`
    pub fn maps(&self, source: &TypeName, target: &TypeName) -> bool {
        self.source_type == *source && self.target_type == *target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_loads_from_json() {
        let method: MappingMethod = serde_json::from_str(
            r#"{
                "name": "source_to_target",
                "source_type": "Source",
                "target_type": "Target",
                "declared_failures": ["DogException"],
                "strategy": "PREFER_ADDER_WHEN_AVAILABLE",
                "property_options": {"pets": {"target_type_hint": "OutdoorPet"}, "id": {"ignore": true}}
            }"#,
        )
        .expect("method should parse");

        assert!(!method.has_existing_target_parameter);
        assert_eq!(method.strategy, Some(CollectionStrategy::PreferAdderWhenAvailable));
        assert_eq!(
            method.property_options.target_type_hint("pets"),
            Some(&TypeName::from("OutdoorPet"))
        );
        assert!(method.property_options.is_ignored("id"));
        assert!(!method.property_options.is_ignored("pets"));
    }

    #[test]
    fn test_builders_accumulate_options() {
        let method = MappingMethod::new("m", "Source", "Target")
            .ignoring("pets")
            .with_target_type_hint("pets", "OutdoorPet")
            .declaring(["DogException"])
            .updating_existing_target();

        assert!(method.has_existing_target_parameter);
        assert!(method.property_options.is_ignored("pets"));
        assert!(method.property_options.target_type_hint("pets").is_some());
        assert_eq!(method.declared_failures, vec![TypeName::from("DogException")]);
        assert!(method.maps(&"Source".into(), &"Target".into()));
    }
}
