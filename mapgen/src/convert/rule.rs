//! User-declared conversion rules

use std::fmt::Display;

use error_stack::Report;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::type_name::TypeName;
use crate::type_source::TypeSource;

/// Path of a converter function, e.g. `PetMapper::to_pet`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ConverterRef(String);

impl ConverterRef {
    /// Create a converter reference
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Get the underlying path
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ConverterRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConverterRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A converter mapping values of `from` to values of `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRule {
    /// Source value type
    pub from:                TypeName,
    /// Target value type
    pub to:                  TypeName,
    /// Converter to invoke
    pub converter:           ConverterRef,
    /// Failures the converter declares
    #[serde(default)]
    pub declared_failures:   Vec<TypeName>,
    /// The converter is generic over subtypes of `to` and receives the concrete target type
    #[serde(default)]
    pub accepts_target_type: bool,
}

impl ConversionRule {
    /// Declare a converter
    pub fn new(
        from: impl Into<TypeName>,
        to: impl Into<TypeName>,
        converter: impl Into<ConverterRef>,
    ) -> Self {
        Self {
            from:                from.into(),
            to:                  to.into(),
            converter:           converter.into(),
            declared_failures:   Vec::new(),
            accepts_target_type: false,
        }
    }

    /// Attach declared failures
    #[must_use]
    pub fn with_failures<I, T>(mut self, failures: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.declared_failures = failures.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the converter as generic over subtypes of its target type
    #[must_use]
    pub const fn accepting_target_type(mut self) -> Self {
        self.accepts_target_type = true;
        self
    }
}

/// User rules registered for one generation session
#[derive(Debug, Clone, Default)]
pub struct ConversionRegistry {
    rules: Vec<ConversionRule>,
}

impl ConversionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rules from a JSON array
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rules: Vec<ConversionRule> = serde_json::from_str(json)
            .map_err(|e| Report::new(Error::invalid_config("conversion rules", e)))?;
        Ok(rules.into_iter().fold(Self::new(), Self::with))
    }

    /// Register a rule; the first rule for a `from`/`to` pair wins
    pub fn register(&mut self, rule: ConversionRule) {
        if let Some(existing) = self.find_exact(&rule.from, &rule.to) {
            warn!(
                from = %rule.from,
                to = %rule.to,
                kept = %existing.converter,
                ignored = %rule.converter,
                "Duplicate conversion rule ignored"
            );
            return;
        }
        self.rules.push(rule);
    }

    /// Builder form of [`Self::register`]
    #[must_use]
    pub fn with(mut self, rule: ConversionRule) -> Self {
        self.register(rule);
        self
    }

    /// Registered rules in registration order
    pub fn rules(&self) -> &[ConversionRule] {
        &self.rules
    }

    /// Rule converting exactly `from` into exactly `to`
    pub fn find_exact(&self, from: &TypeName, to: &TypeName) -> Option<&ConversionRule> {
        self.rules
            .iter()
            .find(|rule| rule.from == *from && rule.to == *to)
    }

    /// Generic rule whose target type is a supertype of `to`
    pub fn find_for_subtype(
        &self,
        from: &TypeName,
        to: &TypeName,
        types: &dyn TypeSource,
    ) -> Option<&ConversionRule> {
        self.rules.iter().find(|rule| {
            rule.accepts_target_type && rule.from == *from && types.is_assignable(to, &rule.to)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_source::{TypeDescriptor, TypeRegistry};

    #[test]
    fn test_first_rule_wins() {
        let registry = ConversionRegistry::new()
            .with(ConversionRule::new("String", "i64", "first"))
            .with(ConversionRule::new("String", "i64", "second"));
        assert_eq!(registry.rules().len(), 1);
        assert_eq!(
            registry
                .find_exact(&"String".into(), &"i64".into())
                .map(|rule| rule.converter.as_str()),
            Some("first")
        );
    }

    #[test]
    fn test_generic_rule_matches_subtypes_only() {
        let types = TypeRegistry::new()
            .with(TypeDescriptor::bean("Pet"))
            .with(TypeDescriptor::bean("OutdoorPet").with_supertype("Pet"))
            .with(TypeDescriptor::bean("Rock"));
        let registry = ConversionRegistry::new()
            .with(ConversionRule::new("i64", "Pet", "PetMapper::to_typed_pet").accepting_target_type());

        assert!(
            registry
                .find_for_subtype(&"i64".into(), &"OutdoorPet".into(), &types)
                .is_some()
        );
        assert!(
            registry
                .find_for_subtype(&"i64".into(), &"Rock".into(), &types)
                .is_none()
        );
    }

    #[test]
    fn test_rules_load_from_json() {
        let registry = ConversionRegistry::from_json_str(
            r#"[{"from": "String", "to": "i64", "converter": "PetMapper::to_pet", "declared_failures": ["DogException"]}]"#,
        )
        .expect("rules parse");
        let rule = registry
            .find_exact(&"String".into(), &"i64".into())
            .expect("rule registered");
        assert_eq!(rule.declared_failures, vec![TypeName::from("DogException")]);
        assert!(!rule.accepts_target_type);
    }
}
