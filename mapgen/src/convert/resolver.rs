//! Finds the conversion for a correlated pair whose types differ
//!
//! Resolution order: user rule for the exact pair, user rule generic over the target type,
//! built-in rule, nested bean-to-bean mapping. Nothing found is an error, never a skip.

use error_stack::Report;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::builtin::BuiltinConversion;
use super::rule::{ConversionRegistry, ConversionRule, ConverterRef};
use crate::error::{Error, Result};
use crate::plan::MappingPlan;
use crate::type_name::TypeName;
use crate::type_source::TypeSource;

/// A nested mapping method used as an element or value converter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedMapping {
    /// Name of the method performing the nested mapping
    pub method:            String,
    /// Nested source type
    pub source_type:       TypeName,
    /// Nested target type
    pub target_type:       TypeName,
    /// Failures the nested method declares
    pub declared_failures: Vec<TypeName>,
    /// Plan of an automatically derived method; `None` when the method is declared
    /// elsewhere or already being planned higher up
    pub plan:              Option<Box<MappingPlan>>,
}

/// How a source value (or element) becomes a target value (or element)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conversion {
    /// A built-in conversion
    Builtin(BuiltinConversion),
    /// A user-declared converter
    Converter {
        /// Converter to call
        converter:         ConverterRef,
        /// Concrete target type passed to converters generic over their target type
        target_type:       Option<TypeName>,
        /// Failures the converter declares
        declared_failures: Vec<TypeName>,
    },
    /// Another mapping method
    Nested(NestedMapping),
}

impl Conversion {
    fn from_rule(rule: &ConversionRule, target_type: &TypeName) -> Self {
        Self::Converter {
            converter:         rule.converter.clone(),
            target_type:       rule.accepts_target_type.then(|| target_type.clone()),
            declared_failures: rule.declared_failures.clone(),
        }
    }

    /// Failures that invoking this conversion may raise
    pub fn declared_failures(&self) -> &[TypeName] {
        match self {
            Self::Builtin(_) => &[],
            Self::Converter {
                declared_failures, ..
            }
            | Self::Nested(NestedMapping {
                declared_failures, ..
            }) => declared_failures,
        }
    }

    /// Name of what gets invoked: the builtin kind, converter path or nested method
    pub fn invoked_name(&self) -> &str {
        match self {
            Self::Builtin(builtin) => builtin.as_ref(),
            Self::Converter { converter, .. } => converter.as_str(),
            Self::Nested(nested) => &nested.method,
        }
    }
}

/// Supplies nested bean-to-bean mappings on demand
pub trait NestedMappings {
    /// A mapping method from `from` to `to`, or `None` when the types are not both beans
    fn nested_mapping(&mut self, from: &TypeName, to: &TypeName) -> Result<Option<NestedMapping>>;
}

/// Resolves conversions against the session's rules
pub struct ConversionResolver<'a> {
    types:    &'a dyn TypeSource,
    registry: &'a ConversionRegistry,
}

impl<'a> ConversionResolver<'a> {
    /// Create a resolver
    pub const fn new(types: &'a dyn TypeSource, registry: &'a ConversionRegistry) -> Self {
        Self { types, registry }
    }

    /// Resolve the conversion for one property
    ///
    /// `hint` replaces `declared_to` when given; it must be `declared_to` or one of its
    /// subtypes. Returns `None` when the value can be used as is.
    pub fn resolve(
        &self,
        property: &str,
        from: &TypeName,
        declared_to: &TypeName,
        hint: Option<&TypeName>,
        nested: &mut dyn NestedMappings,
    ) -> Result<Option<Conversion>> {
        let to = match hint {
            Some(hint) if !self.types.is_assignable(hint, declared_to) => {
                return Err(Report::new(Error::hint_not_assignable(
                    property,
                    hint,
                    declared_to,
                )));
            },
            Some(hint) => hint,
            None => declared_to,
        };

        if let Some(rule) = self.registry.find_exact(from, to) {
            debug!(property, converter = %rule.converter, "Resolved user converter");
            return Ok(Some(Conversion::from_rule(rule, to)));
        }
        if let Some(rule) = self.registry.find_for_subtype(from, to, self.types) {
            debug!(
                property,
                converter = %rule.converter,
                target_type = %to,
                "Resolved generic user converter"
            );
            return Ok(Some(Conversion::from_rule(rule, to)));
        }
        if let Some(builtin) = BuiltinConversion::find(from, to, self.types) {
            debug!(property, %builtin, "Resolved builtin conversion");
            return Ok(match builtin {
                BuiltinConversion::Identity => None,
                builtin => Some(Conversion::Builtin(builtin)),
            });
        }
        if let Some(mapping) = nested.nested_mapping(from, to)? {
            debug!(property, method = %mapping.method, "Resolved nested mapping");
            return Ok(Some(Conversion::Nested(mapping)));
        }

        Err(Report::new(Error::UnmappableType {
            property: property.to_string(),
            from:     from.clone(),
            to:       to.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    struct NoNesting;

    impl NestedMappings for NoNesting {
        fn nested_mapping(
            &mut self,
            _from: &TypeName,
            _to: &TypeName,
        ) -> Result<Option<NestedMapping>> {
            Ok(None)
        }
    }

    #[test]
    fn test_user_rule_precedes_builtin() {
        let types = test_support::registry();
        let rules = ConversionRegistry::new().with(ConversionRule::new("i32", "i64", "custom"));
        let resolver = ConversionResolver::new(&types, &rules);

        let conversion = resolver
            .resolve("count", &"i32".into(), &"i64".into(), None, &mut NoNesting)
            .expect("resolves");
        assert!(matches!(conversion, Some(Conversion::Converter { .. })));

        let widened = resolver
            .resolve("count", &"i16".into(), &"i64".into(), None, &mut NoNesting)
            .expect("resolves");
        assert_eq!(
            widened,
            Some(Conversion::Builtin(BuiltinConversion::Widening))
        );
    }

    #[test]
    fn test_identical_types_need_no_conversion() {
        let types = test_support::registry();
        let rules = ConversionRegistry::new();
        let resolver = ConversionResolver::new(&types, &rules);
        assert_eq!(
            resolver
                .resolve("name", &"String".into(), &"String".into(), None, &mut NoNesting)
                .expect("resolves"),
            None
        );
    }

    #[test]
    fn test_missing_rule_is_unmappable() {
        let types = test_support::registry();
        let rules = ConversionRegistry::new();
        let resolver = ConversionResolver::new(&types, &rules);
        let report = resolver
            .resolve("pets", &"String".into(), &"i64".into(), None, &mut NoNesting)
            .expect_err("no rule applies");
        assert!(matches!(
            report.current_context(),
            Error::UnmappableType { .. }
        ));
    }

    #[test]
    fn test_target_type_hint_selects_generic_converter() {
        let types = test_support::registry();
        let rules = test_support::conversions();
        let resolver = ConversionResolver::new(&types, &rules);

        let conversion = resolver
            .resolve(
                "pets",
                &"String".into(),
                &"Pet".into(),
                Some(&"OutdoorPet".into()),
                &mut NoNesting,
            )
            .expect("resolves");
        let Some(Conversion::Converter { target_type, .. }) = conversion else {
            panic!("expected a converter, got {conversion:?}");
        };
        assert_eq!(target_type, Some(TypeName::from("OutdoorPet")));

        let report = resolver
            .resolve(
                "pets",
                &"String".into(),
                &"Pet".into(),
                Some(&"i64".into()),
                &mut NoNesting,
            )
            .expect_err("hint must be a subtype");
        assert!(matches!(report.current_context(), Error::InvalidTypeHint(_)));
    }
}
