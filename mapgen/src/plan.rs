//! The resolved mapping plan handed from the planner to the verifier and emitter

use serde::{Deserialize, Serialize};

use crate::convert::Conversion;
use crate::shape::{Accessor, Property};
use crate::strategy::{MergeVia, PropertyAction};
use crate::type_name::TypeName;

/// A member or converter the generated code invokes, with its declared failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Name of the member or converter
    pub invoked:  &'a str,
    /// Failures it declares
    pub failures: &'a [TypeName],
}

/// One target property and how it is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedProperty {
    /// Property read from the source
    pub source:     Property,
    /// Property written on the target
    pub target:     Property,
    /// What the generated code does
    pub action:     PropertyAction,
    /// Conversion applied to the value, or to each element for element-wise actions
    pub conversion: Option<Conversion>,
}

impl PlannedProperty {
    /// The target member the action invokes
    pub fn mutator(&self) -> Option<&Accessor> {
        let accessors = &self.target.accessors;
        match self.action {
            PropertyAction::Assign | PropertyAction::ConvertAssign | PropertyAction::ReplaceSet => {
                accessors.setter.as_ref()
            },
            PropertyAction::MergeAdd {
                via: MergeVia::Adder,
            } => accessors.adder.as_ref(),
            PropertyAction::MergeAdd {
                via: MergeVia::Getter,
            } => accessors.getter.as_ref(),
        }
    }

    /// Type the conversion reads: the source element type for element-wise actions
    pub fn source_value_type(&self) -> &TypeName {
        self.value_type_of(&self.source)
    }

    /// Type the conversion produces: the target element type for element-wise actions
    pub fn target_value_type(&self) -> &TypeName {
        self.value_type_of(&self.target)
    }

    fn value_type_of<'a>(&self, property: &'a Property) -> &'a TypeName {
        match (&property.element_type, self.action.is_element_wise()) {
            (Some(element), true) => element,
            _ => &property.value_type,
        }
    }

    /// Everything invoked for this property that may raise a failure: the source reader,
    /// the conversion and the target mutator
    pub fn invocations(&self) -> Vec<Invocation<'_>> {
        let mut invocations = Vec::new();
        if let Some(reader) = &self.source.accessors.getter {
            invocations.push(Invocation {
                invoked:  &reader.member,
                failures: &reader.failures,
            });
        }
        if let Some(conversion) = &self.conversion {
            invocations.push(Invocation {
                invoked:  conversion.invoked_name(),
                failures: conversion.declared_failures(),
            });
        }
        if let Some(mutator) = self.mutator() {
            invocations.push(Invocation {
                invoked:  &mutator.member,
                failures: &mutator.failures,
            });
        }
        invocations
    }
}

/// Ordered per-property actions for one mapping method
///
/// Built once per method and consumed by value by the emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingPlan {
    /// Name of the implemented method
    pub method:                  String,
    /// Type read from
    pub source_type:             TypeName,
    /// Type written to
    pub target_type:             TypeName,
    /// The method writes into a caller-supplied target
    pub updates_existing_target: bool,
    /// Failures the method declares
    pub declared_failures:       Vec<TypeName>,
    /// Actions in source property order
    pub properties:              Vec<PlannedProperty>,
}

impl MappingPlan {
    /// Plans of automatically derived nested methods used by this plan, in first-use order
    pub fn nested_plans(&self) -> impl Iterator<Item = &Self> {
        self.properties
            .iter()
            .filter_map(|property| match &property.conversion {
                Some(Conversion::Nested(nested)) => nested.plan.as_deref(),
                _ => None,
            })
    }

    /// Look up the planned action for a target property
    pub fn property(&self, target: &str) -> Option<&PlannedProperty> {
        self.properties
            .iter()
            .find(|property| property.target.name == target)
    }
}
