//! Executes verified plans over JSON objects
//!
//! Beans are `serde_json` objects keyed by property name. Converters are closures registered
//! under their converter path. Every mutator the plan invokes is recorded, so callers can
//! observe which mutation points ran.

use std::collections::HashMap;
use std::sync::Arc;

use error_stack::Report;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

use super::Emitter;
use crate::convert::Conversion;
use crate::error::{Error, Result};
use crate::method::MappingMethod;
use crate::plan::{MappingPlan, PlannedProperty};
use crate::strategy::{MergeVia, PropertyAction};
use crate::type_name::TypeName;
use crate::verify::VerifiedPlan;

/// A failure raised by a converter at run time, passed to the caller unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{failure_type}: {message}")]
pub struct RaisedFailure {
    /// Failure type, as declared to the host type system
    pub failure_type: TypeName,
    /// Human-readable detail
    pub message:      String,
}

impl RaisedFailure {
    /// Raise `failure_type`
    pub fn new(failure_type: impl Into<TypeName>, message: impl Into<String>) -> Self {
        Self {
            failure_type: failure_type.into(),
            message:      message.into(),
        }
    }
}

/// Run-time errors of a compiled mapping
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A converter raised a failure
    #[error(transparent)]
    Raised(#[from] RaisedFailure),
    /// A nested mapping method is not part of this compiled mapping
    #[error("Mapping method `{0}` is not linked")]
    UnknownMethod(String),
    /// A converter is not registered
    #[error("Converter `{0}` is not registered")]
    MissingConverter(String),
    /// A bean value is not a JSON object
    #[error("Expected an object for `{type_name}`, found {found}")]
    NotAnObject {
        /// The bean type being read or written
        type_name: TypeName,
        /// Kind of the value found instead
        found:     String,
    },
    /// A collection property does not hold an array
    #[error("Expected an array for property `{property}`")]
    NotACollection {
        /// The offending property
        property: String,
    },
}

/// A registered converter: the value to convert and the concrete target type, if requested
pub type Converter =
    Arc<dyn Fn(&Value, Option<&TypeName>) -> std::result::Result<Value, RaisedFailure> + Send + Sync>;

/// Converters keyed by converter path
#[derive(Clone, Default)]
pub struct ConverterTable {
    converters: HashMap<String, Converter>,
}

impl ConverterTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter under `path`
    #[must_use]
    pub fn with<F>(mut self, path: impl Into<String>, converter: F) -> Self
    where
        F: Fn(&Value, Option<&TypeName>) -> std::result::Result<Value, RaisedFailure>
            + Send
            + Sync
            + 'static,
    {
        self.converters.insert(path.into(), Arc::new(converter));
        self
    }

    fn get(&self, path: &str) -> Option<&Converter> {
        self.converters.get(path)
    }
}

impl std::fmt::Debug for ConverterTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut paths: Vec<&String> = self.converters.keys().collect();
        paths.sort();
        f.debug_struct("ConverterTable")
            .field("converters", &paths)
            .finish()
    }
}

/// One mutator invocation observed during execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutatorCall {
    /// Mapping method that made the call
    pub method:   String,
    /// Target property written
    pub property: String,
    /// Member invoked
    pub member:   String,
    /// Action the call belongs to
    pub action:   PropertyAction,
}

/// Result of one execution
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// The written target
    pub target: Value,
    /// Mutator calls in invocation order
    pub calls:  Vec<MutatorCall>,
}

impl Execution {
    /// Whether any adder was invoked
    pub fn used_adder(&self) -> bool {
        uses_adder(&self.calls)
    }
}

fn uses_adder(calls: &[MutatorCall]) -> bool {
    calls.iter().any(|call| {
        call.action
            == PropertyAction::MergeAdd {
                via: MergeVia::Adder,
            }
    })
}

/// A verified plan ready to run, together with the nested plans it uses
#[derive(Debug, Clone)]
pub struct CompiledMapping {
    method:     String,
    plans:      HashMap<String, MappingPlan>,
    converters: ConverterTable,
}

impl CompiledMapping {
    /// Name of the compiled method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Make the methods of `other` callable as nested mappings
    #[must_use]
    pub fn linked_with(mut self, other: &Self) -> Self {
        for (name, plan) in &other.plans {
            self.plans
                .entry(name.clone())
                .or_insert_with(|| plan.clone());
        }
        self
    }

    /// Map `source` into a new target
    pub fn map(&self, source: &Value) -> std::result::Result<Execution, ExecutionError> {
        let mut target = Value::Object(Map::new());
        let mut calls = Vec::new();
        self.run(&self.method, source, &mut target, &mut calls)?;
        Ok(Execution { target, calls })
    }

    /// Map `source` into a caller-supplied target; existing collection contents are kept
    pub fn map_into(
        &self,
        source: &Value,
        target: &mut Value,
    ) -> std::result::Result<Vec<MutatorCall>, ExecutionError> {
        let mut calls = Vec::new();
        self.run(&self.method, source, target, &mut calls)?;
        Ok(calls)
    }

    fn run(
        &self,
        method: &str,
        source: &Value,
        target: &mut Value,
        calls: &mut Vec<MutatorCall>,
    ) -> std::result::Result<(), ExecutionError> {
        let plan = self
            .plans
            .get(method)
            .ok_or_else(|| ExecutionError::UnknownMethod(method.to_string()))?;
        let source_fields = as_object(source, &plan.source_type)?;
        if target.is_null() {
            *target = Value::Object(Map::new());
        }
        let found = kind_of(target);
        let Value::Object(target_fields) = target else {
            return Err(ExecutionError::NotAnObject {
                type_name: plan.target_type.clone(),
                found,
            });
        };

        for property in &plan.properties {
            // absent and null source values leave the target untouched
            let Some(value) = source_fields.get(&property.source.name).filter(|v| !v.is_null())
            else {
                trace!(method, property = %property.source.name, "Source value absent");
                continue;
            };
            self.apply(plan, property, value, target_fields, calls)?;
        }
        Ok(())
    }

    fn apply(
        &self,
        plan: &MappingPlan,
        property: &PlannedProperty,
        value: &Value,
        target: &mut Map<String, Value>,
        calls: &mut Vec<MutatorCall>,
    ) -> std::result::Result<(), ExecutionError> {
        let name = &property.target.name;
        let member = property
            .mutator()
            .map(|accessor| accessor.member.clone())
            .unwrap_or_default();
        let record = |calls: &mut Vec<MutatorCall>| {
            calls.push(MutatorCall {
                method:   plan.method.clone(),
                property: name.clone(),
                member:   member.clone(),
                action:   property.action,
            });
        };

        match property.action {
            PropertyAction::Assign | PropertyAction::ConvertAssign => {
                let converted = self.convert(property.conversion.as_ref(), value, calls)?;
                target.insert(name.clone(), converted);
                record(calls);
            },
            PropertyAction::ReplaceSet => {
                let mut collection = Vec::new();
                for element in elements(value, &property.source.name)? {
                    collection.push(self.convert(property.conversion.as_ref(), element, calls)?);
                }
                target.insert(name.clone(), Value::Array(collection));
                record(calls);
            },
            PropertyAction::MergeAdd { via } => {
                let slot = target
                    .entry(name.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if slot.is_null() {
                    *slot = Value::Array(Vec::new());
                }
                for element in elements(value, &property.source.name)? {
                    let converted = self.convert(property.conversion.as_ref(), element, calls)?;
                    let Value::Array(existing) = &mut *slot else {
                        return Err(ExecutionError::NotACollection {
                            property: name.clone(),
                        });
                    };
                    existing.push(converted);
                    if via == MergeVia::Adder {
                        record(calls);
                    }
                }
                if via == MergeVia::Getter {
                    record(calls);
                }
            },
        }
        Ok(())
    }

    fn convert(
        &self,
        conversion: Option<&Conversion>,
        value: &Value,
        calls: &mut Vec<MutatorCall>,
    ) -> std::result::Result<Value, ExecutionError> {
        match conversion {
            // JSON values need no widening, boxing or enum translation
            None | Some(Conversion::Builtin(_)) => Ok(value.clone()),
            Some(Conversion::Converter {
                converter,
                target_type,
                ..
            }) => {
                let function = self
                    .converters
                    .get(converter.as_str())
                    .ok_or_else(|| ExecutionError::MissingConverter(converter.to_string()))?;
                Ok(function(value, target_type.as_ref())?)
            },
            Some(Conversion::Nested(nested)) => {
                let mut target = Value::Object(Map::new());
                self.run(&nested.method, value, &mut target, calls)?;
                Ok(target)
            },
        }
    }
}

fn kind_of(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

fn as_object<'v>(
    value: &'v Value,
    type_name: &TypeName,
) -> std::result::Result<&'v Map<String, Value>, ExecutionError> {
    value.as_object().ok_or_else(|| ExecutionError::NotAnObject {
        type_name: type_name.clone(),
        found:     kind_of(value),
    })
}

fn elements<'v>(
    value: &'v Value,
    property: &str,
) -> std::result::Result<&'v Vec<Value>, ExecutionError> {
    value.as_array().ok_or_else(|| ExecutionError::NotACollection {
        property: property.to_string(),
    })
}

/// Emitter producing [`CompiledMapping`]s
#[derive(Debug, Clone, Default)]
pub struct PlanInterpreter {
    converters: ConverterTable,
}

impl PlanInterpreter {
    /// Create an interpreter calling `converters`
    pub const fn new(converters: ConverterTable) -> Self {
        Self { converters }
    }

    fn collect_plans(plan: &MappingPlan, plans: &mut HashMap<String, MappingPlan>) {
        for nested in plan.nested_plans() {
            Self::collect_plans(nested, plans);
        }
        plans
            .entry(plan.method.clone())
            .or_insert_with(|| plan.clone());
    }

    fn check_converters(&self, plan: &MappingPlan) -> Result<()> {
        for property in &plan.properties {
            if let Some(Conversion::Converter { converter, .. }) = &property.conversion
                && self.converters.get(converter.as_str()).is_none()
            {
                return Err(Report::new(Error::emission_failed(
                    "converter call",
                    format!("`{converter}` is not registered with the interpreter"),
                ))
                .attach(format!("Property: {}", property.target.name)));
            }
        }
        Ok(())
    }
}

impl Emitter for PlanInterpreter {
    type Output = CompiledMapping;

    fn emit(&mut self, method: &MappingMethod, plan: VerifiedPlan) -> Result<CompiledMapping> {
        let plan = plan.into_inner();
        let mut plans = HashMap::new();
        Self::collect_plans(&plan, &mut plans);
        for collected in plans.values() {
            self.check_converters(collected)?;
        }
        debug!(method = %method.name, plans = plans.len(), "Compiled mapping");
        Ok(CompiledMapping {
            method: method.name.clone(),
            plans,
            converters: self.converters.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_kind_of_names_json_kinds() {
        let cases = [
            (json!(null), "null"),
            (json!(1), "number"),
            (json!("x"), "string"),
            (json!([]), "array"),
            (json!({}), "object"),
        ];
        for (value, kind) in cases {
            assert_eq!(kind_of(&value), kind, "Failed for: {value}");
        }
    }

    #[test]
    fn test_adder_detection() {
        let call = |action| MutatorCall {
            method: "m".to_string(),
            property: "pets".to_string(),
            member: "addPet".to_string(),
            action,
        };
        assert!(uses_adder(&[call(PropertyAction::MergeAdd {
            via: MergeVia::Adder
        })]));
        assert!(!uses_adder(&[
            call(PropertyAction::ReplaceSet),
            call(PropertyAction::MergeAdd {
                via: MergeVia::Getter
            }),
        ]));
    }
}
