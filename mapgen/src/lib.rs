//! # mapgen
//!
//! Plans the implementation of object-to-object mapping methods at generation time.
//!
//! Given a source type, a target type and a mapping-method signature, the engine
//! introspects both types through a host [`TypeSource`], pairs source properties with
//! target mutation points, resolves element conversions, picks a collection strategy for
//! every collection property and checks that every checked failure a converter or mutator
//! may raise is declared by the method. The result is a [`VerifiedPlan`], handed to an
//! [`Emitter`]: [`RustEmitter`] renders Rust source, [`PlanInterpreter`] runs the plan over
//! JSON objects.
//!
//! ```no_run
//! use mapgen::{
//!     ConversionRule, Generator, GeneratorConfig, MappingMethod, RustEmitter, TypeRegistry,
//! };
//!
//! # fn main() -> mapgen::Result<()> {
//! let types = TypeRegistry::from_json_str(&std::fs::read_to_string("types.json").unwrap_or_default())?;
//! let generator = Generator::new(types, GeneratorConfig::default())?
//!     .with_conversion(ConversionRule::new("String", "i64", "PetMapper::to_pet"));
//!
//! let methods = [MappingMethod::new("source_to_target", "Source", "Target")];
//! let report = generator.generate_all(&methods, &mut RustEmitter::new());
//! for source in &report.generated {
//!     println!("{}", source.render());
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod convert;
mod correlate;
mod emit;
mod error;
mod generator;
mod inflection;
mod log_support;
mod method;
mod plan;
mod shape;
mod strategy;
mod type_name;
mod type_source;
mod verify;

#[cfg(test)]
mod test_support;

pub use config::{CollectionStrategy, DEFAULT_MAX_NESTING_DEPTH, GeneratorConfig, NamePrecedence};
pub use convert::{
    BuiltinConversion, Conversion, ConversionRegistry, ConversionResolver, ConversionRule,
    ConverterRef, NestedMapping, NestedMappings,
};
pub use correlate::{CorrelatedProperty, MatchKind, PropertyCorrelator};
pub use emit::{
    CompiledMapping, Converter, ConverterTable, Emitter, Execution, ExecutionError,
    GeneratedSource, MutatorCall, PlanInterpreter, RaisedFailure, RustEmitter,
};
pub use error::{Error, Result};
pub use generator::{BatchReport, Generator, MethodFailure};
pub use inflection::{IRREGULAR_SINGULARS, Inflector};
pub use log_support::{DynamicFilter, LazyFileWriter, TRACE_LOG_FILE_NAME, TracingLevel};
pub use method::{MappingMethod, PropertyOption, PropertyOptions};
pub use plan::{Invocation, MappingPlan, PlannedProperty};
pub use shape::{
    Accessor, Accessors, BeanShape, MutationPoint, Property, ShapeCache, ShapeIntrospector,
};
pub use strategy::{CollectionStrategySelector, MergeVia, PropertyAction};
pub use type_name::{ContainerKind, TypeName};
pub use type_source::{MemberDescriptor, TypeDescriptor, TypeKind, TypeRegistry, TypeSource};
pub use verify::{FailureContractVerifier, VerifiedPlan};
