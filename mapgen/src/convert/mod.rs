//! Conversion resolution: user rules, built-in rules and nested mappings

mod builtin;
mod resolver;
mod rule;

pub use builtin::BuiltinConversion;
pub use resolver::{Conversion, ConversionResolver, NestedMapping, NestedMappings};
pub use rule::{ConversionRegistry, ConversionRule, ConverterRef};
