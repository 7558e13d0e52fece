//! Shared fixtures: a pet shop with collection properties, adders and failing converters

use serde_json::{Value, json};

use crate::config::GeneratorConfig;
use crate::convert::{ConversionRegistry, ConversionRule};
use crate::emit::{ConverterTable, RaisedFailure};
use crate::generator::Generator;
use crate::method::MappingMethod;
use crate::type_source::{MemberDescriptor as M, TypeDescriptor, TypeRegistry};

/// Every type the fixtures use
pub fn registry() -> TypeRegistry {
    TypeRegistry::new()
        // ===== Failures =====
        .with(TypeDescriptor::failure("Exception", false))
        .with(TypeDescriptor::failure("RuntimeException", true).with_supertype("Exception"))
        .with(TypeDescriptor::failure("DogException", false).with_supertype("Exception"))
        .with(TypeDescriptor::failure("CatException", false).with_supertype("RuntimeException"))
        // ===== Pets as strings and numbers =====
        .with(
            TypeDescriptor::bean("Source")
                .with_member(M::getter("getPets", "Vec<String>"))
                .with_member(M::writer("setPets", "Vec<String>")),
        )
        .with(
            TypeDescriptor::bean("Target")
                .with_member(M::getter("getPets", "Vec<i64>"))
                .with_member(M::writer("setPets", "Vec<i64>"))
                .with_member(M::writer("addPet", "i64")),
        )
        .with(
            TypeDescriptor::bean("TargetWithoutSetter")
                .with_member(M::getter("getPets", "Vec<i64>"))
                .with_member(M::writer("addPet", "i64")),
        )
        .with(TypeDescriptor::bean("TargetOnlyGetter").with_member(M::getter("getPets", "Vec<i64>")))
        // ===== Teeth =====
        .with(TypeDescriptor::bean("SourceTeeth").with_member(M::getter("getTeeth", "Vec<String>")))
        .with(
            TypeDescriptor::bean("TargetHuman")
                .with_member(M::getter("getTeeth", "Vec<i32>"))
                .with_member(M::writer("addTooth", "i32"))
                .with_member(M::writer("addTeeth", "i32")),
        )
        .with(
            TypeDescriptor::bean("TargetDali")
                .with_member(M::getter("getTeeth", "Vec<i32>"))
                .with_member(M::writer("addTeeth", "i32")),
        )
        // ===== Pets as beans =====
        .with(
            TypeDescriptor::bean("Pet")
                .with_member(M::getter("getValue", "i64"))
                .with_member(M::writer("setValue", "i64")),
        )
        .with(
            TypeDescriptor::bean("IndoorPet")
                .with_supertype("Pet")
                .with_member(M::getter("getValue", "i64"))
                .with_member(M::writer("setValue", "i64")),
        )
        .with(
            TypeDescriptor::bean("OutdoorPet")
                .with_supertype("Pet")
                .with_member(M::getter("getValue", "i64"))
                .with_member(M::writer("setValue", "i64")),
        )
        .with(
            TypeDescriptor::bean("TargetViaTargetType")
                .with_member(M::getter("getPets", "Vec<Pet>"))
                .with_member(M::writer("addPet", "Pet")),
        )
}

/// Converters between pet names, pet numbers, teeth and pet beans
pub fn conversions() -> ConversionRegistry {
    ConversionRegistry::new()
        .with(
            ConversionRule::new("String", "i64", "PetMapper::to_pet")
                .with_failures(["DogException", "CatException"]),
        )
        .with(ConversionRule::new("i64", "String", "PetMapper::to_source_pet"))
        .with(ConversionRule::new("String", "i32", "TeethMapper::to_tooth"))
        .with(
            ConversionRule::new("String", "Pet", "PetMapper::to_typed_pet")
                .with_failures(["DogException"])
                .accepting_target_type(),
        )
}

/// Generator over the fixture registry and converters, default configuration
pub fn generator() -> Generator<TypeRegistry> {
    generator_with(GeneratorConfig::default())
}

/// Generator over the fixture registry and converters
pub fn generator_with(config: GeneratorConfig) -> Generator<TypeRegistry> {
    Generator::new(registry(), config)
        .expect("fixture config is valid")
        .with_conversions(conversions())
}

// ===== Mapping methods =====

pub fn source_to_target() -> MappingMethod {
    MappingMethod::new("source_to_target", "Source", "Target").declaring(["DogException"])
}

pub fn to_existing_target() -> MappingMethod {
    MappingMethod::new("to_existing_target", "Source", "Target")
        .updating_existing_target()
        .declaring(["DogException"])
}

pub fn source_to_target_without_setter() -> MappingMethod {
    MappingMethod::new("to_target_without_setter", "Source", "TargetWithoutSetter")
        .declaring(["DogException"])
}

pub fn source_to_target_only_getter() -> MappingMethod {
    MappingMethod::new("to_target_only_getter", "Source", "TargetOnlyGetter")
        .declaring(["DogException"])
}

pub fn source_to_target_via_target_type() -> MappingMethod {
    MappingMethod::new("to_target_via_target_type", "Source", "TargetViaTargetType")
        .declaring(["DogException"])
        .with_target_type_hint("pets", "OutdoorPet")
}

pub fn teeth_to_human() -> MappingMethod {
    MappingMethod::new("to_target_human", "SourceTeeth", "TargetHuman")
}

pub fn teeth_to_dali() -> MappingMethod {
    MappingMethod::new("to_target_dali", "SourceTeeth", "TargetDali")
}

pub fn target_to_source() -> MappingMethod {
    MappingMethod::new("to_source", "Target", "Source")
}

// ===== Run-time converters =====

fn pet_name(value: &Value) -> &str {
    value.as_str().unwrap_or_default()
}

/// Run-time behaviour of the fixture converters
pub fn converters() -> ConverterTable {
    ConverterTable::new()
        .with("PetMapper::to_pet", |value, _| match pet_name(value) {
            "mouse" => Ok(json!(2)),
            "dog" => Err(RaisedFailure::new("DogException", "dogs are not allowed")),
            "cat" => Err(RaisedFailure::new("CatException", "cats are not allowed")),
            other => Err(RaisedFailure::new(
                "RuntimeException",
                format!("unknown pet `{other}`"),
            )),
        })
        .with("PetMapper::to_source_pet", |value, _| match value.as_i64() {
            Some(2) => Ok(json!("mouse")),
            Some(3) => Ok(json!("cat")),
            other => Err(RaisedFailure::new(
                "RuntimeException",
                format!("unknown pet number {other:?}"),
            )),
        })
        .with("TeethMapper::to_tooth", |value, _| match pet_name(value) {
            "moler" => Ok(json!(3)),
            other => Err(RaisedFailure::new(
                "RuntimeException",
                format!("unknown tooth `{other}`"),
            )),
        })
        .with("PetMapper::to_typed_pet", |value, target_type| match pet_name(value) {
            "mouse" => Ok(json!({
                "type": target_type.map(ToString::to_string),
                "value": 2
            })),
            _ => Err(RaisedFailure::new("DogException", "not a known pet")),
        })
}
