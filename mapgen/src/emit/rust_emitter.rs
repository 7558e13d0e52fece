//! Renders verified plans as Rust functions
//!
//! Member names are normalized to snake_case, so a host member `addPet` becomes a call to
//! `add_pet`. Calls declaring a checked failure return `Result` and are followed by `?`.
//! Calls whose failures are all unchecked stay bare, so those failures surface exactly as
//! raised and are never wrapped or translated.

use std::collections::HashSet;

use error_stack::Report;
use heck::ToSnakeCase;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use super::Emitter;
use crate::convert::{BuiltinConversion, Conversion};
use crate::error::{Error, Result};
use crate::method::MappingMethod;
use crate::plan::{MappingPlan, PlannedProperty};
use crate::strategy::{MergeVia, PropertyAction};
use crate::type_name::{ContainerKind, TypeName};
use crate::verify::VerifiedPlan;

/// Rust source for one mapping method and the derived methods it needs
#[derive(Debug, Clone)]
pub struct GeneratedSource {
    /// Name of the mapping method
    pub method: String,
    /// The rendered items
    pub tokens: TokenStream,
}

impl GeneratedSource {
    /// The items as source text
    pub fn render(&self) -> String {
        self.tokens.to_string()
    }
}

/// Emitter producing Rust functions
///
/// Derived nested methods are rendered once per emitter, alongside the first method that
/// needs them.
#[derive(Debug, Default)]
pub struct RustEmitter {
    emitted: HashSet<String>,
}

impl RustEmitter {
    /// Create an emitter
    pub fn new() -> Self {
        Self::default()
    }

    fn render_plan(&self, plan: &MappingPlan, contract: &VerifiedPlan) -> Result<TokenStream> {
        let name = ident(&plan.method)?;
        let source_type = rust_type(&plan.source_type)?;
        let target_type = rust_type(&plan.target_type)?;
        let error_type = error_type(&plan.declared_failures, contract)?;

        let statements = plan
            .properties
            .iter()
            .map(|property| {
                render_property(property, contract)
                    .map_err(|report| report.attach(format!("Property: {}", property.target.name)))
            })
            .collect::<Result<Vec<_>>>()?;

        let tokens = if plan.updates_existing_target {
            let (returns, tail) = match &error_type {
                Some(error) => (
                    quote! { -> ::std::result::Result<(), #error> },
                    quote! { Ok(()) },
                ),
                None => (quote! {}, quote! {}),
            };
            quote! {
                pub fn #name(source: &#source_type, target: &mut #target_type) #returns {
                    #(#statements)*
                    #tail
                }
            }
        } else {
            let (returns, tail) = match &error_type {
                Some(error) => (
                    quote! { -> ::std::result::Result<#target_type, #error> },
                    quote! { Ok(target) },
                ),
                None => (quote! { -> #target_type }, quote! { target }),
            };
            quote! {
                pub fn #name(source: &#source_type) #returns {
                    let mut target = <#target_type>::default();
                    #(#statements)*
                    #tail
                }
            }
        };
        Ok(tokens)
    }

    fn render_nested(
        &mut self,
        plan: &MappingPlan,
        contract: &VerifiedPlan,
        items: &mut Vec<TokenStream>,
    ) -> Result<()> {
        for nested in plan.nested_plans() {
            if !self.emitted.insert(nested.method.clone()) {
                continue;
            }
            self.render_nested(nested, contract, items)?;
            items.push(self.render_plan(nested, contract)?);
        }
        Ok(())
    }
}

impl Emitter for RustEmitter {
    type Output = GeneratedSource;

    fn emit(&mut self, method: &MappingMethod, plan: VerifiedPlan) -> Result<GeneratedSource> {
        let mut items = vec![self.render_plan(plan.plan(), &plan)?];
        self.render_nested(plan.plan(), &plan, &mut items)?;

        let tokens = quote! { #(#items)* };
        syn::parse2::<syn::File>(tokens.clone())
            .map_err(|e| Report::new(Error::emission_failed("generated items", e)))?;

        Ok(GeneratedSource {
            method: method.name.clone(),
            tokens,
        })
    }
}

fn render_property(property: &PlannedProperty, contract: &VerifiedPlan) -> Result<TokenStream> {
    let reader = property.source.accessors.getter.as_ref().ok_or_else(|| {
        Report::new(Error::emission_failed("property read", "source property has no getter"))
    })?;
    let mutator = property.mutator().ok_or_else(|| {
        Report::new(Error::emission_failed("property write", "target property has no mutator"))
    })?;

    let read = ident(&reader.member.to_snake_case())?;
    let read_try = try_operator(&reader.failures, contract);
    let write = ident(&mutator.member.to_snake_case())?;
    let write_try = try_operator(&mutator.failures, contract);

    let source_value = quote! { source.#read() #read_try };
    let element = format_ident!("element");
    let converted = conversion(property, quote! { #element }, contract)?;

    let tokens = match property.action {
        PropertyAction::Assign => quote! {
            target.#write(#source_value.clone()) #write_try;
        },
        PropertyAction::ConvertAssign => quote! {
            {
                let #element = #source_value.clone();
                target.#write(#converted) #write_try;
            }
        },
        PropertyAction::ReplaceSet => {
            let collection_type = rust_type(&property.target.value_type)?;
            let insert = insert_method(&property.target.value_type);
            let collection = format_ident!("new_{}", ident(&property.target.name)?);
            quote! {
                let mut #collection = <#collection_type>::new();
                for #element in #source_value.iter().cloned() {
                    #collection.#insert(#converted);
                }
                target.#write(#collection) #write_try;
            }
        },
        PropertyAction::MergeAdd {
            via: MergeVia::Adder,
        } => quote! {
            for #element in #source_value.iter().cloned() {
                target.#write(#converted) #write_try;
            }
        },
        PropertyAction::MergeAdd {
            via: MergeVia::Getter,
        } => {
            let insert = insert_method(&property.target.value_type);
            quote! {
                for #element in #source_value.iter().cloned() {
                    target.#write() #write_try .#insert(#converted);
                }
            }
        },
    };
    Ok(tokens)
}

fn conversion(
    property: &PlannedProperty,
    input: TokenStream,
    contract: &VerifiedPlan,
) -> Result<TokenStream> {
    let Some(conversion) = &property.conversion else {
        return Ok(input);
    };
    let tokens = match conversion {
        Conversion::Builtin(BuiltinConversion::Identity) => input,
        Conversion::Builtin(BuiltinConversion::Widening) => {
            let to = rust_type(property.target_value_type())?;
            quote! { <#to>::from(#input) }
        },
        Conversion::Builtin(BuiltinConversion::Boxing) => {
            quote! { ::std::boxed::Box::new(#input) }
        },
        Conversion::Builtin(BuiltinConversion::Unboxing) => quote! { *#input },
        Conversion::Builtin(BuiltinConversion::EnumByName { variants }) => {
            let from = rust_path(property.source_value_type().as_str())?;
            let to = rust_path(property.target_value_type().as_str())?;
            let arms = variants
                .iter()
                .map(|variant| {
                    let variant = ident(variant)?;
                    Ok(quote! { #from::#variant => #to::#variant })
                })
                .collect::<Result<Vec<_>>>()?;
            quote! { match #input { #(#arms,)* } }
        },
        Conversion::Converter {
            converter,
            target_type,
            declared_failures,
        } => {
            let path = rust_path(converter.as_str())?;
            let fallible = try_operator(declared_failures, contract);
            match target_type {
                Some(target_type) => {
                    let target_type = rust_type(target_type)?;
                    quote! { #path::<#target_type>(#input) #fallible }
                },
                None => quote! { #path(#input) #fallible },
            }
        },
        Conversion::Nested(nested) => {
            let method = ident(&nested.method)?;
            let fallible = try_operator(&nested.declared_failures, contract);
            quote! { #method(&#input) #fallible }
        },
    };
    Ok(tokens)
}

/// `?` only when the call can return a checked failure
fn try_operator(failures: &[TypeName], contract: &VerifiedPlan) -> Option<TokenStream> {
    contract
        .checked(failures)
        .next()
        .is_some()
        .then(|| quote! { ? })
}

/// Error type of a generated function, from the checked failures it declares
fn error_type(declared: &[TypeName], contract: &VerifiedPlan) -> Result<Option<TokenStream>> {
    let checked: Vec<&TypeName> = contract.checked(declared).collect();
    match checked.as_slice() {
        [] => Ok(None),
        [single] => {
            let single = rust_type(single)?;
            Ok(Some(quote! { #single }))
        },
        _ => Ok(Some(
            quote! { ::std::boxed::Box<dyn ::std::error::Error + Send + Sync> },
        )),
    }
}

fn insert_method(collection: &TypeName) -> Ident {
    match collection.container_kind() {
        Some(ContainerKind::VecDeque | ContainerKind::LinkedList) => format_ident!("push_back"),
        Some(ContainerKind::HashSet | ContainerKind::BTreeSet | ContainerKind::IndexSet) => {
            format_ident!("insert")
        },
        Some(ContainerKind::Vec) | None => format_ident!("push"),
    }
}

fn ident(name: &str) -> Result<Ident> {
    syn::parse_str::<Ident>(name)
        .map_err(|e| Report::new(Error::emission_failed(&format!("identifier `{name}`"), e)))
}

fn rust_type(type_name: &TypeName) -> Result<syn::Type> {
    syn::parse_str::<syn::Type>(type_name.as_str())
        .map_err(|e| Report::new(Error::emission_failed(&format!("type `{type_name}`"), e)))
}

fn rust_path(path: &str) -> Result<syn::Path> {
    syn::parse_str::<syn::Path>(path)
        .map_err(|e| Report::new(Error::emission_failed(&format!("path `{path}`"), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectionStrategy, GeneratorConfig};
    use crate::convert::ConversionRule;
    use crate::generator::Generator;
    use crate::test_support;

    fn compact(source: &GeneratedSource) -> String {
        source.render().chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_fallible_converter_is_followed_by_try() {
        let generator = test_support::generator();
        let method = test_support::source_to_target();
        let mut emitter = RustEmitter::new();

        let source = generator
            .generate(&method, &[], &mut emitter)
            .expect("source_to_target generates");
        let rendered = compact(&source);

        assert!(rendered.contains("pubfnsource_to_target(source:&Source)->::std::result::Result<Target,DogException>"));
        assert!(rendered.contains("letmutnew_pets=<Vec<i64>>::new();"));
        assert!(rendered.contains("new_pets.push(PetMapper::to_pet(element)?);"));
        assert!(rendered.contains("target.set_pets(new_pets);"));
        assert!(!rendered.contains("add_pet"));
    }

    #[test]
    fn test_adder_and_target_type_rendering() {
        let generator = test_support::generator();
        let mut emitter = RustEmitter::new();

        let merge = test_support::to_existing_target()
            .with_strategy(CollectionStrategy::PreferAdderWhenAvailable);
        let rendered = compact(&generator.generate(&merge, &[], &mut emitter).expect("merge generates"));
        assert!(rendered.contains("target:&mutTarget"));
        assert!(rendered.contains("target.add_pet(PetMapper::to_pet(element)?);"));
        assert!(rendered.ends_with("Ok(())}"));

        let typed = test_support::source_to_target_via_target_type();
        let rendered = compact(&generator.generate(&typed, &[], &mut emitter).expect("typed generates"));
        assert!(rendered.contains("PetMapper::to_typed_pet::<OutdoorPet>(element)?"));
    }

    #[test]
    fn test_unchecked_only_converter_stays_bare() {
        let generator = Generator::new(test_support::registry(), GeneratorConfig::default())
            .expect("default config is valid")
            .with_conversion(
                ConversionRule::new("String", "i64", "PetMapper::risky").with_failures(["CatException"]),
            );
        let method = MappingMethod::new("no_contract", "Source", "Target");
        let mut emitter = RustEmitter::new();

        let rendered = compact(
            &generator
                .generate(&method, &[], &mut emitter)
                .expect("unchecked failures need no declaration"),
        );
        assert!(rendered.contains("pubfnno_contract(source:&Source)->Target{"));
        assert!(rendered.contains("new_pets.push(PetMapper::risky(element));"));
        assert!(!rendered.contains('?'));
        assert!(rendered.ends_with("target}"));
    }

    #[test]
    fn test_return_type_lists_only_checked_failures() {
        let generator = test_support::generator();
        let method = MappingMethod::new("with_runtime", "Source", "Target")
            .declaring(["DogException", "RuntimeException"]);
        let mut emitter = RustEmitter::new();

        let rendered = compact(
            &generator
                .generate(&method, &[], &mut emitter)
                .expect("with_runtime generates"),
        );
        assert!(rendered.contains("->::std::result::Result<Target,DogException>"));
        assert!(!rendered.contains("Box<dyn"));
        assert!(rendered.contains("new_pets.push(PetMapper::to_pet(element)?);"));
    }

    #[test]
    fn test_insert_method_follows_container() {
        let cases = [
            ("Vec<i64>", "push"),
            ("VecDeque<i64>", "push_back"),
            ("BTreeSet<i64>", "insert"),
            ("Custom<i64>", "push"),
        ];
        for (collection, expected) in cases {
            assert_eq!(
                insert_method(&collection.into()).to_string(),
                expected,
                "Failed for: {collection}"
            );
        }
    }
}
