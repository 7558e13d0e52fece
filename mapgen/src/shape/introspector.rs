//! Builds [`BeanShape`]s from host type descriptors
//!
//! Members are classified by naming convention once, after normalizing their names to
//! snake_case, so `getPets`, `get_pets` and `pets` all read the `pets` property.

use std::sync::Arc;

use error_stack::Report;
use heck::ToSnakeCase;
use tracing::{debug, trace, warn};

use super::cache::ShapeCache;
use super::property::{Accessor, Accessors, BeanShape, Property};
use crate::error::{Error, Result};
use crate::inflection::Inflector;
use crate::type_name::TypeName;
use crate::type_source::{MemberDescriptor, TypeDescriptor, TypeSource};

const GETTER_PREFIX: &str = "get_";
const BOOLEAN_GETTER_PREFIX: &str = "is_";
const SETTER_PREFIX: &str = "set_";
const ADDER_PREFIX: &str = "add_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessorRole {
    Getter,
    Setter,
    Adder,
}

/// Property being assembled from its members
#[derive(Debug, Default)]
struct PropertyDraft {
    name:        String,
    getter_type: Option<TypeName>,
    setter_type: Option<TypeName>,
    accessors:   Accessors,
}

#[derive(Debug)]
struct AdderDraft {
    suffix:   String,
    element:  TypeName,
    accessor: Accessor,
    attached: bool,
}

/// Turns type references into memoized [`BeanShape`]s
pub struct ShapeIntrospector<'a> {
    types:     &'a dyn TypeSource,
    cache:     &'a ShapeCache,
    inflector: &'a Inflector,
}

impl<'a> ShapeIntrospector<'a> {
    /// Create an introspector over a type source and a shape cache
    pub const fn new(
        types: &'a dyn TypeSource,
        cache: &'a ShapeCache,
        inflector: &'a Inflector,
    ) -> Self {
        Self {
            types,
            cache,
            inflector,
        }
    }

    /// Introspect a type, consulting the cache first
    pub fn introspect(&self, type_name: &TypeName) -> Result<Arc<BeanShape>> {
        if let Some(shape) = self.cache.get(type_name) {
            trace!(type_name = %type_name, "Shape cache hit");
            return Ok(shape);
        }

        let shape = match self.types.describe(type_name) {
            Some(descriptor) => self.build_shape(&descriptor),
            // Built-in containers need no host description
            None if type_name.is_collection() => BeanShape {
                type_name:  type_name.clone(),
                properties: Vec::new(),
            },
            None => {
                return Err(Report::new(Error::UnknownType {
                    type_name: type_name.clone(),
                }));
            },
        };

        debug!(
            type_name = %type_name,
            properties = shape.properties.len(),
            "Introspected shape"
        );
        Ok(self.cache.insert_if_absent(shape))
    }

    /// Introspect a type that a mapping method writes to
    ///
    /// Fails with [`Error::Shape`] when nothing on the type can be written, unless the type
    /// is a recognized built-in container.
    pub fn introspect_target(&self, type_name: &TypeName) -> Result<Arc<BeanShape>> {
        let shape = self.introspect(type_name)?;
        if shape.has_mutation_points() || type_name.is_collection() {
            return Ok(shape);
        }
        Err(Report::new(Error::no_mutation_points(
            type_name,
            "no setter, adder or getter-only collection found",
        )))
    }

    fn build_shape(&self, descriptor: &TypeDescriptor) -> BeanShape {
        if !descriptor.is_bean() {
            return BeanShape {
                type_name:  descriptor.name.clone(),
                properties: Vec::new(),
            };
        }

        let mut drafts: Vec<PropertyDraft> = Vec::new();
        let mut adders: Vec<AdderDraft> = Vec::new();

        for member in &descriptor.members {
            let Some((role, name, value_type)) = Self::classify(member) else {
                trace!(
                    type_name = %descriptor.name,
                    member = %member.name,
                    "Member is not an accessor"
                );
                continue;
            };
            let accessor = Accessor::new(&member.name, member.failures.clone());

            if role == AccessorRole::Adder {
                adders.push(AdderDraft {
                    suffix: name,
                    element: value_type,
                    accessor,
                    attached: false,
                });
                continue;
            }

            let index = match drafts.iter().position(|draft| draft.name == name) {
                Some(index) => index,
                None => {
                    drafts.push(PropertyDraft {
                        name,
                        ..PropertyDraft::default()
                    });
                    drafts.len() - 1
                },
            };
            let draft = &mut drafts[index];
            match role {
                AccessorRole::Getter if draft.accessors.getter.is_none() => {
                    draft.getter_type = Some(value_type);
                    draft.accessors.getter = Some(accessor);
                },
                AccessorRole::Setter if draft.accessors.setter.is_none() => {
                    draft.setter_type = Some(value_type);
                    draft.accessors.setter = Some(accessor);
                },
                _ => {
                    trace!(member = %member.name, "Duplicate accessor ignored");
                },
            }
        }

        let mut properties: Vec<Property> = drafts
            .into_iter()
            .filter_map(|draft| Self::finish_draft(&descriptor.name, draft))
            .collect();

        self.attach_adders(&mut properties, &mut adders);

        for adder in adders.into_iter().filter(|adder| !adder.attached) {
            if properties.iter().any(|property| property.name == adder.suffix) {
                warn!(
                    type_name = %descriptor.name,
                    adder = %adder.accessor.member,
                    "Adder collides with an existing property of the same name; ignored"
                );
                continue;
            }
            properties.push(Property {
                name:         adder.suffix,
                value_type:   TypeName::vec_of(&adder.element),
                element_type: Some(adder.element),
                accessors:    Accessors {
                    adder: Some(adder.accessor),
                    ..Accessors::default()
                },
            });
        }

        BeanShape {
            type_name: descriptor.name.clone(),
            properties,
        }
    }

    /// Attach each adder to the collection property whose singular form it names; the most
    /// specific singular candidate wins
    fn attach_adders(&self, properties: &mut [Property], adders: &mut [AdderDraft]) {
        for property in properties.iter_mut().filter(|p| p.is_collection()) {
            let candidates = self.inflector.singular_candidates(&property.name);
            let best = adders
                .iter()
                .enumerate()
                .filter(|(_, adder)| {
                    !adder.attached && property.element_type.as_ref() == Some(&adder.element)
                })
                .filter_map(|(index, adder)| {
                    candidates
                        .iter()
                        .position(|candidate| *candidate == adder.suffix)
                        .map(|tier| (tier, index))
                })
                .min();

            if let Some((tier, index)) = best {
                let adder = &mut adders[index];
                adder.attached = true;
                debug!(
                    property = %property.name,
                    adder = %adder.accessor.member,
                    tier,
                    "Attached adder"
                );
                property.accessors.adder = Some(adder.accessor.clone());
            }
        }
    }

    fn finish_draft(type_name: &TypeName, mut draft: PropertyDraft) -> Option<Property> {
        let value_type = match (draft.getter_type, draft.setter_type) {
            (Some(getter_type), Some(setter_type)) if getter_type != setter_type => {
                warn!(
                    type_name = %type_name,
                    property = %draft.name,
                    getter_type = %getter_type,
                    setter_type = %setter_type,
                    "Setter type differs from getter type; setter ignored"
                );
                draft.accessors.setter = None;
                getter_type
            },
            (Some(value_type), _) | (None, Some(value_type)) => value_type,
            (None, None) => return None,
        };

        Some(Property {
            name: draft.name,
            element_type: value_type.element_type(),
            value_type,
            accessors: draft.accessors,
        })
    }

    fn classify(member: &MemberDescriptor) -> Option<(AccessorRole, String, TypeName)> {
        let snake = member.name.to_snake_case();
        match (&member.parameter, &member.returns) {
            (None, Some(returns)) => {
                let name = if let Some(name) = snake.strip_prefix(GETTER_PREFIX) {
                    name
                } else if let Some(name) = snake.strip_prefix(BOOLEAN_GETTER_PREFIX)
                    && matches!(returns.as_str(), "bool" | "Boolean")
                {
                    name
                } else {
                    snake.as_str()
                };
                Some((AccessorRole::Getter, name.to_string(), returns.clone()))
            },
            (Some(parameter), _) => {
                if let Some(name) = snake.strip_prefix(SETTER_PREFIX) {
                    Some((AccessorRole::Setter, name.to_string(), parameter.clone()))
                } else {
                    snake
                        .strip_prefix(ADDER_PREFIX)
                        .map(|name| (AccessorRole::Adder, name.to_string(), parameter.clone()))
                }
            },
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::MutationPoint;
    use crate::test_support;
    use crate::type_source::TypeRegistry;

    fn introspect(registry: &TypeRegistry, type_name: &str) -> Result<Arc<BeanShape>> {
        let cache = ShapeCache::new();
        let inflector = Inflector::default();
        ShapeIntrospector::new(registry, &cache, &inflector).introspect_target(&type_name.into())
    }

    #[test]
    fn test_setter_and_adder_attach_to_same_property() {
        let shape = introspect(&test_support::registry(), "Target").expect("Target introspects");
        let pets = shape.property("pets").expect("pets property");

        assert_eq!(pets.element_type, Some(TypeName::from("i64")));
        assert_eq!(
            pets.mutation_points().into_iter().collect::<Vec<_>>(),
            vec![MutationPoint::Setter, MutationPoint::Adder]
        );
        assert_eq!(
            pets.accessors.adder.as_ref().map(|a| a.member.as_str()),
            Some("addPet")
        );
        assert_eq!(shape.properties.len(), 1);
    }

    #[test]
    fn test_irregular_singular_adder_preferred() {
        let shape =
            introspect(&test_support::registry(), "TargetHuman").expect("TargetHuman introspects");
        let teeth = shape.property("teeth").expect("teeth property");
        assert_eq!(
            teeth.accessors.adder.as_ref().map(|a| a.member.as_str()),
            Some("addTooth")
        );
        // `addTeeth` collides with `teeth` and is dropped
        assert_eq!(shape.properties.len(), 1);
    }

    #[test]
    fn test_falls_back_to_generic_singular_adder() {
        let shape =
            introspect(&test_support::registry(), "TargetDali").expect("TargetDali introspects");
        let teeth = shape.property("teeth").expect("teeth property");
        assert_eq!(
            teeth.accessors.adder.as_ref().map(|a| a.member.as_str()),
            Some("addTeeth")
        );
    }

    #[test]
    fn test_getter_only_collection_is_mergeable() {
        let shape = introspect(&test_support::registry(), "TargetOnlyGetter")
            .expect("getter-only target introspects");
        let pets = shape.property("pets").expect("pets property");
        assert_eq!(
            pets.mutation_points().into_iter().collect::<Vec<_>>(),
            vec![MutationPoint::GetterOnly]
        );
    }

    #[test]
    fn test_naming_conventions() {
        let registry = TypeRegistry::new().with(
            TypeDescriptor::bean("Conventions")
                .with_member(MemberDescriptor::getter("name", "String"))
                .with_member(MemberDescriptor::getter("isActive", "bool"))
                .with_member(MemberDescriptor::getter("is_legacy", "String"))
                .with_member(MemberDescriptor::writer("setActive", "bool"))
                .with_member(MemberDescriptor::writer("set_name", "i32"))
                .with_member(MemberDescriptor::writer("addTag", "String"))
                .with_member(MemberDescriptor::writer("reset", "bool")),
        );
        let shape = introspect(&registry, "Conventions").expect("Conventions introspects");

        let names: Vec<_> = shape.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "active", "is_legacy", "tag"]);

        // mismatched setter type is dropped
        assert!(!shape.property("name").expect("name").has_setter());
        assert!(shape.property("active").expect("active").has_setter());

        let tag = shape.property("tag").expect("adder-only property");
        assert_eq!(tag.value_type, TypeName::from("Vec<String>"));
        assert_eq!(
            tag.mutation_points().into_iter().collect::<Vec<_>>(),
            vec![MutationPoint::Adder]
        );
    }

    #[test]
    fn test_target_without_mutation_points_is_rejected() {
        let registry = TypeRegistry::new().with(
            TypeDescriptor::bean("ReadOnly").with_member(MemberDescriptor::getter("getId", "i64")),
        );
        let report = introspect(&registry, "ReadOnly").expect_err("read-only target fails");
        assert!(matches!(report.current_context(), Error::Shape { .. }));

        assert!(introspect(&registry, "Vec<i64>").is_ok());
        let unknown = introspect(&registry, "Missing").expect_err("unknown type fails");
        assert!(matches!(unknown.current_context(), Error::UnknownType { .. }));
    }

    #[test]
    fn test_repeated_introspection_hits_cache() {
        let registry = test_support::registry();
        let cache = ShapeCache::new();
        let inflector = Inflector::default();
        let introspector = ShapeIntrospector::new(&registry, &cache, &inflector);

        let first = introspector.introspect(&"Source".into()).expect("Source");
        let second = introspector.introspect(&"Source".into()).expect("Source");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}
