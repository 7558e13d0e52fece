//! The seam to the host type system
//!
//! The engine never inspects user code itself. Everything it knows about a type comes
//! from a [`TypeSource`]: the ordered member list, declared value types, declared
//! failures and the supertype relation. [`TypeRegistry`] is the in-memory implementation,
//! loadable from JSON the same way a registry schema dump would be.

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;

use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::error::Result;
use crate::type_name::TypeName;

/// What kind of type a descriptor describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// A data-bearing type with accessor members
    Bean,
    /// A fieldless enum
    Enum {
        /// Variant names in declaration order
        variants: Vec<String>,
    },
    /// A leaf value (primitives, strings, opaque types)
    Value,
    /// A failure type that converters and mutators may declare
    Failure {
        /// Unchecked failures never need to be declared
        #[serde(default)]
        unchecked: bool,
    },
}

/// One exposed member of a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    /// Member name as written by the host (`getPets`, `set_pets`, `pets`)
    pub name:      String,
    /// Type of the single parameter, if any
    #[serde(default)]
    pub parameter: Option<TypeName>,
    /// Declared return type, if any
    #[serde(default)]
    pub returns:   Option<TypeName>,
    /// Declared failure types
    #[serde(default)]
    pub failures:  Vec<TypeName>,
}

impl MemberDescriptor {
    /// A read accessor returning `returns`
    pub fn getter(name: impl Into<String>, returns: impl Into<TypeName>) -> Self {
        Self {
            name:      name.into(),
            parameter: None,
            returns:   Some(returns.into()),
            failures:  Vec::new(),
        }
    }

    /// A one-argument write accessor (setter or adder, depending on the name)
    pub fn writer(name: impl Into<String>, parameter: impl Into<TypeName>) -> Self {
        Self {
            name:      name.into(),
            parameter: Some(parameter.into()),
            returns:   None,
            failures:  Vec::new(),
        }
    }

    /// Attach declared failures
    #[must_use]
    pub fn with_failures<I, T>(mut self, failures: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.failures = failures.into_iter().map(Into::into).collect();
        self
    }
}

/// Everything the host reports about one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// The described type
    pub name:       TypeName,
    /// Kind of the type
    #[serde(flatten)]
    pub kind:       TypeKind,
    /// Direct supertypes (trait objects, parent failure categories)
    #[serde(default)]
    pub supertypes: Vec<TypeName>,
    /// Exposed members in declaration order
    #[serde(default)]
    pub members:    Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    fn with_kind(name: impl Into<TypeName>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            supertypes: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Describe a bean type; add members with [`Self::with_member`]
    pub fn bean(name: impl Into<TypeName>) -> Self {
        Self::with_kind(name, TypeKind::Bean)
    }

    /// Describe a leaf value type
    pub fn value(name: impl Into<TypeName>) -> Self {
        Self::with_kind(name, TypeKind::Value)
    }

    /// Describe a fieldless enum
    pub fn enumeration<I, S>(name: impl Into<TypeName>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            name,
            TypeKind::Enum {
                variants: variants.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Describe a failure type
    pub fn failure(name: impl Into<TypeName>, unchecked: bool) -> Self {
        Self::with_kind(name, TypeKind::Failure { unchecked })
    }

    /// Add a direct supertype
    #[must_use]
    pub fn with_supertype(mut self, supertype: impl Into<TypeName>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    /// Add a member
    #[must_use]
    pub fn with_member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Whether this describes a bean
    pub const fn is_bean(&self) -> bool {
        matches!(self.kind, TypeKind::Bean)
    }
}

/// Host type introspection facility
pub trait TypeSource {
    /// Describe a type, or `None` when the host does not know it
    fn describe(&self, type_name: &TypeName) -> Option<TypeDescriptor>;

    /// Describe a type that must exist
    fn require(&self, type_name: &TypeName) -> Result<TypeDescriptor> {
        self.describe(type_name).ok_or_else(|| {
            Report::new(Error::UnknownType {
                type_name: type_name.clone(),
            })
        })
    }

    /// All transitive supertypes of `type_name`, nearest first
    fn ancestors(&self, type_name: &TypeName) -> Vec<TypeName> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        let mut queue: VecDeque<TypeName> = self
            .describe(type_name)
            .map(|descriptor| descriptor.supertypes.into_iter().collect())
            .unwrap_or_default();

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Some(descriptor) = self.describe(&next) {
                queue.extend(descriptor.supertypes);
            }
            ordered.push(next);
        }
        ordered
    }

    /// Whether a value of `from` may be used where `to` is expected
    fn is_assignable(&self, from: &TypeName, to: &TypeName) -> bool {
        from == to || self.ancestors(from).contains(to)
    }
}

/// In-memory [`TypeSource`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<TypeDescriptor>", into = "Vec<TypeDescriptor>")]
pub struct TypeRegistry {
    types: HashMap<TypeName, TypeDescriptor>,
    order: Vec<TypeName>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from a JSON array of type descriptors
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            Report::new(Error::invalid_config("type registry", e))
        })
    }

    /// Register a descriptor, replacing any previous one with the same name
    pub fn insert(&mut self, descriptor: TypeDescriptor) {
        if !self.types.contains_key(&descriptor.name) {
            self.order.push(descriptor.name.clone());
        }
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// Builder form of [`Self::insert`]
    #[must_use]
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeSource for TypeRegistry {
    fn describe(&self, type_name: &TypeName) -> Option<TypeDescriptor> {
        self.types.get(type_name).cloned()
    }
}

impl From<Vec<TypeDescriptor>> for TypeRegistry {
    fn from(descriptors: Vec<TypeDescriptor>) -> Self {
        descriptors
            .into_iter()
            .fold(Self::new(), |registry, descriptor| registry.with(descriptor))
    }
}

impl From<TypeRegistry> for Vec<TypeDescriptor> {
    fn from(mut registry: TypeRegistry) -> Self {
        registry
            .order
            .iter()
            .filter_map(|name| registry.types.remove(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads_from_json() {
        let json = r#"[
            {"name": "Exception", "kind": "failure"},
            {"name": "DogException", "kind": "failure", "supertypes": ["Exception"]},
            {"name": "Source", "kind": "bean", "members": [
                {"name": "getPets", "returns": "Vec<String>"},
                {"name": "setPets", "parameter": "Vec<String>"}
            ]}
        ]"#;

        let registry = TypeRegistry::from_json_str(json).expect("registry should parse");
        assert_eq!(registry.len(), 3);

        let source = registry
            .describe(&TypeName::from("Source"))
            .expect("Source should be registered");
        assert!(source.is_bean());
        assert_eq!(source.members.len(), 2);
        assert_eq!(
            registry.describe(&TypeName::from("DogException")).map(|d| d.kind),
            Some(TypeKind::Failure { unchecked: false })
        );
    }

    #[test]
    fn test_ancestors_are_transitive_and_nearest_first() {
        let registry = TypeRegistry::new()
            .with(TypeDescriptor::failure("Throwable", false))
            .with(TypeDescriptor::failure("Exception", false).with_supertype("Throwable"))
            .with(TypeDescriptor::failure("RuntimeException", true).with_supertype("Exception"))
            .with(TypeDescriptor::failure("CatException", false).with_supertype("RuntimeException"));

        assert_eq!(
            registry.ancestors(&TypeName::from("CatException")),
            vec![
                TypeName::from("RuntimeException"),
                TypeName::from("Exception"),
                TypeName::from("Throwable"),
            ]
        );
        assert!(registry.is_assignable(&"CatException".into(), &"Exception".into()));
        assert!(!registry.is_assignable(&"Exception".into(), &"CatException".into()));
    }

    #[test]
    fn test_require_unknown_type_fails() {
        let registry = TypeRegistry::new();
        let report = registry
            .require(&TypeName::from("Missing"))
            .expect_err("unknown type should fail");
        assert!(matches!(report.current_context(), Error::UnknownType { .. }));
    }
}
