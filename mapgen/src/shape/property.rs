//! Introspected properties and the mutation points they expose

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::type_name::TypeName;

/// How a target property can be written, resolved once during introspection
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationPoint {
    /// Replace the whole value
    Setter,
    /// Append one element to a collection
    Adder,
    /// Collection reachable only through its getter; mutated in place
    GetterOnly,
    /// Not writable
    None,
}

/// A member that reads or writes a property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessor {
    /// Member name as the host reported it
    pub member:   String,
    /// Failures the member declares
    pub failures: Vec<TypeName>,
}

impl Accessor {
    pub(crate) fn new(member: impl Into<String>, failures: Vec<TypeName>) -> Self {
        Self {
            member: member.into(),
            failures,
        }
    }
}

/// The accessors found for one property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessors {
    /// `get_<name>`, `is_<name>` or `<name>`
    pub getter: Option<Accessor>,
    /// `set_<name>`
    pub setter: Option<Accessor>,
    /// `add_<singular>`, collection properties only
    pub adder:  Option<Accessor>,
}

/// A named property of a [`BeanShape`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// snake_case property name
    pub name:         String,
    /// Declared value type
    pub value_type:   TypeName,
    /// Element type for collection-valued properties
    pub element_type: Option<TypeName>,
    /// Members reading and writing the property
    pub accessors:    Accessors,
}

impl Property {
    /// Whether the property holds a collection
    pub const fn is_collection(&self) -> bool {
        self.element_type.is_some()
    }

    /// Whether the property can be read from a source instance
    pub const fn is_readable(&self) -> bool {
        self.accessors.getter.is_some()
    }

    /// Whether a setter exists
    pub const fn has_setter(&self) -> bool {
        self.accessors.setter.is_some()
    }

    /// Whether an adder exists
    pub const fn has_adder(&self) -> bool {
        self.accessors.adder.is_some()
    }

    /// Mutation points available on this property
    pub fn mutation_points(&self) -> BTreeSet<MutationPoint> {
        let mut points = BTreeSet::new();
        if self.has_setter() {
            points.insert(MutationPoint::Setter);
        }
        if self.has_adder() {
            points.insert(MutationPoint::Adder);
        }
        if points.is_empty() && self.is_collection() && self.is_readable() {
            points.insert(MutationPoint::GetterOnly);
        }
        if points.is_empty() {
            points.insert(MutationPoint::None);
        }
        points
    }

    /// Whether any mutation point other than `None` exists
    pub fn is_writable(&self) -> bool {
        !self.mutation_points().contains(&MutationPoint::None)
    }
}

/// Ordered properties of one type. Immutable once introspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanShape {
    /// The introspected type
    pub type_name:  TypeName,
    /// Properties in member declaration order
    pub properties: Vec<Property>,
}

impl BeanShape {
    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }

    /// Properties that can be read
    pub fn readable_properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|property| property.is_readable())
    }

    /// Whether at least one property can be written
    pub fn has_mutation_points(&self) -> bool {
        self.properties.iter().any(Property::is_writable)
    }
}
