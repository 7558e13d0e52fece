//! A newtype wrapper for type names handed over by the host type system
//!
//! Type names are kept exactly as the host writes them (e.g. `Vec<i64>`,
//! `crate::target::Pet`). Generic arguments are parsed on demand, which is how
//! collection properties learn their element type.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumString};

/// Built-in containers whose element type makes a property collection-valued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, AsRefStr, EnumString)]
pub enum ContainerKind {
    /// `Vec<T>`
    Vec,
    /// `VecDeque<T>`
    VecDeque,
    /// `LinkedList<T>`
    LinkedList,
    /// `HashSet<T>`
    HashSet,
    /// `BTreeSet<T>`
    BTreeSet,
    /// `IndexSet<T>`
    IndexSet,
}

impl ContainerKind {
    /// Whether iteration order of the container is the insertion order
    pub const fn preserves_insertion_order(self) -> bool {
        matches!(self, Self::Vec | Self::VecDeque | Self::LinkedList | Self::IndexSet)
    }
}

/// A type name used as a `HashMap` key throughout the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Create a type name, trimming surrounding whitespace
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self(name.trim().to_string())
    }

    /// Build `Vec<element>`
    pub fn vec_of(element: &Self) -> Self {
        Self(format!("Vec<{element}>"))
    }

    /// Get the underlying string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the base type name by stripping generic parameters
    /// For example: `Vec<String>` returns `Vec`
    pub fn base_type(&self) -> &str {
        self.0.split('<').next().map_or(self.0.as_str(), str::trim)
    }

    /// Get the short name (last path segment of the base type)
    /// For example: `std::collections::HashSet<u8>` returns `HashSet`
    pub fn short_name(&self) -> &str {
        let base = self.base_type();
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Top-level generic arguments, in declaration order
    ///
    /// `HashMap<String, Vec<u8>>` yields `String` and `Vec<u8>`.
    pub fn generic_args(&self) -> Vec<Self> {
        let (Some(open), Some(close)) = (self.0.find('<'), self.0.rfind('>')) else {
            return Vec::new();
        };
        if close <= open {
            return Vec::new();
        }

        let inner = &self.0[open + 1..close];
        let mut args = Vec::new();
        let mut depth = 0_usize;
        let mut start = 0;
        for (index, ch) in inner.char_indices() {
            match ch {
                '<' | '(' | '[' => depth += 1,
                '>' | ')' | ']' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    args.push(Self::new(&inner[start..index]));
                    start = index + 1;
                },
                _ => {},
            }
        }
        let last = inner[start..].trim();
        if !last.is_empty() {
            args.push(Self::new(last));
        }
        args
    }

    /// The container kind if this is a recognized built-in collection
    pub fn container_kind(&self) -> Option<ContainerKind> {
        if self.generic_args().len() != 1 {
            return None;
        }
        self.short_name().parse().ok()
    }

    /// Element type of a recognized built-in collection
    pub fn element_type(&self) -> Option<Self> {
        self.container_kind()?;
        self.generic_args().into_iter().next()
    }

    /// Whether this names a recognized built-in collection
    pub fn is_collection(&self) -> bool {
        self.container_kind().is_some()
    }

    /// Inner type of `Box<T>`
    pub fn boxed_inner(&self) -> Option<Self> {
        if self.short_name() != "Box" {
            return None;
        }
        let mut args = self.generic_args();
        if args.len() == 1 { args.pop() } else { None }
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&Self> for TypeName {
    fn from(type_name: &Self) -> Self {
        type_name.clone()
    }
}

impl PartialEq<str> for TypeName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_args_split_at_top_level() {
        let name = TypeName::from("std::collections::HashMap<String, Vec<(u8, u16)>>");
        assert_eq!(
            name.generic_args(),
            vec![TypeName::from("String"), TypeName::from("Vec<(u8, u16)>")]
        );
        assert_eq!(name.short_name(), "HashMap");
        assert!(TypeName::from("i64").generic_args().is_empty());
    }

    #[test]
    fn test_collection_recognition() {
        let cases = [
            ("Vec<i64>", Some("i64")),
            ("std::collections::BTreeSet<String>", Some("String")),
            ("VecDeque<crate::Pet>", Some("crate::Pet")),
            ("Option<i64>", None),
            ("HashMap<String, i64>", None),
            ("String", None),
        ];

        for (name, element) in cases {
            assert_eq!(
                TypeName::from(name).element_type(),
                element.map(TypeName::from),
                "Failed for: {name}"
            );
        }
    }

    #[test]
    fn test_boxed_inner() {
        assert_eq!(
            TypeName::from("Box<i32>").boxed_inner(),
            Some(TypeName::from("i32"))
        );
        assert_eq!(TypeName::from("i32").boxed_inner(), None);
    }
}
