//! Built-in conversions that need no user declaration

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::type_name::TypeName;
use crate::type_source::{TypeKind, TypeSource};

/// Lossless numeric conversions, i.e. the primitive pairs with a `From` impl
static WIDENING: LazyLock<HashMap<&'static str, &'static [&'static str]>> = LazyLock::new(|| {
    let mut map: HashMap<&'static str, &'static [&'static str]> = HashMap::new();

    // ===== Signed =====
    map.insert("i8", &["i16", "i32", "i64", "i128", "isize", "f32", "f64"]);
    map.insert("i16", &["i32", "i64", "i128", "isize", "f32", "f64"]);
    map.insert("i32", &["i64", "i128", "f64"]);
    map.insert("i64", &["i128"]);

    // ===== Unsigned =====
    map.insert(
        "u8",
        &[
            "u16", "u32", "u64", "u128", "usize", "i16", "i32", "i64", "i128", "isize", "f32",
            "f64",
        ],
    );
    map.insert(
        "u16",
        &["u32", "u64", "u128", "usize", "i32", "i64", "i128", "f32", "f64"],
    );
    map.insert("u32", &["u64", "u128", "i64", "i128", "f64"]);
    map.insert("u64", &["u128", "i128"]);

    // ===== Float =====
    map.insert("f32", &["f64"]);

    map
});

/// A conversion the engine knows without a user rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum BuiltinConversion {
    /// Same type on both sides
    Identity,
    /// Lossless numeric widening (`i32` to `i64`)
    Widening,
    /// `T` to `Box<T>`
    Boxing,
    /// `Box<T>` to `T`
    Unboxing,
    /// Fieldless enum to fieldless enum, variant by variant name
    EnumByName {
        /// Source variant names, all present on the target enum
        variants: Vec<String>,
    },
}

impl BuiltinConversion {
    /// The built-in conversion from `from` to `to`, if there is one
    pub fn find(from: &TypeName, to: &TypeName, types: &dyn TypeSource) -> Option<Self> {
        if from == to {
            return Some(Self::Identity);
        }
        if WIDENING
            .get(from.as_str())
            .is_some_and(|targets| targets.contains(&to.as_str()))
        {
            return Some(Self::Widening);
        }
        if to.boxed_inner().as_ref() == Some(from) {
            return Some(Self::Boxing);
        }
        if from.boxed_inner().as_ref() == Some(to) {
            return Some(Self::Unboxing);
        }
        Self::enum_by_name(from, to, types)
    }

    fn enum_by_name(from: &TypeName, to: &TypeName, types: &dyn TypeSource) -> Option<Self> {
        let TypeKind::Enum { variants: source } = types.describe(from)?.kind else {
            return None;
        };
        let TypeKind::Enum { variants: target } = types.describe(to)?.kind else {
            return None;
        };
        source
            .iter()
            .all(|variant| target.contains(variant))
            .then_some(Self::EnumByName { variants: source })
    }
}
