use error_stack::Report;
use thiserror::Error;

use crate::type_name::TypeName;

// Error message prefixes
const MSG_CANNOT_PREFIX: &str = "Cannot";
const MSG_INVALID_PREFIX: &str = "Invalid";

/// Result type for the `mapgen` library
pub type Result<T> = std::result::Result<T, Report<Error>>;

/// Generation-time errors
///
/// Every variant rejects exactly one mapping method. A batch keeps going after any of them.
#[derive(Error)]
pub enum Error {
    /// The host type system has no description for a type
    #[error("Type not described by the host type system: {type_name}")]
    UnknownType {
        /// The type that was looked up
        type_name: TypeName,
    },

    /// A target type exposes nothing that can be written
    #[error("Type `{type_name}` has no usable mutation points: {reason}")]
    Shape {
        /// The rejected target type
        type_name: TypeName,
        /// Why the type was rejected
        reason:    String,
    },

    /// Several target properties match a source property equally well
    #[error(
        "Source property `{source_property}` matches several target properties equally well: {}",
        .candidates.join(", ")
    )]
    AmbiguousCorrelation {
        /// The source property being correlated
        source_property: String,
        /// The equally scored target property names
        candidates:      Vec<String>,
    },

    /// No conversion rule applies and the types differ
    #[error("No conversion from `{from}` to `{to}` for property `{property}`")]
    UnmappableType {
        /// The target property being written
        property: String,
        /// Source value or element type
        from:     TypeName,
        /// Target value or element type
        to:       TypeName,
    },

    /// A checked failure may be raised but the mapping method does not declare it
    #[error(
        "Checked failure `{failure}` raised by `{raised_by}` (property `{property}`) is not declared by mapping method `{method}`"
    )]
    UndeclaredFailure {
        /// The mapping method whose contract is violated
        method:    String,
        /// The property whose action invokes the failing member
        property:  String,
        /// The converter or mutator that declares the failure
        raised_by: String,
        /// The uncovered failure type
        failure:   TypeName,
    },

    /// A per-property target type hint does not fit the declared target type
    #[error("{0}")]
    InvalidTypeHint(String),

    /// The emitter could not render a plan
    #[error("Emission failed: {0}")]
    Emission(String),

    /// Generator configuration could not be loaded
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownType { type_name } => f
                .debug_struct("UnknownType")
                .field("type_name", type_name)
                .finish(),
            Self::Shape { type_name, reason } => f
                .debug_struct("Shape")
                .field("type_name", type_name)
                .field("reason", reason)
                .finish(),
            Self::AmbiguousCorrelation {
                source_property,
                candidates,
            } => f
                .debug_struct("AmbiguousCorrelation")
                .field("source_property", source_property)
                .field("candidates", candidates)
                .finish(),
            Self::UnmappableType { property, from, to } => f
                .debug_struct("UnmappableType")
                .field("property", property)
                .field("from", from)
                .field("to", to)
                .finish(),
            Self::UndeclaredFailure {
                method,
                property,
                raised_by,
                failure,
            } => f
                .debug_struct("UndeclaredFailure")
                .field("method", method)
                .field("property", property)
                .field("raised_by", raised_by)
                .field("failure", failure)
                .finish(),
            Self::InvalidTypeHint(s) => f.debug_tuple("InvalidTypeHint").field(s).finish(),
            Self::Emission(s) => f.debug_tuple("Emission").field(s).finish(),
            Self::Configuration(s) => f.debug_tuple("Configuration").field(s).finish(),
        }
    }
}

impl Error {
    /// Create a "Cannot X" shape error
    pub fn no_mutation_points(type_name: &TypeName, reason: impl std::fmt::Display) -> Self {
        Self::Shape {
            type_name: type_name.clone(),
            reason:    format!("{MSG_CANNOT_PREFIX} write any property: {reason}"),
        }
    }

    /// Create an "Invalid X" configuration error
    pub fn invalid_config(what: &str, details: impl std::fmt::Display) -> Self {
        Self::Configuration(format!("{MSG_INVALID_PREFIX} {what}: {details}"))
    }

    /// Create error for a target type hint that is not the declared type or one of its subtypes
    pub fn hint_not_assignable(property: &str, hint: &TypeName, declared: &TypeName) -> Self {
        Self::InvalidTypeHint(format!(
            "{MSG_INVALID_PREFIX} target type hint for `{property}`: `{hint}` is not assignable to `{declared}`"
        ))
    }

    /// Create error for emission failures
    pub fn emission_failed(what: &str, details: impl std::fmt::Display) -> Self {
        Self::Emission(format!("{MSG_CANNOT_PREFIX} render {what}: {details}"))
    }

    /// Short machine-friendly name of the error category
    pub const fn category(&self) -> &'static str {
        match self {
            Self::UnknownType { .. } => "unknown_type",
            Self::Shape { .. } => "shape",
            Self::AmbiguousCorrelation { .. } => "ambiguous_correlation",
            Self::UnmappableType { .. } => "unmappable_type",
            Self::UndeclaredFailure { .. } => "undeclared_failure",
            Self::InvalidTypeHint(_) => "invalid_type_hint",
            Self::Emission(_) => "emission",
            Self::Configuration(_) => "configuration",
        }
    }
}
