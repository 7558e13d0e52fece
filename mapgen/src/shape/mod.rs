//! Shape introspection: which properties a type has and how each can be written

mod cache;
mod introspector;
mod property;

pub use cache::ShapeCache;
pub use introspector::ShapeIntrospector;
pub use property::{Accessor, Accessors, BeanShape, MutationPoint, Property};
