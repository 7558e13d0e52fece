//! Shape cache
//!
//! Shapes are written at most once per type and only read afterwards. Re-introspecting a
//! type yields an equal shape, so two generation passes racing on the same entry are
//! harmless: the first insert wins and both get the same `Arc`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use super::property::BeanShape;
use crate::type_name::TypeName;

/// Append-only cache of introspected shapes, keyed by type name
///
/// The cache belongs to a generation session (or to the process, when shared through an
/// `Arc`). Shapes depend on the singular overrides of the session that built them, so only
/// share a cache between generators configured with the same overrides.
#[derive(Debug, Default)]
pub struct ShapeCache {
    shapes: RwLock<HashMap<TypeName, Arc<BeanShape>>>,
}

impl ShapeCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached shape if available
    pub fn get(&self, type_name: &TypeName) -> Option<Arc<BeanShape>> {
        self.shapes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_name)
            .map(Arc::clone)
    }

    /// Insert a shape unless one is already cached; returns the cached shape
    pub fn insert_if_absent(&self, shape: BeanShape) -> Arc<BeanShape> {
        let mut shapes = self.shapes.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            shapes
                .entry(shape.type_name.clone())
                .or_insert_with(|| Arc::new(shape)),
        )
    }

    /// Get the number of cached shapes
    pub fn len(&self) -> usize {
        self.shapes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn shape(name: &str) -> BeanShape {
        BeanShape {
            type_name:  TypeName::from(name),
            properties: Vec::new(),
        }
    }

    #[test]
    fn test_cache_operations() {
        let cache = ShapeCache::new();
        let type_name = TypeName::from("test::Type");

        assert!(cache.get(&type_name).is_none());
        assert!(cache.is_empty());

        let first = cache.insert_if_absent(shape("test::Type"));
        let second = cache.insert_if_absent(shape("test::Type"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&type_name).is_some());
    }

    #[test]
    fn test_concurrent_inserts_converge_on_one_entry() {
        let cache = Arc::new(ShapeCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.insert_if_absent(shape("shared::Type")))
            })
            .collect();

        let shapes: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("insert thread should not panic"))
            .collect();

        assert_eq!(cache.len(), 1);
        assert!(shapes.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }
}
