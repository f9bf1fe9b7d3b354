//! Canonicalizing key pools.
//!
//! `put` hands back the pooled instance when an equal value is already present
//! (first one wins), so equal grouping keys share one allocation and hash/eq
//! checks on them stay cheap. Pools are filled single-threaded while records are
//! built; aggregation only reads the `Arc`s they returned.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

#[derive(Debug)]
pub struct KeyPool<T: ?Sized + Eq + Hash> {
    entries: HashSet<Arc<T>>,
}

impl<T: ?Sized + Eq + Hash> Default for KeyPool<T> {
    fn default() -> Self {
        Self {
            entries: HashSet::new(),
        }
    }
}

impl<T: ?Sized + Eq + Hash> KeyPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.entries.contains(value)
    }

    pub fn get(&self, value: &T) -> Option<Arc<T>> {
        self.entries.get(value).cloned()
    }
}

impl<T: Eq + Hash> KeyPool<T> {
    /// Return the canonical instance equal to `value`, pooling it if new.
    pub fn put(&mut self, value: T) -> Arc<T> {
        if let Some(existing) = self.entries.get(&value) {
            return Arc::clone(existing);
        }
        let pooled = Arc::new(value);
        self.entries.insert(Arc::clone(&pooled));
        pooled
    }
}

impl KeyPool<str> {
    pub fn intern(&mut self, value: &str) -> Arc<str> {
        if let Some(existing) = self.entries.get(value) {
            return Arc::clone(existing);
        }
        let pooled: Arc<str> = Arc::from(value);
        self.entries.insert(Arc::clone(&pooled));
        pooled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Product;

    #[test]
    fn equal_values_share_one_instance() {
        let mut pool = KeyPool::new();
        let a = pool.put(String::from("abc"));
        let b = pool.put(String::from("abc"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn first_instance_wins() {
        let mut pool = KeyPool::new();
        let first = pool.put(Product::new("001", Arc::from("A"), 5.0));
        let second = pool.put(Product::new("001", Arc::from("B"), 50.0));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.price(), 5.0);
    }

    #[test]
    fn interned_strings_are_canonical() {
        let mut pool: KeyPool<str> = KeyPool::new();
        let a = pool.intern("Q");
        let b = pool.intern("Q");
        let c = pool.intern("R");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(pool.contains("R"));
        assert_eq!(pool.len(), 2);
    }
}
