//! Deferred aggregation results.
//!
//! A `LazyAggregation` holds the aggregation as a thunk. Nothing is read from
//! the input until the view is first dereferenced (or `force`d); the mapping is
//! then computed exactly once and cached. Dropping an unevaluated view never
//! touches the input at all.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::Deref;

use once_cell::sync::Lazy;

use crate::aggregate::{aggregate_by, aggregate_in_place_by};

type Thunk<'a, T> = Box<dyn FnOnce() -> T + Send + 'a>;

pub struct LazyAggregation<'a, K, A> {
    cell: Lazy<HashMap<K, A>, Thunk<'a, HashMap<K, A>>>,
}

impl<'a, K, A> LazyAggregation<'a, K, A> {
    pub fn new<F>(thunk: F) -> Self
    where
        F: FnOnce() -> HashMap<K, A> + Send + 'a,
    {
        Self {
            cell: Lazy::new(Box::new(thunk)),
        }
    }

    pub fn is_evaluated(&self) -> bool {
        Lazy::get(&self.cell).is_some()
    }

    /// Evaluate now (if still pending) and borrow the mapping.
    pub fn force(&self) -> &HashMap<K, A> {
        Lazy::force(&self.cell)
    }

    /// Take the mapping, evaluating it first if nobody has yet.
    pub fn into_map(self) -> HashMap<K, A> {
        match Lazy::into_value(self.cell) {
            Ok(map) => map,
            Err(thunk) => thunk(),
        }
    }
}

impl<K, A> Deref for LazyAggregation<'_, K, A> {
    type Target = HashMap<K, A>;

    fn deref(&self) -> &Self::Target {
        self.force()
    }
}

impl<K: fmt::Debug, A: fmt::Debug> fmt::Debug for LazyAggregation<'_, K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Lazy::get(&self.cell) {
            Some(map) => f.debug_tuple("LazyAggregation").field(map).finish(),
            None => f.write_str("LazyAggregation(<pending>)"),
        }
    }
}

/// Deferred `aggregate_by`.
pub fn aggregate_by_lazy<'a, R, K, A, I, KF, ZF, AF>(
    records: I,
    key_fn: KF,
    zero: ZF,
    add: AF,
) -> LazyAggregation<'a, K, A>
where
    R: 'a + ?Sized,
    I: IntoIterator<Item = &'a R> + Send + 'a,
    K: Eq + Hash,
    KF: Fn(&R) -> K + Send + 'a,
    ZF: Fn() -> A + Send + 'a,
    AF: Fn(&A, &R) -> A + Send + 'a,
{
    LazyAggregation::new(move || aggregate_by(records, key_fn, zero, add))
}

/// Deferred `aggregate_in_place_by`.
pub fn aggregate_in_place_by_lazy<'a, R, K, A, I, KF, FF, UF>(
    records: I,
    key_fn: KF,
    factory: FF,
    accept: UF,
) -> LazyAggregation<'a, K, A>
where
    R: 'a + ?Sized,
    I: IntoIterator<Item = &'a R> + Send + 'a,
    K: Eq + Hash,
    KF: Fn(&R) -> K + Send + 'a,
    FF: Fn() -> A + Send + 'a,
    UF: Fn(&mut A, &R) + Send + 'a,
{
    LazyAggregation::new(move || aggregate_in_place_by(records, key_fn, factory, accept))
}
