//! Serial eager aggregation.

use std::collections::HashMap;
use std::hash::Hash;

use crate::traits::Merge;

/// Fold `records` into one accumulator per distinct key.
///
/// The first record of each key starts from `zero()`; every record replaces its
/// key's accumulator with `add(&acc, record)`.
pub fn aggregate_by<'a, R, K, A, I, KF, ZF, AF>(
    records: I,
    key_fn: KF,
    zero: ZF,
    add: AF,
) -> HashMap<K, A>
where
    R: 'a + ?Sized,
    I: IntoIterator<Item = &'a R>,
    K: Eq + Hash,
    KF: Fn(&R) -> K,
    ZF: Fn() -> A,
    AF: Fn(&A, &R) -> A,
{
    let mut out: HashMap<K, A> = HashMap::new();
    for record in records {
        let acc = out.entry(key_fn(record)).or_insert_with(&zero);
        *acc = add(acc, record);
    }
    out
}

/// Update one accumulator per distinct key in place.
///
/// `factory` runs once per key, the first time that key is seen.
pub fn aggregate_in_place_by<'a, R, K, A, I, KF, FF, UF>(
    records: I,
    key_fn: KF,
    factory: FF,
    accept: UF,
) -> HashMap<K, A>
where
    R: 'a + ?Sized,
    I: IntoIterator<Item = &'a R>,
    K: Eq + Hash,
    KF: Fn(&R) -> K,
    FF: Fn() -> A,
    UF: Fn(&mut A, &R),
{
    let mut out: HashMap<K, A> = HashMap::new();
    for record in records {
        let acc = out.entry(key_fn(record)).or_insert_with(&factory);
        accept(acc, record);
    }
    out
}

/// Merge two partial maps, combining accumulators of keys present in both.
pub fn merge_partials<K, A>(left: HashMap<K, A>, right: HashMap<K, A>) -> HashMap<K, A>
where
    K: Eq + Hash,
    A: Merge,
{
    // Fold the smaller map into the larger one.
    let (mut into, from) = if left.len() >= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    for (key, acc) in from {
        let merged = match into.remove(&key) {
            Some(existing) => existing.merge(acc),
            None => acc,
        };
        into.insert(key, merged);
    }
    into
}
