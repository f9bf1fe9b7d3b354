//! Shared accumulator map for in-place parallel aggregation.
//!
//! Keys are spread over a fixed number of shards. A shard's read lock is enough
//! to reach an existing accumulator, which is then updated under its own mutex,
//! so workers touching different keys of the same shard do not serialize. The
//! write lock is taken only to insert a key seen for the first time.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::{Mutex, PoisonError, RwLock};

pub struct LockedAccumulators<K, A> {
    shards: Vec<RwLock<HashMap<K, Mutex<A>>>>,
    hasher: RandomState,
}

impl<K: Eq + Hash, A> LockedAccumulators<K, A> {
    pub fn new(shards: usize) -> Self {
        Self {
            shards: (0..shards.max(1)).map(|_| RwLock::new(HashMap::new())).collect(),
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, key: &K) -> &RwLock<HashMap<K, Mutex<A>>> {
        let idx = (self.hasher.hash_one(key) % self.shards.len() as u64) as usize;
        &self.shards[idx]
    }

    /// Apply `update` to the accumulator for `key`, creating it with `factory`
    /// if the key is new. Updates to one key never run concurrently.
    pub fn accept_with<F, U>(&self, key: K, factory: &F, update: U)
    where
        F: Fn() -> A,
        U: FnOnce(&mut A),
    {
        let shard = self.shard(&key);
        {
            let map = shard.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cell) = map.get(&key) {
                let mut acc = cell.lock().unwrap_or_else(PoisonError::into_inner);
                update(&mut acc);
                return;
            }
        }
        let mut map = shard.write().unwrap_or_else(PoisonError::into_inner);
        let cell = map.entry(key).or_insert_with(|| Mutex::new(factory()));
        update(cell.get_mut().unwrap_or_else(PoisonError::into_inner));
    }

    /// Distinct keys seen so far.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.read().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_map(self) -> HashMap<K, A> {
        let mut out = HashMap::new();
        for shard in self.shards {
            let map = shard.into_inner().unwrap_or_else(PoisonError::into_inner);
            out.extend(
                map.into_iter()
                    .map(|(k, cell)| (k, cell.into_inner().unwrap_or_else(PoisonError::into_inner))),
            );
        }
        out
    }
}
