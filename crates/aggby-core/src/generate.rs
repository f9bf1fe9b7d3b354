//! Seeded generator for position datasets.
//!
//! Each position draws a fresh account and product and then canonicalizes both
//! through the generator's pools, so the number of distinct keys is bounded by
//! the name spaces: 100,000 accounts, 1,000 products, 26 categories.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::pool::KeyPool;
use crate::position::{Account, Position, Product};

pub struct PositionGenerator {
    seed: u64,
    rng: SmallRng,
    accounts: KeyPool<Account>,
    products: KeyPool<Product>,
    categories: KeyPool<str>,
}

impl PositionGenerator {
    /// `None` draws a random seed; it is still reported by `seed()` for replay.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
            accounts: KeyPool::new(),
            products: KeyPool::new(),
            categories: KeyPool::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_position(&mut self) -> Position {
        let account = self.next_account();
        let product = self.next_product();
        let quantity = self.rng.random_range(1..10);
        Position::new(account, product, quantity)
    }

    pub fn generate(&mut self, count: usize) -> Vec<Position> {
        (0..count).map(|_| self.next_position()).collect()
    }

    /// Reorder `positions` in place with this generator's RNG.
    pub fn shuffle(&mut self, positions: &mut [Position]) {
        positions.shuffle(&mut self.rng);
    }

    pub fn distinct_accounts(&self) -> usize {
        self.accounts.len()
    }

    pub fn distinct_products(&self) -> usize {
        self.products.len()
    }

    pub fn distinct_categories(&self) -> usize {
        self.categories.len()
    }

    fn next_account(&mut self) -> Arc<Account> {
        let name = format!("{:05}", self.rng.random_range(0..100_000u32));
        self.accounts.put(Account::new(name))
    }

    fn next_product(&mut self) -> Arc<Product> {
        let name = format!("{:03}", self.rng.random_range(0..1_000u32));
        let letter = char::from(b'A' + self.rng.random_range(0..26u8));
        let category = self.categories.intern(letter.encode_utf8(&mut [0u8; 4]));
        let price = self.rng.random_range(1.0..100.0);
        self.products.put(Product::new(name, category, price))
    }
}
