//! Position records and the grouping keys derived from them.
//!
//! Accounts and products compare by name only, so two independently built
//! products with the same name land in the same bucket even if their prices
//! differ. Pools (see `pool.rs`) make equal keys share one allocation.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::stats::Measured;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Account {
    name: String,
}

impl Account {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    name: String,
    category: Arc<str>,
    price: f64,
}

impl Product {
    pub fn new(name: impl Into<String>, category: Arc<str>, price: f64) -> Self {
        Self {
            name: name.into(),
            category,
            price,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &Arc<str> {
        &self.category
    }

    pub fn price(&self) -> f64 {
        self.price
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Product {}

impl Hash for Product {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Product {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Product {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Position {
    account: Arc<Account>,
    product: Arc<Product>,
    quantity: u32,
}

impl Position {
    pub fn new(account: Arc<Account>, product: Arc<Product>, quantity: u32) -> Self {
        Self {
            account,
            product,
            quantity,
        }
    }

    pub fn account(&self) -> &Arc<Account> {
        &self.account
    }

    pub fn product(&self) -> &Arc<Product> {
        &self.product
    }

    pub fn category(&self) -> &Arc<str> {
        self.product.category()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn market_value(&self) -> f64 {
        f64::from(self.quantity) * self.product.price()
    }
}

impl Measured for Position {
    fn measure(&self) -> f64 {
        self.market_value()
    }
}

/// Which key a run groups positions by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    Product,
    Account,
    Category,
}

impl Grouping {
    pub const ALL: [Grouping; 3] = [Grouping::Product, Grouping::Account, Grouping::Category];

    pub fn key(self, position: &Position) -> GroupKey {
        match self {
            Grouping::Product => GroupKey::Product(Arc::clone(position.product())),
            Grouping::Account => GroupKey::Account(Arc::clone(position.account())),
            Grouping::Category => GroupKey::Category(Arc::clone(position.category())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grouping::Product => "product",
            Grouping::Account => "account",
            Grouping::Category => "category",
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grouping {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(Grouping::Product),
            "account" => Ok(Grouping::Account),
            "category" => Ok(Grouping::Category),
            other => Err(Error::Parse {
                kind: "grouping",
                value: other.to_string(),
            }),
        }
    }
}

/// Canonical grouping key. Cloning only bumps a reference count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    Product(Arc<Product>),
    Account(Arc<Account>),
    Category(Arc<str>),
}

impl GroupKey {
    pub fn name(&self) -> &str {
        match self {
            GroupKey::Product(p) => p.name(),
            GroupKey::Account(a) => a.name(),
            GroupKey::Category(c) => c,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn product(name: &str, category: &str, price: f64) -> Product {
        Product::new(name, Arc::from(category), price)
    }

    #[test]
    fn products_compare_by_name_only() {
        let a = product("042", "K", 10.0);
        let b = product("042", "Q", 99.0);
        assert_eq!(a, b);
        let set: HashSet<Product> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn market_value_is_quantity_times_price() {
        let p = Position::new(
            Arc::new(Account::new("00001")),
            Arc::new(product("007", "B", 2.5)),
            4,
        );
        assert_eq!(p.market_value(), 10.0);
        assert_eq!(p.measure(), 10.0);
        assert_eq!(&**p.category(), "B");
    }

    #[test]
    fn grouping_selects_key() {
        let p = Position::new(
            Arc::new(Account::new("12345")),
            Arc::new(product("900", "Z", 1.0)),
            1,
        );
        assert_eq!(Grouping::Account.key(&p).name(), "12345");
        assert_eq!(Grouping::Product.key(&p).name(), "900");
        assert_eq!(Grouping::Category.key(&p).to_string(), "Z");
    }

    #[test]
    fn grouping_parses_case_insensitively() {
        assert_eq!("Product".parse::<Grouping>().unwrap(), Grouping::Product);
        assert_eq!(" category ".parse::<Grouping>().unwrap(), Grouping::Category);
        assert!("desk".parse::<Grouping>().is_err());
    }
}
