//! Position CSV reader.
//!
//! Expected header: `account,product,category,price,quantity`. Accounts,
//! products, and categories are canonicalized through key pools as rows are
//! read, so every row naming the same product shares one `Arc<Product>`. A
//! product that reappears with a different category or price is rejected.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use aggby_core::pool::KeyPool;
use aggby_core::position::{Account, Position, Product};

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct PositionRow {
    account: String,
    product: String,
    category: String,
    price: f64,
    quantity: u32,
}

pub struct PositionCsvReader<R: Read> {
    rdr: csv::Reader<R>,
    accounts: KeyPool<Account>,
    products: KeyPool<Product>,
    categories: KeyPool<str>,
}

impl PositionCsvReader<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::open(path)?;
        Ok(Self::from_reader(f))
    }
}

impl<R: Read> PositionCsvReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            rdr: csv::ReaderBuilder::new()
                .has_headers(true)
                .trim(csv::Trim::All)
                .from_reader(reader),
            accounts: KeyPool::new(),
            products: KeyPool::new(),
            categories: KeyPool::new(),
        }
    }

    /// Read every remaining row.
    pub fn read_all(mut self) -> Result<Vec<Position>> {
        let mut out = Vec::new();
        let headers = self.rdr.headers()?.clone();
        let mut record = csv::StringRecord::new();
        while self.rdr.read_record(&mut record)? {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let row: PositionRow = record.deserialize(Some(&headers))?;
            out.push(self.to_position(row, line)?);
        }
        Ok(out)
    }

    pub fn distinct_products(&self) -> usize {
        self.products.len()
    }

    fn to_position(&mut self, row: PositionRow, line: u64) -> Result<Position> {
        if !row.price.is_finite() || row.price < 0.0 {
            return Err(Error::Data {
                line,
                msg: format!("invalid price {}", row.price),
            });
        }
        let category = self.categories.intern(&row.category);
        let product = self
            .products
            .put(Product::new(row.product, category, row.price));
        if product.category().as_ref() != row.category || product.price() != row.price {
            return Err(Error::Data {
                line,
                msg: format!(
                    "product {} redefined (category {} price {}, first seen as category {} price {})",
                    product.name(),
                    row.category,
                    row.price,
                    product.category(),
                    product.price()
                ),
            });
        }
        let account = self.accounts.put(Account::new(row.account));
        Ok(Position::new(account, product, row.quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn rows_share_pooled_keys() {
        let data = "account,product,category,price,quantity\n\
                    00001,001,A,2.5,3\n\
                    00002,001,A,2.5,1\n\
                    00001,002,B,10.0,2\n";
        let positions = PositionCsvReader::from_reader(data.as_bytes())
            .read_all()
            .unwrap();
        assert_eq!(positions.len(), 3);
        assert!(Arc::ptr_eq(positions[0].product(), positions[1].product()));
        assert!(Arc::ptr_eq(positions[0].account(), positions[2].account()));
        assert_eq!(positions[0].market_value(), 7.5);
        assert_eq!(positions[2].category().as_ref(), "B");
    }

    #[test]
    fn redefined_product_is_rejected() {
        let data = "account,product,category,price,quantity\n\
                    00001,001,A,2.5,3\n\
                    00002,001,C,2.5,1\n";
        let err = PositionCsvReader::from_reader(data.as_bytes())
            .read_all()
            .unwrap_err();
        assert!(matches!(err, Error::Data { line: 3, .. }), "{err}");
    }

    #[test]
    fn negative_price_is_rejected() {
        let data = "account,product,category,price,quantity\n00001,001,A,-1.0,3\n";
        let err = PositionCsvReader::from_reader(data.as_bytes())
            .read_all()
            .unwrap_err();
        assert!(matches!(err, Error::Data { .. }));
    }

    #[test]
    fn bad_quantity_is_a_csv_error() {
        let data = "account,product,category,price,quantity\n00001,001,A,1.0,many\n";
        let err = PositionCsvReader::from_reader(data.as_bytes())
            .read_all()
            .unwrap_err();
        assert!(matches!(err, Error::Csv(_)));
    }

    #[test]
    fn header_only_is_empty() {
        let data = "account,product,category,price,quantity\n";
        let positions = PositionCsvReader::from_reader(data.as_bytes())
            .read_all()
            .unwrap();
        assert!(positions.is_empty());
    }
}
