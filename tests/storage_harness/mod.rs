//! Shared test harness for product store testing
//!
//! Provides sample catalogues, seeding helpers and the contract macros run
//! against every `DataStore<Product>` backend.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//!
//! store_contract_tests!(InMemoryStore::<Product>::new());
//! rest_integration_tests!(InMemoryStore::<Product>::new());
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod store_tests;

#[macro_use]
pub mod rest_tests;

use datasource::prelude::*;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Sample data
// ---------------------------------------------------------------------------

/// `n` products named `Product 01`, `Product 02`, ...
///
/// - price: `i` dollars
/// - stock: `i % 7`
/// - every fifth product is discontinued
pub fn numbered_products(n: usize) -> Vec<Product> {
    (1..=n)
        .map(|i| {
            Product::new(
                format!("Product {:02}", i),
                Some(Decimal::new(i as i64, 0)),
                Some((i % 7) as i16),
                i % 5 == 0,
            )
        })
        .collect()
}

/// A product with neither price nor stock
pub fn bare_product(name: &str) -> Product {
    Product::new(name, None, None, false)
}

/// Insert `products` through one session and return them with their ids
pub async fn insert_all(store: &dyn DataStore<Product>, products: Vec<Product>) -> Vec<Product> {
    let mut session = store.session().await.unwrap();
    for product in products {
        session.add(product);
    }
    session.save_changes().await.unwrap()
}

/// Wrap a concrete store the way the server shares it
pub fn shared<S: DataStore<Product> + 'static>(store: S) -> Arc<dyn DataStore<Product>> {
    Arc::new(store)
}

/// Run one grid query against a fresh session
pub async fn query(
    store: &dyn DataStore<Product>,
    take: Option<u64>,
    skip: u64,
    sort: &[SortDescriptor],
    filter: Option<&FilterNode>,
) -> GridResult<DataSourceResult<Product>> {
    let mut session = store.session().await?;
    to_data_source_result(session.as_mut(), take, skip, sort, filter).await
}

// ---------------------------------------------------------------------------
// Assertions
// ---------------------------------------------------------------------------

pub fn ids(products: &[Product]) -> Vec<i32> {
    products.iter().map(|p| p.product_id).collect()
}

pub fn names(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.product_name.as_str()).collect()
}

pub fn assert_ids(products: &[Product], expected: &[i32]) {
    assert_eq!(
        ids(products),
        expected,
        "unexpected product ids (names: {:?})",
        names(products)
    );
}
