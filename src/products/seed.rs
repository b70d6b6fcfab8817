//! Sample catalogue used by the demo and by `store.seed`

use crate::core::error::GridResult;
use crate::core::store::DataStore;
use crate::products::model::Product;
use rust_decimal::Decimal;

const CATALOGUE: &[(&str, i64, i16, bool)] = &[
    ("Chai", 1800, 39, false),
    ("Chang", 1900, 17, false),
    ("Aniseed Syrup", 1000, 13, false),
    ("Chef Anton's Cajun Seasoning", 2200, 53, false),
    ("Chef Anton's Gumbo Mix", 2135, 0, true),
    ("Grandma's Boysenberry Spread", 2500, 120, false),
    ("Uncle Bob's Organic Dried Pears", 3000, 15, false),
    ("Northwoods Cranberry Sauce", 4000, 6, false),
    ("Mishi Kobe Niku", 9700, 29, true),
    ("Ikura", 3100, 31, false),
    ("Queso Cabrales", 2100, 22, false),
    ("Queso Manchego La Pastora", 3800, 86, false),
    ("Konbu", 600, 24, false),
    ("Tofu", 2325, 35, false),
    ("Genen Shouyu", 1550, 39, false),
    ("Pavlova", 1745, 29, false),
    ("Alice Mutton", 3900, 0, true),
    ("Carnarvon Tigers", 6250, 42, false),
    ("Teatime Chocolate Biscuits", 920, 25, false),
    ("Sir Rodney's Marmalade", 8100, 40, false),
];

/// The sample products, not yet stored (ids are 0)
pub fn catalogue() -> Vec<Product> {
    CATALOGUE
        .iter()
        .map(|&(name, cents, stock, discontinued)| {
            Product::new(name, Some(Decimal::new(cents, 2)), Some(stock), discontinued)
        })
        .collect()
}

/// Insert the sample catalogue if the store is empty.
///
/// Returns the number of inserted products.
pub async fn seed_if_empty(store: &dyn DataStore<Product>) -> GridResult<usize> {
    let mut session = store.session().await?;
    if session.count(None).await? > 0 {
        tracing::debug!(backend = store.backend(), "store already populated, skipping seed");
        return Ok(0);
    }

    for product in catalogue() {
        session.add(product);
    }
    let inserted = session.save_changes().await?;

    tracing::info!(
        backend = store.backend(),
        count = inserted.len(),
        "seeded sample products"
    );
    Ok(inserted.len())
}
