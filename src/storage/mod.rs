//! Storage implementations for different backends

#[cfg(feature = "in-memory")]
pub mod in_memory;
#[cfg(feature = "in-memory")]
pub mod matcher;
#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "in-memory")]
pub use in_memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresProductStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::core::error::{ConfigError, GridResult};
use crate::core::store::DataStore;
use crate::products::Product;
use std::sync::Arc;

/// Open the product store selected by the configuration.
///
/// Seeds the sample catalogue into an empty store when `seed` is set.
pub async fn open_product_store(config: &StoreConfig) -> GridResult<Arc<dyn DataStore<Product>>> {
    let store: Arc<dyn DataStore<Product>> = match config.backend {
        #[cfg(feature = "in-memory")]
        StoreBackend::InMemory => Arc::new(InMemoryStore::<Product>::new()),
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => {
            let url = config.url.as_deref().ok_or_else(|| ConfigError::MissingField {
                field: "url".to_string(),
                context: "store (postgres backend)".to_string(),
            })?;
            Arc::new(PostgresProductStore::connect(url, config.max_connections).await?)
        }
        #[allow(unreachable_patterns)]
        backend => {
            return Err(ConfigError::InvalidValue {
                field: "store.backend".to_string(),
                value: backend.as_str().to_string(),
                message: "backend not compiled into this build".to_string(),
            }
            .into());
        }
    };

    tracing::info!(backend = store.backend(), "product store ready");

    if config.seed {
        crate::products::seed::seed_if_empty(store.as_ref()).await?;
    }

    Ok(store)
}
