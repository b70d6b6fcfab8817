//! # datasource-rs
//!
//! Server-side data binding for grid widgets: paging, sorting and filtering
//! translated into store queries, plus batch CRUD endpoints over a product
//! catalogue.
//!
//! ## Features
//!
//! - **Filter trees**: nested `and`/`or` filters compiled into predicate text
//!   with positional parameters; values are never spliced into the text
//! - **Field allow-list**: only declared fields can be filtered or sorted, and
//!   filter values are coerced to each field's type
//! - **Stable paging**: the unique key is always the final sort key
//! - **Scoped sessions**: one store session per request, batches saved as one unit
//! - **Backends**: in-memory (default) and PostgreSQL (`postgres` feature)
//! - **Configuration-Based**: server, paging and store settings from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use datasource::prelude::*;
//!
//! let app = ServerBuilder::new()
//!     .with_store(InMemoryStore::<Product>::new())
//!     .build()?;
//!
//! // POST /products/read
//! // {"take": 10, "skip": 0, "sort": [{"field": "UnitPrice", "dir": "desc"}],
//! //  "filter": {"logic": "and", "filters": [{"field": "Discontinued", "operator": "eq", "value": false}]}}
//! // => {"data": [...], "total": 17}
//! ```

pub mod config;
pub mod core;
pub mod products;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        entity::Entity,
        error::{GridError, GridResult},
        field::{FieldDef, FieldKind, FieldMap, FieldValue},
        filter::{FilterLogic, FilterNode, FilterOperator},
        query::{DataSourceRequest, DataSourceResult, Predicate, Query, to_data_source_result},
        sort::SortDescriptor,
        store::{DataSession, DataStore, Queryable},
    };

    // === Products ===
    pub use crate::products::{AppState, Product, ProductName, ProductRecord};

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresProductStore;
    pub use crate::storage::open_product_store;

    // === Config ===
    pub use crate::config::{AppConfig, PagingConfig, ServerConfig, StoreBackend, StoreConfig};

    // === Server ===
    pub use crate::server::ServerBuilder;

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use rust_decimal::Decimal;
    pub use serde::{Deserialize, Serialize};

    // === Axum ===
    pub use axum::{
        Router,
        routing::{get, post},
    };
}
