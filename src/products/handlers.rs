//! HTTP handlers for the product grid
//!
//! Every handler opens one store session and drops it on return, whatever the
//! outcome. Write handlers stage all records of the batch on that session and
//! apply them with a single `save_changes`.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::Value;
use std::sync::Arc;

use crate::config::PagingConfig;
use crate::core::entity::Entity;
use crate::core::error::GridResult;
use crate::core::query::{
    DataSourceRequest, DataSourceResult, Query, ordering_expression, to_data_source_result,
};
use crate::core::store::DataStore;
use crate::core::validation::GridJson;
use crate::products::model::Product;
use crate::products::record::{ProductName, ProductRecord, RecordOp};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore<Product>>,
    pub paging: Arc<PagingConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore<Product>>, paging: PagingConfig) -> Self {
        Self {
            store,
            paging: Arc::new(paging),
        }
    }
}

/// POST /products/create
///
/// Returns the records with their store-assigned ids, in request order.
pub async fn create(
    State(state): State<AppState>,
    GridJson(payload): GridJson<Vec<Value>>,
) -> GridResult<Json<Vec<ProductRecord>>> {
    let records = ProductRecord::decode_batch(RecordOp::Create, payload)?;

    let mut session = state.store.session().await?;
    for record in records {
        let mut product = record.into_product();
        product.set_id(0);
        session.add(product);
    }
    let created = session.save_changes().await?;

    tracing::debug!(count = created.len(), "created products");
    Ok(Json(created.into_iter().map(ProductRecord::from).collect()))
}

/// POST /products/read
pub async fn read(
    State(state): State<AppState>,
    GridJson(request): GridJson<DataSourceRequest>,
) -> GridResult<Json<DataSourceResult<ProductRecord>>> {
    let mut session = state.store.session().await?;
    let result: DataSourceResult<Product> = to_data_source_result(
        session.as_mut(),
        request.take(state.paging.max_take),
        request.skip,
        request.sort(),
        request.filter.as_ref(),
    )
    .await?;

    Ok(Json(result.map(ProductRecord::from)))
}

/// POST /products/update
///
/// Each record fully replaces the stored product with the same id.
pub async fn update(
    State(state): State<AppState>,
    GridJson(payload): GridJson<Vec<Value>>,
) -> GridResult<StatusCode> {
    let records = ProductRecord::decode_batch(RecordOp::Update, payload)?;

    let mut session = state.store.session().await?;
    for record in records {
        record.require_id()?;
        session.attach_modified(record.into_product());
    }
    let pending = session.pending();
    session.save_changes().await?;

    tracing::debug!(count = pending, "updated products");
    Ok(StatusCode::OK)
}

/// POST /products/destroy
pub async fn destroy(
    State(state): State<AppState>,
    GridJson(payload): GridJson<Vec<Value>>,
) -> GridResult<StatusCode> {
    let records = ProductRecord::decode_batch(RecordOp::Destroy, payload)?;

    let mut session = state.store.session().await?;
    for record in &records {
        session.remove(record.require_id()?);
    }
    session.save_changes().await?;

    tracing::debug!(count = records.len(), "destroyed products");
    Ok(StatusCode::OK)
}

/// GET /products/names
///
/// All product names in key order, for auto-complete widgets.
pub async fn names(State(state): State<AppState>) -> GridResult<Json<Vec<ProductName>>> {
    let mut session = state.store.session().await?;
    let query = Query {
        predicate: None,
        ordering: ordering_expression(&[], Product::fields())?,
        skip: 0,
        take: None,
    };
    let products = session.fetch(&query).await?;

    Ok(Json(products.into_iter().map(ProductName::from).collect()))
}
