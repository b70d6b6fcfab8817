//! The product catalogue: entity, wire records, sample data and handlers

pub mod handlers;
pub mod model;
pub mod record;
pub mod seed;

pub use handlers::AppState;
pub use model::Product;
pub use record::{ProductName, ProductRecord, RecordOp};
