//! Axum extractor for JSON request bodies
//!
//! `GridJson<T>` behaves like `axum::Json<T>` but reports every rejection
//! (wrong content type, syntax error, wrong shape) as a
//! `ValidationError::InvalidJson`, so clients get the same error body as for
//! any other bad request.

use crate::core::error::{GridError, ValidationError};
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Axum extractor that deserializes a JSON body into `T`
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create(
///     State(state): State<AppState>,
///     GridJson(records): GridJson<Vec<ProductRecord>>,
/// ) -> GridResult<Json<Vec<ProductRecord>>> {
///     // records is already decoded
/// }
/// ```
#[derive(Debug, Clone)]
pub struct GridJson<T>(pub T);

impl<T> GridJson<T> {
    /// Get the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

// Allow dereferencing to T
impl<T> std::ops::Deref for GridJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for GridJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = GridError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // Decode to a Value first so syntax errors and shape errors are told apart
        let Json(payload): Json<Value> = Json::from_request(req, state).await.map_err(|e| {
            GridError::Validation(ValidationError::InvalidJson {
                message: e.body_text(),
            })
        })?;

        let value = serde_json::from_value(payload).map_err(|e| {
            GridError::Validation(ValidationError::InvalidJson {
                message: e.to_string(),
            })
        })?;

        Ok(GridJson(value))
    }
}
