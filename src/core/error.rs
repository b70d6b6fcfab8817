//! Typed error handling for the data source layer
//!
//! Every failure that can reach the HTTP boundary is a [`GridError`]. Handlers
//! return `GridResult<T>` and let axum turn the error into a JSON body with a
//! matching status code.
//!
//! # Error Categories
//!
//! - [`QueryError`]: the filter/sort payload could not be compiled or executed
//! - [`EntityError`]: a record referenced by update/destroy does not exist
//! - [`ValidationError`]: malformed request bodies and invalid records
//! - [`StorageError`]: failures reported by the persistence backend
//! - [`ConfigError`]: configuration loading problems
//!
//! # Example
//!
//! ```rust,ignore
//! match session.save_changes().await {
//!     Ok(inserted) => println!("{} products inserted", inserted.len()),
//!     Err(GridError::Entity(EntityError::NotFound { id, .. })) => {
//!         println!("product {} is gone", id);
//!     }
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The main error type of the crate
#[derive(Debug)]
pub enum GridError {
    /// Filter, sort or paging could not be turned into a query
    Query(QueryError),

    /// Entity-related errors (update/destroy targets)
    Entity(EntityError),

    /// Request payload validation errors
    Validation(ValidationError),

    /// Storage backend errors
    Storage(StorageError),

    /// Configuration errors
    Config(ConfigError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::Query(e) => write!(f, "{}", e),
            GridError::Entity(e) => write!(f, "{}", e),
            GridError::Validation(e) => write!(f, "{}", e),
            GridError::Storage(e) => write!(f, "{}", e),
            GridError::Config(e) => write!(f, "{}", e),
            GridError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GridError::Query(e) => Some(e),
            GridError::Entity(e) => Some(e),
            GridError::Validation(e) => Some(e),
            GridError::Storage(e) => Some(e),
            GridError::Config(e) => Some(e),
            GridError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl GridError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GridError::Query(_) => StatusCode::BAD_REQUEST,
            GridError::Entity(e) => e.status_code(),
            GridError::Validation(_) => StatusCode::BAD_REQUEST,
            GridError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GridError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GridError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            GridError::Query(e) => e.error_code(),
            GridError::Entity(e) => e.error_code(),
            GridError::Validation(_) => "VALIDATION_ERROR",
            GridError::Storage(_) => "STORAGE_ERROR",
            GridError::Config(_) => "CONFIG_ERROR",
            GridError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            GridError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "id": id
                }))
            }
            GridError::Query(QueryError::InvalidOperator { operator }) => {
                Some(serde_json::json!({ "operator": operator }))
            }
            GridError::Query(QueryError::UnknownField { field }) => {
                Some(serde_json::json!({ "field": field }))
            }
            GridError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for GridError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Query Errors
// =============================================================================

/// Errors raised while compiling or executing a filter/sort request
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("Unknown filter operator '{operator}'")]
    InvalidOperator { operator: String },

    #[error("Unknown field '{field}'")]
    UnknownField { field: String },

    #[error("Operator '{operator}' cannot be applied to field '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    #[error("Value {value} is not a valid {expected} for field '{field}'")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        value: String,
    },

    #[error("Filter on '{field}' is not part of the flattened filter list")]
    UnboundLeaf { field: String },

    #[error("Invalid sort direction '{direction}' for field '{field}'")]
    InvalidSortDirection { field: String, direction: String },

    #[error("Malformed expression at position {position}: {message}")]
    MalformedExpression { position: usize, message: String },

    #[error("Expression references parameter @{index} which was not supplied")]
    MissingParameter { index: usize },
}

impl QueryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::InvalidOperator { .. } => "INVALID_OPERATOR",
            QueryError::UnknownField { .. } => "UNKNOWN_FIELD",
            QueryError::UnsupportedOperator { .. } => "UNSUPPORTED_OPERATOR",
            QueryError::TypeMismatch { .. } => "TYPE_MISMATCH",
            QueryError::UnboundLeaf { .. } => "UNBOUND_FILTER",
            QueryError::InvalidSortDirection { .. } => "INVALID_SORT_DIRECTION",
            QueryError::MalformedExpression { .. } => "MALFORMED_EXPRESSION",
            QueryError::MissingParameter { .. } => "MISSING_PARAMETER",
        }
    }
}

impl From<QueryError> for GridError {
    fn from(err: QueryError) -> Self {
        GridError::Query(err)
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to entity operations
#[derive(Debug)]
pub enum EntityError {
    /// Entity was not found
    NotFound { entity_type: String, id: i32 },
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityError::NotFound { entity_type, id } => {
                write!(f, "{} with id '{}' not found", entity_type, id)
            }
        }
    }
}

impl std::error::Error for EntityError {}

impl EntityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
        }
    }
}

impl From<EntityError> for GridError {
    fn from(err: EntityError) -> Self {
        GridError::Entity(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// Single field validation error
    FieldError { field: String, message: String },

    /// Multiple field validation errors
    FieldErrors(Vec<FieldValidationError>),

    /// Body is not valid JSON or does not match the expected shape
    InvalidJson { message: String },
}

/// A single field validation error
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldError { field, message } => {
                write!(f, "Validation error for field '{}': {}", field, message)
            }
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for GridError {
    fn from(err: ValidationError) -> Self {
        GridError::Validation(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug)]
pub enum StorageError {
    /// Connection error
    ConnectionError { backend: String, message: String },

    /// Query execution error
    QueryError { backend: String, message: String },

    /// A transaction could not be opened or committed
    TransactionError { message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionError { backend, message } => {
                write!(f, "Failed to connect to {}: {}", backend, message)
            }
            StorageError::QueryError { backend, message } => {
                write!(f, "{} query error: {}", backend, message)
            }
            StorageError::TransactionError { message } => {
                write!(f, "Transaction error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for GridError {
    fn from(err: StorageError) -> Self {
        GridError::Storage(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Missing required field in configuration
    MissingField { field: String, context: String },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::MissingField { field, context } => {
                write!(f, "Missing required field '{}' in {}", field, context)
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for GridError {
    fn from(err: ConfigError) -> Self {
        GridError::Config(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for GridError {
    fn from(err: std::io::Error) -> Self {
        GridError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for GridError {
    fn from(err: serde_yaml::Error) -> Self {
        GridError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for GridError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                GridError::Storage(StorageError::ConnectionError {
                    backend: "PostgreSQL".to_string(),
                    message: err.to_string(),
                })
            }
            other => GridError::Storage(StorageError::QueryError {
                backend: "PostgreSQL".to_string(),
                message: other.to_string(),
            }),
        }
    }
}

/// Convert from anyhow::Error for callers that mix in anyhow
impl From<anyhow::Error> for GridError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<GridError>() {
            Ok(grid_err) => grid_err,
            Err(err) => GridError::Internal(err.to_string()),
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for data source operations
pub type GridResult<T> = Result<T, GridError>;
