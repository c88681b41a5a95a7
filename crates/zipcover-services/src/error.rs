/*!
Service layer error types.

Front-end agnostic errors; adapters map them to status codes or messages.
*/

use thiserror::Error;
use zipcover_config::ConfigError;
use zipcover_spatial::SpatialError;
use zipcover_structures::StructureError;
use zipcover_union::UnionError;

/// Service layer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Resource not found
    #[error("Not found: {resource} with id '{id}'")]
    NotFound { resource: String, id: String },

    /// Invalid input parameters (operator-facing message)
    #[error("{0}")]
    InvalidInput(String),

    /// Entity store could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog or geometry backend error
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

// ============================================================================
// ERROR CONVERSIONS FROM BACKEND
// ============================================================================

impl From<StructureError> for ServiceError {
    fn from(err: StructureError) -> Self {
        match err {
            StructureError::InvalidGeometry { .. } => ServiceError::Backend(err.to_string()),
            _ => ServiceError::InvalidInput(err.to_string()),
        }
    }
}

impl From<SpatialError> for ServiceError {
    fn from(err: SpatialError) -> Self {
        match err {
            SpatialError::Structure(inner) => inner.into(),
            SpatialError::InvalidRectangle(msg) => ServiceError::InvalidInput(msg),
            _ => ServiceError::Backend(err.to_string()),
        }
    }
}

impl From<UnionError> for ServiceError {
    fn from(err: UnionError) -> Self {
        ServiceError::Config(err.to_string())
    }
}

impl From<ConfigError> for ServiceError {
    fn from(err: ConfigError) -> Self {
        ServiceError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Storage(err.to_string())
    }
}
