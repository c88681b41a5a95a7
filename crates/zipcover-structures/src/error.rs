/// Result type for data-model construction
pub type StructureResult<T> = Result<T, StructureError>;

/// Errors raised while constructing or validating core data types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructureError {
    #[error("Invalid region code '{0}': expected exactly 5 digits")]
    InvalidCode(String),

    #[error("Invalid rectangle: {0}")]
    InvalidRectangle(String),

    #[error("Region {code} has no usable geometry: {reason}")]
    InvalidGeometry { code: String, reason: String },

    #[error("Name is required.")]
    MissingName,

    #[error("Enter at least one valid 5-digit ZIP.")]
    NoValidCodes,
}
