use std::path::PathBuf;

/// Result type for spatial operations
pub type SpatialResult<T> = Result<T, SpatialError>;

/// Errors raised while loading feeds or querying the catalog
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    #[error("Failed to read feed {path}: {source}")]
    FeedIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed feed: {0}")]
    MalformedFeed(String),

    #[error("Invalid rectangle: {0}")]
    InvalidRectangle(String),

    #[error(transparent)]
    Structure(#[from] zipcover_structures::StructureError),
}

impl From<serde_json::Error> for SpatialError {
    fn from(err: serde_json::Error) -> Self {
        SpatialError::MalformedFeed(err.to_string())
    }
}
