use thiserror::Error;

/// Errors surfaced by every insights operation
#[derive(Debug, Error)]
pub enum Error {
    #[error("Not authorized to access MongoDB insights")]
    Unauthorized,

    #[error("Profile level must be 0, 1, or 2 (got {0})")]
    InvalidLevel(i64),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Operation not permitted on the analysis connection: {0}")]
    ForbiddenOperation(String),

    #[error("Access denied to collection '{0}' on the analysis connection")]
    AccessDenied(String),

    #[error("Malformed index suggestion: {0}")]
    MalformedSuggestion(String),

    #[error("No index suggestion selected")]
    NoSelection,

    #[error("Index creation failed: {0}")]
    IndexCreationFailed(String),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Convenience Result type using our Error
pub type Result<T> = std::result::Result<T, Error>;
