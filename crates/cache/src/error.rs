use thiserror::Error;

/// Errors that can occur when talking to a cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The caller's cancellation signal fired before the operation ran.
    #[error("Cache operation cancelled")]
    Cancelled,

    /// The backing cache could not be reached.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// A cached value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
