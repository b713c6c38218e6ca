//! Error type shared by every cache operation.

/// Error type for cache operations.
///
/// Store failures are surfaced as-is; nothing in this crate retries them.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid entry options: {0}")]
    InvalidOptions(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl CacheError {
    /// Builds a [`CacheError::Store`] from any displayable backend failure.
    pub fn store(message: impl std::fmt::Display) -> Self {
        Self::Store(message.to_string())
    }
}
