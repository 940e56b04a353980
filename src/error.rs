//! Error types for store and backend operations.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the fallible core.
///
/// The host-facing [`CacheBackend`](crate::backend::CacheBackend) boundary never
/// surfaces these; it collapses them into `None`/`false` after logging.
#[derive(Debug, Error)]
pub enum Error {
    /// The record store rejected or failed a call.
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Invalid or unknown configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A record could not be encoded for storage.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A stored record payload could not be decoded.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Stored bytes are not a record envelope.
    #[error("Invalid cache entry: {0}")]
    InvalidCacheEntry(String),

    /// Record envelope written by an incompatible schema version.
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// Caller supplied an argument the backend cannot act on.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The store was used after `close()`.
    #[error("Store is closed")]
    StoreClosed,
}

#[cfg(feature = "redis")]
impl From<deadpool_redis::redis::RedisError> for Error {
    fn from(e: deadpool_redis::redis::RedisError) -> Self {
        Error::BackendError(format!("Redis command failed: {}", e))
    }
}

#[cfg(feature = "redis")]
impl From<deadpool_redis::PoolError> for Error {
    fn from(e: deadpool_redis::PoolError) -> Self {
        Error::BackendError(format!("Failed to get Redis connection: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::VersionMismatch {
            expected: 1,
            found: 7,
        };
        assert_eq!(err.to_string(), "Version mismatch: expected 1, found 7");

        let err = Error::InvalidArgument("unknown cleaning mode: stale".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid argument: unknown cleaning mode: stale"
        );
    }
}
