//! Common error types used throughout clipvault.
//!
//! One enum covers the whole failure taxonomy: missing records, expired
//! links, rejected input, storage faults, and transcoding-tool faults.
//! The HTTP layer maps each variant to a status code; nothing below the
//! HTTP layer knows about status codes.

/// Common error type for clipvault.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested asset or link does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The link exists but its expiry has passed. Distinct from [`Error::NotFound`]
    /// so callers can tell "link gone" from "link was real but timed out".
    #[error("expired: {0}")]
    Expired(String),

    /// A constraint was violated before any side effect took place.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The metadata store or filesystem failed mid-operation.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The transcoding gateway (probe/trim/concat) failed; wraps the tool's message.
    #[error("gateway failure: {0}")]
    Gateway(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Expired error.
    pub fn expired<S: Into<String>>(msg: S) -> Self {
        Self::Expired(msg.into())
    }

    /// Create a new Validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new Storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new Gateway error.
    pub fn gateway<S: Into<String>>(msg: S) -> Self {
        Self::Gateway(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
