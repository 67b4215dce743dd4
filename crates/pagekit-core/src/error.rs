//! Error types for the core crate.

use thiserror::Error;

/// Errors produced by the foundational types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonical serialization of a snapshot failed.
    #[error("canonical serialization failed: {0}")]
    Canonicalization(#[from] serde_json::Error),

    /// A draft key string did not match the expected format.
    #[error("malformed draft key: {0:?}")]
    MalformedKey(String),
}
