//! Error types for the auto-save subsystem.

use thiserror::Error;

use pagekit_core::CoreError;

/// Errors raised by draft management operations.
#[derive(Error, Debug)]
pub enum AutoSaveError {
    /// Canonical hashing of a snapshot failed.
    #[error("snapshot hashing failed: {0}")]
    Hashing(#[from] CoreError),
}
