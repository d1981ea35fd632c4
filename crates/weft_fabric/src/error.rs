//! Error type for fabric generation.

use thiserror::Error;
use weft_common::InternalError;

/// Errors from generating routing netlists and bitstreams.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// An output file could not be written or an input file read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A fabric invariant was violated.
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// A routing selection file is not valid JSON.
    #[error("invalid routing selection: {0}")]
    Json(#[from] serde_json::Error),
}
