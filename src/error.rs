//! Error types for tree sampling
//!
//! Only failures that leave the caller with no sample at all are errors.
//! Timeouts and limit cut-offs are reported through `Outcome::truncated`.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a sampling call
#[derive(Error, Debug)]
pub enum SampleError {
    /// Root is missing or cannot be read
    #[error("Cannot access '{}': {source}", path.display())]
    PathAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root exists but is not a directory
    #[error("Not a directory: '{}'", path.display())]
    NotADirectory { path: PathBuf },

    /// A limit of zero can never produce a sample
    #[error("Sample limit must be at least 1")]
    InvalidLimit,
}

impl SampleError {
    /// True for the errors that mean the root itself is unusable
    pub fn is_path_access(&self) -> bool {
        matches!(
            self,
            SampleError::PathAccess { .. } | SampleError::NotADirectory { .. }
        )
    }
}

/// Result type alias for SampleError
pub type Result<T> = std::result::Result<T, SampleError>;
