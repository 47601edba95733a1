//! Uploaded-document storage.

/// Flat directory of uploads.
pub mod upload_dir;

use std::{io, path::PathBuf};

/// Why a purge stopped.
#[derive(Debug, thiserror::Error)]
pub enum PurgeError {
    /// A filesystem call failed on `path`.
    #[error("failed to remove uploaded document {}: {source}", path.display())]
    Io {
        /// File or directory the call was made on.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The blocking purge task panicked or was cancelled.
    #[error("document purge task failed: {0}")]
    Join(String),
}

/// Result of a purge.
pub type PurgeResult<T> = Result<T, PurgeError>;

/// Storage holding uploaded itinerary source files.
pub trait DocumentStore: Send {
    /// Deletes every stored document and returns how many were removed.
    /// Stops at the first failure; files already removed stay removed.
    fn purge(&mut self) -> PurgeResult<usize>;
}
