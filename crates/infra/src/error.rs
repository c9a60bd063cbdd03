use thiserror::Error;

use blogsync_core::PostId;

use crate::table::TableError;

/// Failure of a write-store mutation.
///
/// Returned synchronously to the caller; the write store never retries. When
/// any of these is returned no event was published.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The mutation matched no row.
    #[error("post {0} not found")]
    NotFound(PostId),

    /// The storage engine rejected or failed the statement.
    #[error("persistence failed: {0}")]
    Persistence(#[from] TableError),
}

pub type StoreResult<T> = Result<T, StoreError>;
