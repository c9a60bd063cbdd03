use thiserror::Error;

use blogsync_core::DomainError;
use blogsync_infra::StoreError;

/// Failure of a command (create / update / delete).
#[derive(Debug, Error)]
pub enum CommandError {
    /// Input rejected before anything was persisted.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No post has this identifier (including identifiers that do not parse).
    #[error("post not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Persistence(StoreError),
}

impl From<DomainError> for CommandError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidId(raw) => Self::NotFound(raw),
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id.to_string()),
            other => Self::Persistence(other),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Failure of a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("post not found: {0}")]
    NotFound(String),
}

pub type QueryResult<T> = Result<T, QueryError>;
