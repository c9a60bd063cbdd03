//! Durable storage boundary for the authoritative copy of posts.
//!
//! The write store only needs two primitives from an engine:
//!
//! - execute a parameterized statement that creates/updates/deletes exactly one
//!   row keyed by identifier and report the affected-row count
//! - run a parameterized query that returns rows
//!
//! Anything satisfying `PostTable` (an embedded relational store, a key/value
//! map keyed by identifier, ...) can back the write store unchanged.

pub mod in_memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use blogsync_core::{Post, PostId, PostRevision};

pub use in_memory::InMemoryPostTable;
pub use sqlite::SqlitePostTable;

/// The fields an update never touches, re-read to complete `Updated` snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOrigin {
    pub author: String,
    pub created_at: i64,
}

/// Storage engine failure.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("failed to encode column `{column}`: {reason}")]
    Encode { column: &'static str, reason: String },

    #[error("failed to decode column `{column}`: {reason}")]
    Decode { column: &'static str, reason: String },

    #[error("constraint violated: {0}")]
    Constraint(String),
}

/// One row per post, keyed by `PostId`.
///
/// Each method is a single statement and therefore all-or-nothing.
#[async_trait]
pub trait PostTable: Send + Sync {
    /// Inserts a new row. Returns affected rows (1 on success).
    async fn insert(&self, post: &Post) -> Result<u64, TableError>;

    /// Overwrites title, body, tags and `updated_at` of the row with `id`.
    /// Returns affected rows; 0 means no such row.
    async fn update(
        &self,
        id: PostId,
        revision: &PostRevision,
        updated_at: i64,
    ) -> Result<u64, TableError>;

    /// Removes the row with `id`. Returns affected rows; 0 means no such row.
    async fn delete(&self, id: PostId) -> Result<u64, TableError>;

    async fn fetch_origin(&self, id: PostId) -> Result<Option<PostOrigin>, TableError>;

    /// Every row, ascending by identifier.
    async fn load_all(&self) -> Result<Vec<Post>, TableError>;
}

#[async_trait]
impl<T> PostTable for Arc<T>
where
    T: PostTable + ?Sized,
{
    async fn insert(&self, post: &Post) -> Result<u64, TableError> {
        (**self).insert(post).await
    }

    async fn update(
        &self,
        id: PostId,
        revision: &PostRevision,
        updated_at: i64,
    ) -> Result<u64, TableError> {
        (**self).update(id, revision, updated_at).await
    }

    async fn delete(&self, id: PostId) -> Result<u64, TableError> {
        (**self).delete(id).await
    }

    async fn fetch_origin(&self, id: PostId) -> Result<Option<PostOrigin>, TableError> {
        (**self).fetch_origin(id).await
    }

    async fn load_all(&self) -> Result<Vec<Post>, TableError> {
        (**self).load_all().await
    }
}
