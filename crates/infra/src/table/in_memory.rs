use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use blogsync_core::{Post, PostId, PostRevision};

use super::{PostOrigin, PostTable, TableError};

/// In-memory post table.
///
/// Intended for tests/dev. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryPostTable {
    rows: RwLock<BTreeMap<PostId, Post>>,
}

impl InMemoryPostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct row read, bypassing the write store (assertions in tests).
    pub fn row(&self, id: PostId) -> Option<Post> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        rows.get(&id).cloned()
    }
}

#[async_trait]
impl PostTable for InMemoryPostTable {
    async fn insert(&self, post: &Post) -> Result<u64, TableError> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        if rows.contains_key(&post.id) {
            return Err(TableError::Constraint(format!(
                "duplicate primary key {}",
                post.id
            )));
        }
        rows.insert(post.id, post.clone());
        Ok(1)
    }

    async fn update(
        &self,
        id: PostId,
        revision: &PostRevision,
        updated_at: i64,
    ) -> Result<u64, TableError> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        match rows.get_mut(&id) {
            Some(row) => {
                row.revise(revision.clone(), updated_at);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: PostId) -> Result<u64, TableError> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        Ok(u64::from(rows.remove(&id).is_some()))
    }

    async fn fetch_origin(&self, id: PostId) -> Result<Option<PostOrigin>, TableError> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.get(&id).map(|row| PostOrigin {
            author: row.author.clone(),
            created_at: row.created_at,
        }))
    }

    async fn load_all(&self) -> Result<Vec<Post>, TableError> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.values().cloned().collect())
    }
}
