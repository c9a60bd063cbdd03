//! Authoritative (write-side) post store.
//!
//! Every successful mutation follows the same two steps:
//!
//! ```text
//! 1. Commit to the post table (single statement, all-or-nothing)
//!      ↓ only on success
//! 2. Publish exactly one event with the post-mutation state
//! ```
//!
//! Publication is fire-and-forget, so when a method returns the read side may
//! not have seen the change yet. A crash between step 1 and step 2 leaves the
//! read side permanently stale for that mutation; nothing here tries to hide
//! that window.
//!
//! The store performs no input validation. Validation belongs to the command
//! boundary in front of it.

use std::sync::Arc;

use tracing::{info, warn};

use blogsync_core::{Clock, Post, PostDraft, PostId, PostRevision, SystemClock};
use blogsync_events::{PostEvent, PostEventBus};

use crate::error::{StoreError, StoreResult};
use crate::table::PostTable;

pub struct PostWriteStore<T> {
    table: T,
    bus: Arc<PostEventBus>,
    clock: Arc<dyn Clock>,
}

impl<T> PostWriteStore<T> {
    pub fn new(table: T, bus: Arc<PostEventBus>) -> Self {
        Self {
            table,
            bus,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn bus(&self) -> &Arc<PostEventBus> {
        &self.bus
    }
}

impl<T> core::fmt::Debug for PostWriteStore<T>
where
    T: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostWriteStore")
            .field("table", &self.table)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl<T> PostWriteStore<T>
where
    T: PostTable,
{
    /// Persists a new post and publishes `Created` with the full snapshot.
    ///
    /// The identifier is generated here; `created_at == updated_at == now`.
    pub async fn create(&self, draft: PostDraft) -> StoreResult<PostId> {
        let id = PostId::new();
        let post = Post::from_draft(id, draft, self.clock.now());

        let rows = self.table.insert(&post).await?;
        if rows != 1 {
            return Err(crate::table::TableError::Constraint(format!(
                "insert of {id} affected {rows} rows"
            ))
            .into());
        }

        info!(post_id = %id, author = %post.author, "post created");
        self.bus.publish(PostEvent::Created(post));
        Ok(id)
    }

    /// Overwrites title, body and tags, refreshes `updated_at`, then publishes
    /// `Updated` with a complete snapshot (author and `created_at` re-read from
    /// the table).
    ///
    /// Returns `NotFound` when no row has `id`; nothing is published then.
    pub async fn update(&self, id: PostId, revision: PostRevision) -> StoreResult<()> {
        let updated_at = self.clock.now();

        let rows = self.table.update(id, &revision, updated_at).await?;
        if rows == 0 {
            return Err(StoreError::NotFound(id));
        }

        let Some(origin) = self.table.fetch_origin(id).await? else {
            // Deleted between the two statements; the delete's event covers the read side.
            warn!(post_id = %id, "post vanished right after update; not publishing");
            return Err(StoreError::NotFound(id));
        };

        info!(post_id = %id, "post updated");
        self.bus.publish(PostEvent::Updated(Post {
            id,
            title: revision.title,
            body: revision.body,
            author: origin.author,
            tags: revision.tags,
            created_at: origin.created_at,
            updated_at,
        }));
        Ok(())
    }

    /// Removes the row and publishes `Deleted` carrying only the identifier.
    ///
    /// Returns `NotFound` when no row has `id`; nothing is published then.
    pub async fn delete(&self, id: PostId) -> StoreResult<()> {
        let rows = self.table.delete(id).await?;
        if rows == 0 {
            return Err(StoreError::NotFound(id));
        }

        info!(post_id = %id, "post deleted");
        self.bus.publish(PostEvent::Deleted(id));
        Ok(())
    }

    /// Every authoritative row, ascending by identifier.
    pub async fn snapshot(&self) -> StoreResult<Vec<Post>> {
        Ok(self.table.load_all().await?)
    }
}
