use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use blogsync_core::{Post, PostId};
use blogsync_events::{EventKind, HandlerResult, PostEvent, PostEventBus, Projection};

/// Page size used when a caller asks for `limit <= 0`.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of `PostReadStore::list`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub posts: Vec<Post>,
    /// Entry count of the whole read model at the time of the call.
    pub total: usize,
}

/// Queryable, eventually-consistent mirror of the authoritative posts.
///
/// Fed exclusively by bus events; never writes to the authoritative store.
/// Entries are kept in a `BTreeMap` keyed by `PostId`, so `list` and `search`
/// return ascending identifier order (creation order for UUIDv7 ids). Repeated
/// paging is stable as long as no event lands in between.
///
/// Reads share the lock; event application takes it exclusively.
///
/// Only obtainable through `new`, so every instance callers see is already
/// subscribed.
#[derive(Debug)]
pub struct PostReadStore {
    posts: RwLock<BTreeMap<PostId, Post>>,
}

impl PostReadStore {
    /// Builds the read model and subscribes it to all three post event kinds
    /// before handing it out.
    pub fn new(bus: &PostEventBus) -> Arc<Self> {
        let store = Arc::new(Self::empty());
        bus.attach(&store);
        store
    }

    fn empty() -> Self {
        Self {
            posts: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, id: PostId) -> Option<Post> {
        let posts = self.posts.read().unwrap_or_else(PoisonError::into_inner);
        let post = posts.get(&id).cloned();
        debug!(post_id = %id, found = post.is_some(), "read model lookup");
        post
    }

    /// Up to `limit` posts starting at `offset`, plus the total entry count.
    ///
    /// `limit <= 0` means `DEFAULT_PAGE_SIZE`. An `offset` past the end yields an
    /// empty page with the correct total.
    pub fn list(&self, limit: i64, offset: usize) -> Page {
        let limit = usize::try_from(limit)
            .ok()
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let posts = self.posts.read().unwrap_or_else(PoisonError::into_inner);
        let total = posts.len();
        let page: Vec<Post> = posts.values().skip(offset).take(limit).cloned().collect();

        debug!(limit, offset, total, returned = page.len(), "read model list");
        Page { posts: page, total }
    }

    /// Posts whose title or body contains `query` and that carry any of `tags`,
    /// both case-insensitively. An empty `query` or empty `tags` matches
    /// everything on that side.
    pub fn search(&self, query: &str, tags: &[String]) -> Vec<Post> {
        let needle = query.to_lowercase();
        let wanted: HashSet<String> = tags.iter().map(|t| t.to_lowercase()).collect();

        let posts = self.posts.read().unwrap_or_else(PoisonError::into_inner);
        let hits: Vec<Post> = posts
            .values()
            .filter(|p| matches_text(p, &needle) && matches_tags(p, &wanted))
            .cloned()
            .collect();

        debug!(query, tags = ?tags, hits = hits.len(), "read model search");
        hits
    }

    pub fn len(&self) -> usize {
        self.posts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the whole read model with `posts`.
    ///
    /// Used to warm the mirror from the authoritative table at startup. Events
    /// that arrive while this runs are applied before or after the swap, never
    /// interleaved with it.
    pub fn rebuild(&self, posts: impl IntoIterator<Item = Post>) {
        let fresh: BTreeMap<PostId, Post> = posts.into_iter().map(|p| (p.id, p)).collect();
        let count = fresh.len();
        *self.posts.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        debug!(count, "read model rebuilt");
    }

    fn apply_created(&self, post: Post) {
        let id = post.id;
        self.posts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, post);
        debug!(post_id = %id, "synced created post");
    }

    fn apply_updated(&self, post: &Post) {
        let id = post.id;
        let mut posts = self.posts.write().unwrap_or_else(PoisonError::into_inner);
        match posts.get_mut(&id) {
            Some(existing) => {
                existing.title.clone_from(&post.title);
                existing.body.clone_from(&post.body);
                existing.tags.clone_from(&post.tags);
                existing.updated_at = post.updated_at;
                debug!(post_id = %id, "synced updated post");
            }
            None => {
                // Missed or not-yet-delivered Created; dropping is the accepted outcome.
                debug!(post_id = %id, "update for unknown post dropped");
            }
        }
    }

    fn apply_deleted(&self, id: PostId) {
        let removed = self
            .posts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        debug!(post_id = %id, removed, "synced deleted post");
    }
}

impl Projection<PostEvent> for PostReadStore {
    fn name(&self) -> &'static str {
        "posts.read_model"
    }

    fn kinds(&self) -> &'static [EventKind] {
        &EventKind::ALL
    }

    fn apply(&self, event: &PostEvent) -> HandlerResult {
        match event {
            PostEvent::Created(post) => self.apply_created(post.clone()),
            PostEvent::Updated(post) => self.apply_updated(post),
            PostEvent::Deleted(id) => self.apply_deleted(*id),
        }
        Ok(())
    }
}

fn matches_text(post: &Post, needle: &str) -> bool {
    needle.is_empty()
        || post.title.to_lowercase().contains(needle)
        || post.body.to_lowercase().contains(needle)
}

fn matches_tags(post: &Post, wanted: &HashSet<String>) -> bool {
    wanted.is_empty() || post.tags.iter().any(|t| wanted.contains(&t.to_lowercase()))
}
