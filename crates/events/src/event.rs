use core::fmt::Debug;
use core::hash::Hash;

use serde::{Deserialize, Serialize};

use blogsync_core::{Post, PostId};

/// A domain-agnostic event.
///
/// Events are facts: immutable, cheap to clone, and routed by their `kind()`.
pub trait Event: Clone + Debug + Send + Sync + 'static {
    /// Routing key handlers subscribe to.
    type Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;

    /// Stable event name/type identifier (e.g. "post.created").
    fn event_type(&self) -> &'static str;
}

/// The three things that can happen to a post.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Created, EventKind::Updated, EventKind::Deleted];

    pub fn event_type(self) -> &'static str {
        match self {
            EventKind::Created => "post.created",
            EventKind::Updated => "post.updated",
            EventKind::Deleted => "post.deleted",
        }
    }
}

/// Post-mutation notification published by the write store.
///
/// `Created` and `Updated` carry the complete snapshot as committed; `Deleted`
/// carries only the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PostEvent {
    Created(Post),
    Updated(Post),
    Deleted(PostId),
}

impl PostEvent {
    pub fn post_id(&self) -> PostId {
        match self {
            PostEvent::Created(post) | PostEvent::Updated(post) => post.id,
            PostEvent::Deleted(id) => *id,
        }
    }
}

impl Event for PostEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            PostEvent::Created(_) => EventKind::Created,
            PostEvent::Updated(_) => EventKind::Updated,
            PostEvent::Deleted(_) => EventKind::Deleted,
        }
    }

    fn event_type(&self) -> &'static str {
        self.kind().event_type()
    }
}
