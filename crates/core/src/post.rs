//! The blog post entity and the inputs that create or revise it.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::PostId;

/// Full snapshot of a post.
///
/// The same shape is used for the authoritative row, the projected copy and the
/// payload of `Created` / `Updated` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub author: String,
    /// Ordered; duplicates and case variants are kept as given.
    pub tags: Vec<String>,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds.
    pub updated_at: i64,
}

impl Post {
    /// Builds a brand-new post: `created_at == updated_at == now`.
    pub fn from_draft(id: PostId, draft: PostDraft, now: i64) -> Self {
        Self {
            id,
            title: draft.title,
            body: draft.body,
            author: draft.author,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the mutable fields. `author` and `created_at` never change.
    pub fn revise(&mut self, revision: PostRevision, updated_at: i64) {
        self.title = revision.title;
        self.body = revision.body;
        self.tags = revision.tags;
        self.updated_at = updated_at;
    }
}

/// Caller input for creating a post.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    pub author: String,
    pub tags: Vec<String>,
}

impl PostDraft {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        author: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            author: author.into(),
            tags,
        }
    }

    /// Checks required fields. The write store itself does not call this; the
    /// command boundary does, before anything is persisted.
    ///
    /// Only the title is required. Whitespace counts as content; author, body
    /// and tag strings are free-form.
    pub fn validate(&self) -> DomainResult<()> {
        require_title(&self.title)
    }
}

/// Caller input for revising an existing post.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostRevision {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

impl PostRevision {
    pub fn new(title: impl Into<String>, body: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tags,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_title(&self.title)
    }
}

fn require_title(title: &str) -> DomainResult<()> {
    if title.is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    Ok(())
}
