//! `blogsync-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the post entity, its identifier, input drafts and the clock used to stamp
//! mutations.

pub mod clock;
pub mod error;
pub mod id;
pub mod post;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::PostId;
pub use post::{Post, PostDraft, PostRevision};
