//! In-memory read side: the projected copy of posts and its queries.

pub mod post_store;

pub use post_store::{DEFAULT_PAGE_SIZE, Page, PostReadStore};
