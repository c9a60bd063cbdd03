//! Infrastructure layer: durable post table, write store, read model.

pub mod error;
pub mod read_model;
pub mod table;
pub mod write_store;


pub use error::{StoreError, StoreResult};
pub use read_model::{DEFAULT_PAGE_SIZE, Page, PostReadStore};
pub use table::{InMemoryPostTable, PostOrigin, PostTable, SqlitePostTable, TableError};
pub use write_store::PostWriteStore;
