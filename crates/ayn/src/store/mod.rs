//! Persistence of signed posts.
//!
//! Posts are keyed by their raw signature bytes and served back verbatim,
//! in signature order. Nothing here re-verifies a stored post.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::StoreError;

pub trait PostStore: Send + Sync {
    /// Stores `document` under `signature`, replacing any previous entry.
    fn put(&self, signature: &[u8], document: &[u8]) -> Result<(), StoreError>;

    /// All stored documents, ordered by signature bytes.
    fn list(&self) -> Result<Vec<Vec<u8>>, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;
}
