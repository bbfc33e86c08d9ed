use std::collections::BTreeMap;
use std::sync::RwLock;

use super::PostStore;
use crate::error::StoreError;

/// In-memory store, for tests and throwaway servers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    posts: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostStore for MemoryStore {
    fn put(&self, signature: &[u8], document: &[u8]) -> Result<(), StoreError> {
        self.posts
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(signature.to_vec(), document.to_vec());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        let posts = self.posts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(posts.values().cloned().collect())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.posts.read().map_err(|_| StoreError::Poisoned)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_behaves() {
        crate::store::tests::exercise(&MemoryStore::new());
    }
}
