use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, params};
use tracing::debug;

use super::PostStore;
use crate::error::StoreError;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS posts (
    sig BLOB PRIMARY KEY NOT NULL,
    doc BLOB NOT NULL
)";

/// SQLite-backed store.
///
/// Thread-safe via an internal mutex; callers on an async runtime should
/// reach it through `spawn_blocking`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened post store");
        Self::init(conn)
    }

    pub fn open_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&conn)?)
    }
}

impl PostStore for SqliteStore {
    fn put(&self, signature: &[u8], document: &[u8]) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO posts (sig, doc) VALUES (?1, ?2)",
                params![signature, document],
            )
            .map(|_| ())
        })
    }

    fn list(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT doc FROM posts ORDER BY sig")?;
            let docs = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;
            docs.collect()
        })
    }

    fn len(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get::<_, i64>(0))
                .map(|n| n as usize)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_store_behaves() {
        crate::store::tests::exercise(&SqliteStore::open_memory().unwrap());
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.put(b"sig", b"{}").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.list().unwrap(), vec![b"{}".to_vec()]);
    }
}
