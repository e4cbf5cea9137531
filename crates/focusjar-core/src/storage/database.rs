//! SQLite-backed key-value store.
//!
//! One `kv` table holds every persisted blob. The file lives at
//! `<data_dir>/focusjar.db`.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, KvStore};
use crate::error::StorageError;

/// SQLite database used as the Persistent Store.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/focusjar.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(&data_dir()?.join("focusjar.db"))
    }

    /// Open (or create) the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl KvStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.get("test").unwrap().is_none());
        db.set("test", "hello").unwrap();
        assert_eq!(db.get("test").unwrap().unwrap(), "hello");
        db.set("test", "again").unwrap();
        assert_eq!(db.get("test").unwrap().unwrap(), "again");
        db.delete("test").unwrap();
        assert!(db.get("test").unwrap().is_none());
    }

    #[test]
    fn delete_missing_key_is_ok() {
        let db = Database::open_memory().unwrap();
        db.delete("never-set").unwrap();
    }

    #[test]
    fn open_failure_surfaces_as_core_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("focusjar.db");

        let open = || -> crate::error::Result<Database> { Ok(Database::open_at(&path)?) };
        let err = open().unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Storage(StorageError::OpenFailed { .. })
        ));
        assert!(err.to_string().starts_with("Storage error: Failed to open store at"));
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focusjar.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.set("focusJarMainTask", "\"ship it\"").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(
            db.get("focusJarMainTask").unwrap().as_deref(),
            Some("\"ship it\"")
        );
    }
}
