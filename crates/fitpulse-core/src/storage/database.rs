//! SQLite-backed key-value storage.
//!
//! The database holds a single `kv` table. Each persisted blob (step
//! history, user profile) lives under its own key and is exposed to the
//! stores through [`SqliteSlot`].

use std::path::Path;

use rusqlite::{params, Connection};

use super::data_dir;
use super::slot::KvSlot;
use crate::error::{Result, StorageError};

/// SQLite database for key-value blobs.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/fitpulse.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("fitpulse.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
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

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete a key. Deleting a missing key is not an error.
    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Bind this database to one key.
    pub fn slot(self, key: impl Into<String>) -> SqliteSlot {
        SqliteSlot {
            db: self,
            key: key.into(),
        }
    }
}

/// A [`KvSlot`] stored as one row of the `kv` table.
pub struct SqliteSlot {
    db: Database,
    key: String,
}

impl SqliteSlot {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl KvSlot for SqliteSlot {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.db.kv_get(&self.key)?)
    }

    fn write(&self, value: &str) -> Result<()> {
        Ok(self.db.kv_set(&self.key, value)?)
    }

    fn clear(&self) -> Result<()> {
        Ok(self.db.kv_delete(&self.key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "again").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "again");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn slot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitpulse.db");

        let slot = Database::open_at(&path).unwrap().slot("stepHistory");
        slot.write("[1]").unwrap();
        drop(slot);

        let slot = Database::open_at(&path).unwrap().slot("stepHistory");
        assert_eq!(slot.key(), "stepHistory");
        assert_eq!(slot.read().unwrap().as_deref(), Some("[1]"));
        slot.clear().unwrap();
        assert!(slot.read().unwrap().is_none());
    }

    #[test]
    fn slots_are_isolated_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitpulse.db");

        let steps = Database::open_at(&path).unwrap().slot("stepHistory");
        let profile = Database::open_at(&path).unwrap().slot("userProfile");
        steps.write("steps").unwrap();
        profile.write("profile").unwrap();
        steps.clear().unwrap();
        assert_eq!(profile.read().unwrap().as_deref(), Some("profile"));
    }
}
