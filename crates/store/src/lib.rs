mod migrate;
mod queries;
mod schema;

use std::sync::{Mutex, MutexGuard};
use til_types::{NoteRecord, Result, TilError};

/// SQLite-backed implementation of the [`til_types::Store`] trait.
pub struct SqliteStore {
    pub(crate) conn: Mutex<rusqlite::Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    /// Open an in-memory database (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    /// Run pragmas, schema DDL and the column migration.
    fn init(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(schema::SCHEMA_SQL)?;
        migrate::ensure_columns(&conn, "til", NoteRecord::COLUMNS)?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, rusqlite::Connection>> {
        self.conn.lock().map_err(|_| TilError::LockPoisoned)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
