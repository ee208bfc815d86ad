//! SQLite-backed medium. Survives process restarts the way browser storage
//! survives page reloads.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use rollbook_core::errors::LocalStorageError;
use rollbook_core::traits::KeyValueMedium;

use crate::to_storage_err;

/// Durable key/value medium over a single SQLite connection.
pub struct SqliteMedium {
    conn: Mutex<Connection>,
}

impl SqliteMedium {
    /// Open (or create) the medium at `path`.
    pub fn open(path: &Path) -> Result<Self, LocalStorageError> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        Self::initialize(conn)
    }

    /// Open a private in-memory medium (for testing).
    pub fn open_in_memory() -> Result<Self, LocalStorageError> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self, LocalStorageError> {
        apply_pragmas(&conn)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv_items (
                key         TEXT PRIMARY KEY,
                value       TEXT NOT NULL,
                updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, LocalStorageError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_storage_err(format!("connection lock poisoned: {e}")))?;
        f(&guard).map_err(|e| to_storage_err(e.to_string()))
    }
}

/// WAL journal, NORMAL sync, 5s busy timeout.
fn apply_pragmas(conn: &Connection) -> Result<(), LocalStorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

impl KeyValueMedium for SqliteMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, LocalStorageError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM kv_items WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), LocalStorageError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_items (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![key, value],
            )
            .map(|_| ())
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), LocalStorageError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv_items WHERE key = ?1", params![key])
                .map(|_| ())
        })
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, LocalStorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT key FROM kv_items
                 WHERE substr(key, 1, length(?1)) = ?1
                 ORDER BY key",
            )?;
            let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;
            let keys = rows.collect::<rusqlite::Result<Vec<String>>>();
            keys
        })
    }
}
