use crate::kv::{KvStore, StoreError};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

pub const DB_FILE: &str = "classter.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_entries(
            namespace TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT,
            PRIMARY KEY(namespace, key)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_kv_entries_namespace ON kv_entries(namespace)",
        [],
    )?;

    Ok(conn)
}

/// [`KvStore`] over the workspace database.
pub struct SqliteKv {
    conn: Mutex<Connection>,
}

impl SqliteKv {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(open_db(workspace)?))
    }
}

impl KvStore for SqliteKv {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let v = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE namespace = ? AND key = ?",
                (namespace, key),
                |r| r.get::<_, String>(0),
            )
            .optional()?;
        Ok(v)
    }

    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO kv_entries(namespace, key, value, updated_at) VALUES(?, ?, ?, ?)
             ON CONFLICT(namespace, key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
            (namespace, key, value, now),
        )?;
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute(
            "DELETE FROM kv_entries WHERE namespace = ? AND key = ?",
            (namespace, key),
        )?;
        Ok(())
    }
}
