//! SQLite storage backend.

use std::{path::Path, sync::Mutex};

use rusqlite::{params, Connection, OptionalExtension};

use super::{Storage, StorageError, StorageResult};

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS documents (
    key TEXT PRIMARY KEY NOT NULL,
    body TEXT NOT NULL
)";
const SELECT_SQL: &str = "SELECT body FROM documents WHERE key = ?1";
const UPSERT_SQL: &str = "INSERT INTO documents (key, body) VALUES (?1, ?2)
    ON CONFLICT(key) DO UPDATE SET body = excluded.body";
const APPEND_SQL: &str = "INSERT INTO documents (key, body) VALUES (?1, ?2)
    ON CONFLICT(key) DO UPDATE SET body = documents.body || excluded.body";
const EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM documents WHERE key = ?1)";
const KEYS_SQL: &str =
    "SELECT key FROM documents WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key";

/// Stores every key as a row of a single `documents` table.
pub struct SqliteStorage {
    connection: Mutex<Connection>,
}

/// Map rusqlite errors with a message.
trait SqliteResultExt<T> {
    fn db_context(self, message: &str) -> StorageResult<T>;
}

impl<T> SqliteResultExt<T> for Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> StorageResult<T> {
        self.map_err(|source| StorageError::Database {
            message: message.to_string(),
            source,
        })
    }
}

impl SqliteStorage {
    /// Opens (or creates) the database file and initializes the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let connection =
            Connection::open(path).db_context("Failed to open database connection")?;
        Self::with_connection(connection)
    }

    /// An in-memory database, mostly for tests.
    pub fn open_in_memory() -> StorageResult<Self> {
        let connection =
            Connection::open_in_memory().db_context("Failed to open in-memory database")?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> StorageResult<Self> {
        connection
            .execute_batch(SCHEMA_SQL)
            .db_context("Failed to initialize database schema")?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let connection = self.connection.lock().map_err(|_| StorageError::Unavailable {
            message: "database connection lock poisoned".to_string(),
        })?;
        f(&connection)
    }
}

impl Storage for SqliteStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(SELECT_SQL, params![key], |row| row.get(0))
                .optional()
                .db_context("Failed to read document")
        })
    }

    fn write(&self, key: &str, text: &str) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(UPSERT_SQL, params![key, text])
                .map(|_| ())
                .db_context("Failed to write document")
        })
    }

    fn append(&self, key: &str, text: &str) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(APPEND_SQL, params![key, text])
                .map(|_| ())
                .db_context("Failed to append to document")
        })
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        self.with_conn(|conn| {
            conn.query_row(EXISTS_SQL, params![key], |row| row.get(0))
                .db_context("Failed to check document")
        })
    }

    fn keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(KEYS_SQL)
                .db_context("Failed to prepare key listing")?;
            let keys = stmt
                .query_map(params![prefix], |row| row.get(0))
                .db_context("Failed to list keys")?
                .collect::<Result<Vec<String>, _>>()
                .db_context("Failed to read key")?;
            Ok(keys)
        })
    }
}
