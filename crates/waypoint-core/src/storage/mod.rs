//! The persistence collaborator.
//!
//! The engine addresses everything it persists by a stable `/`-separated
//! key (`trips/<trip>/journal`, ...) and relies only on the operations of
//! [`Storage`]. It assumes no locking and no partial-write semantics:
//! serialization of writers is the engine's job.
//!
//! Three backends are provided:
//!
//! - [`MemoryStorage`]: a map, for tests and ephemeral sessions
//! - [`DirectoryStorage`]: one plain file per key under a root directory
//! - [`SqliteStorage`]: a single SQLite `documents` table

use thiserror::Error;

mod directory;
mod memory;
mod sqlite;

pub use directory::DirectoryStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Errors raised by a storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// File system errors
    #[error("I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    /// SQLite errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Key cannot be mapped onto the backend
    #[error("Invalid storage key '{key}'")]
    InvalidKey { key: String },
    /// Backend refused the operation
    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Abstract text store addressed by key.
///
/// Calls are blocking; the engine runs them on the blocking thread pool.
pub trait Storage: Send + Sync {
    /// Returns the text stored under `key`, or `None` if absent.
    fn read(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replaces the text stored under `key`.
    fn write(&self, key: &str, text: &str) -> StorageResult<()>;

    /// Appends to the text stored under `key`, creating it if absent.
    fn append(&self, key: &str, text: &str) -> StorageResult<()>;

    /// True if `key` holds a value.
    fn exists(&self, key: &str) -> StorageResult<bool>;

    /// All keys starting with `prefix`, sorted.
    fn keys(&self, prefix: &str) -> StorageResult<Vec<String>>;
}

/// Splits a key into path segments, rejecting anything that could escape
/// the storage root.
pub(crate) fn key_segments(key: &str) -> StorageResult<Vec<&str>> {
    let segments: Vec<&str> = key.split('/').collect();
    let valid = segments.iter().all(|segment| {
        !segment.is_empty()
            && *segment != "."
            && *segment != ".."
            && segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
    });
    if valid {
        Ok(segments)
    } else {
        Err(StorageError::InvalidKey {
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_segments_reject_traversal() {
        assert_eq!(key_segments("trips/paris/journal").unwrap(), ["trips", "paris", "journal"]);
        assert!(key_segments("trips/../etc").is_err());
        assert!(key_segments("/trips").is_err());
        assert!(key_segments("trips//x").is_err());
        assert!(key_segments("trips/a b").is_err());
    }

    /// Contract shared by every backend.
    pub(crate) fn exercise_backend(storage: &dyn Storage) {
        assert_eq!(storage.read("trips/a/journal").unwrap(), None);
        assert!(!storage.exists("trips/a/journal").unwrap());

        storage.append("trips/a/journal", "/create-trip trip=\"a\" name=\"\"\n").unwrap();
        storage.append("trips/a/journal", "/undo count=1\n").unwrap();
        assert!(storage.exists("trips/a/journal").unwrap());
        assert_eq!(
            storage.read("trips/a/journal").unwrap().as_deref(),
            Some("/create-trip trip=\"a\" name=\"\"\n/undo count=1\n")
        );

        storage.write("trips/b/journal", "x\n").unwrap();
        storage.write("trips/b/journal", "y\n").unwrap();
        assert_eq!(storage.read("trips/b/journal").unwrap().as_deref(), Some("y\n"));

        storage.write("session/current-trip", "b").unwrap();
        assert_eq!(
            storage.keys("trips/").unwrap(),
            ["trips/a/journal", "trips/b/journal"]
        );
        assert_eq!(storage.keys("session/").unwrap(), ["session/current-trip"]);
    }
}
