//! Error types for the engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::{assistant::AssistantError, command::CommandError, storage::StorageError};

/// Comprehensive error type for all engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed command text or a command that fails validation
    #[error("Command error: {0}")]
    Command(#[from] CommandError),
    /// Storage collaborator failure while reading or appending a journal
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: StorageError,
    },
    /// A persisted journal line could not be replayed
    #[error("Journal for trip '{trip}' is unreadable at line {line}: {reason}")]
    Replay {
        trip: String,
        line: usize,
        reason: String,
    },
    /// Trip has no journal
    #[error("Trip '{trip}' not found")]
    TripNotFound { trip: String },
    /// Trip journal already exists
    #[error("Trip '{trip}' already exists")]
    TripAlreadyExists { trip: String },
    /// Item id is not present in the current model
    #[error("Item '{id}' not found in trip '{trip}'")]
    ItemNotFound { trip: String, id: String },
    /// Explicit item id collides with one used earlier in the trip
    #[error("Item '{id}' already exists in trip '{trip}'")]
    ItemAlreadyExists { trip: String, id: String },
    /// AI collaborator failure
    #[error("Assistant error: {0}")]
    Assistant(#[from] AssistantError),
    /// AI task token is unknown
    #[error("Task {token} not found")]
    TaskNotFound { token: u64 },
    /// Command is reserved for human operators
    #[error("Command '/{keyword}' may only be issued by a human operator")]
    Forbidden { keyword: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating storage errors with context.
pub struct StorageErrorBuilder {
    message: String,
}

impl StorageErrorBuilder {
    /// Create a new storage error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: StorageError) -> EngineError {
        EngineError::Storage {
            message: self.message,
            source,
        }
    }
}

impl EngineError {
    /// Creates a builder for storage errors.
    pub fn storage(message: impl Into<String>) -> StorageErrorBuilder {
        StorageErrorBuilder::new(message)
    }

    /// Creates a replay error for a journal line.
    pub fn replay(trip: impl Into<String>, line: usize, reason: impl ToString) -> Self {
        Self::Replay {
            trip: trip.into(),
            line,
            reason: reason.to_string(),
        }
    }
}

/// Specialized extension trait for storage-related Results.
pub trait StorageResultExt<T> {
    /// Map storage errors with a message.
    fn storage_context(self, message: &str) -> Result<T>;
}

impl<T> StorageResultExt<T> for std::result::Result<T, StorageError> {
    fn storage_context(self, message: &str) -> Result<T> {
        self.map_err(|e| EngineError::storage(message).with_source(e))
    }
}

/// Maps a `spawn_blocking` join failure into a configuration error.
pub(crate) fn join_error(e: tokio::task::JoinError) -> EngineError {
    EngineError::Configuration {
        message: format!("Task join error: {e}"),
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
