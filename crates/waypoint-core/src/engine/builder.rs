//! Builder for creating and configuring Engine instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::task;

use super::Engine;
use crate::{
    assistant::Assistant,
    error::{join_error, EngineError, Result, StorageResultExt},
    ids::{ClockIds, IdGenerator},
    storage::{DirectoryStorage, MemoryStorage, SqliteStorage, Storage},
};

/// Default number of chained steps an AI task may take.
pub const DEFAULT_MAX_AI_STEPS: usize = 4;

#[derive(Clone)]
enum StorageChoice {
    Default,
    Directory(PathBuf),
    Sqlite(PathBuf),
    Memory,
    Custom(Arc<dyn Storage>),
}

/// Builder for creating and configuring Engine instances.
#[derive(Clone)]
pub struct EngineBuilder {
    storage: StorageChoice,
    ids: Option<Arc<dyn IdGenerator>>,
    assistant: Option<Arc<dyn Assistant>>,
    max_ai_steps: usize,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            storage: StorageChoice::Default,
            ids: None,
            assistant: None,
            max_ai_steps: DEFAULT_MAX_AI_STEPS,
        }
    }

    /// Stores journals as plain files under `dir`.
    ///
    /// If no storage is chosen, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/waypoint/journals` or `~/.local/share/waypoint/journals`
    pub fn with_storage_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.storage = StorageChoice::Directory(dir.as_ref().to_path_buf());
        self
    }

    /// Stores journals in a SQLite database file.
    pub fn with_sqlite_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.storage = StorageChoice::Sqlite(path.as_ref().to_path_buf());
        self
    }

    /// Keeps everything in memory.
    pub fn with_memory_storage(mut self) -> Self {
        self.storage = StorageChoice::Memory;
        self
    }

    /// Uses a caller-provided storage collaborator.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = StorageChoice::Custom(storage);
        self
    }

    /// Replaces the clock-based item id generator.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    /// Enables AI tasks.
    pub fn with_assistant(mut self, assistant: impl Assistant + 'static) -> Self {
        self.assistant = Some(Arc::new(assistant));
        self
    }

    /// Caps the chained steps of one AI task.
    pub fn with_max_ai_steps(mut self, steps: usize) -> Self {
        self.max_ai_steps = steps;
        self
    }

    /// Builds the configured engine instance.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Configuration` if the AI step cap is zero
    /// Returns `EngineError::FileSystem` if the storage path is invalid
    /// Returns `EngineError::Storage` if the backend fails to open
    pub async fn build(self) -> Result<Engine> {
        if self.max_ai_steps == 0 {
            return Err(EngineError::Configuration {
                message: "max AI steps must be at least 1".to_string(),
            });
        }

        let storage: Arc<dyn Storage> = match self.storage {
            StorageChoice::Default => Self::open_directory(Self::default_storage_dir()?).await?,
            StorageChoice::Directory(dir) => Self::open_directory(dir).await?,
            StorageChoice::Sqlite(path) => Self::open_sqlite(path).await?,
            StorageChoice::Memory => Arc::new(MemoryStorage::new()),
            StorageChoice::Custom(storage) => storage,
        };
        let ids = self.ids.unwrap_or_else(|| Arc::new(ClockIds::new()));

        Ok(Engine::new(storage, ids, self.assistant, self.max_ai_steps))
    }

    async fn open_directory(dir: PathBuf) -> Result<Arc<dyn Storage>> {
        let storage = task::spawn_blocking(move || DirectoryStorage::new(dir))
            .await
            .map_err(join_error)?
            .storage_context("Failed to open storage directory")?;
        Ok(Arc::new(storage))
    }

    async fn open_sqlite(path: PathBuf) -> Result<Arc<dyn Storage>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let storage = task::spawn_blocking(move || SqliteStorage::open(path))
            .await
            .map_err(join_error)?
            .storage_context("Failed to open database")?;
        Ok(Arc::new(storage))
    }

    /// Returns the default storage directory following XDG Base Directory
    /// specification.
    fn default_storage_dir() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("waypoint")
            .place_data_file("journals")
            .map_err(|e| EngineError::XdgDirectory(e.to_string()))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
