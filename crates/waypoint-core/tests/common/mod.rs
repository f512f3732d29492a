use std::{
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use tempfile::TempDir;
use waypoint_core::{
    storage::StorageResult, Engine, EngineBuilder, MemoryStorage, SequentialIds, Storage,
    StorageError,
};

/// Helper function to create a test engine backed by a temporary directory
pub async fn create_test_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let engine = directory_engine(temp_dir.path()).await;
    (temp_dir, engine)
}

/// Engine storing journals under `dir`, with deterministic ids
pub async fn directory_engine(dir: &Path) -> Engine {
    EngineBuilder::new()
        .with_storage_dir(dir)
        .with_id_generator(SequentialIds::new())
        .build()
        .await
        .expect("Failed to create engine")
}

/// Memory storage whose appends can be switched off.
pub struct FlakyStorage {
    inner: MemoryStorage,
    /// Appends that still succeed before every further one fails
    allowed: AtomicUsize,
}

impl FlakyStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStorage::new(),
            allowed: AtomicUsize::new(usize::MAX),
        })
    }

    pub fn fail_appends(&self, failing: bool) {
        let allowed = if failing { 0 } else { usize::MAX };
        self.allowed.store(allowed, Ordering::SeqCst);
    }

    /// Lets `appends` more appends through, then fails the rest.
    pub fn fail_after(&self, appends: usize) {
        self.allowed.store(appends, Ordering::SeqCst);
    }
}

impl Storage for FlakyStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, text: &str) -> StorageResult<()> {
        self.inner.write(key, text)
    }

    fn append(&self, key: &str, text: &str) -> StorageResult<()> {
        let permitted = self
            .allowed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                left => Some(left - 1),
            })
            .is_ok();
        if !permitted {
            return Err(StorageError::Unavailable {
                message: "disk on fire".to_string(),
            });
        }
        self.inner.append(key, text)
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key)
    }

    fn keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.inner.keys(prefix)
    }
}
