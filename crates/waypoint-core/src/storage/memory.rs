//! In-memory storage backend.

use std::{collections::BTreeMap, sync::Mutex};

use super::{Storage, StorageError, StorageResult};

/// Keeps every key in a map. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_documents<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> T,
    ) -> StorageResult<T> {
        let mut documents = self.documents.lock().map_err(|_| StorageError::Unavailable {
            message: "memory storage lock poisoned".to_string(),
        })?;
        Ok(f(&mut documents))
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        self.with_documents(|docs| docs.get(key).cloned())
    }

    fn write(&self, key: &str, text: &str) -> StorageResult<()> {
        self.with_documents(|docs| {
            docs.insert(key.to_string(), text.to_string());
        })
    }

    fn append(&self, key: &str, text: &str) -> StorageResult<()> {
        self.with_documents(|docs| docs.entry(key.to_string()).or_default().push_str(text))
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        self.with_documents(|docs| docs.contains_key(key))
    }

    fn keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.with_documents(|docs| {
            docs.keys()
                .filter(|key| key.starts_with(prefix))
                .cloned()
                .collect()
        })
    }
}
