//! Plain-file storage backend.
//!
//! ```text
//! <root>/trips/<trip>/journal            # canonical command lines
//! <root>/trips/<trip>/journal.canonical  # renormalize output
//! <root>/session/current-trip
//! ```

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use super::{key_segments, Storage, StorageError, StorageResult};

/// Stores each key as a file under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    /// Creates a storage rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            key: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        Ok(key_segments(key)?
            .into_iter()
            .fold(self.root.clone(), |path, segment| path.join(segment)))
    }

    fn ensure_parent(path: &Path, key: &str) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| io_error(key, source))?;
        }
        Ok(())
    }

    fn collect_keys(&self, dir: &Path, prefix: &str, keys: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.collect_keys(&path, prefix, keys)?;
                continue;
            }
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        Ok(())
    }
}

fn io_error(key: &str, source: io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl Storage for DirectoryStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn write(&self, key: &str, text: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        Self::ensure_parent(&path, key)?;
        fs::write(path, text).map_err(|e| io_error(key, e))
    }

    fn append(&self, key: &str, text: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        Self::ensure_parent(&path, key)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| io_error(key, e))?;
        file.write_all(text.as_bytes()).map_err(|e| io_error(key, e))
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.path_for(key)?.is_file())
    }

    fn keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        match self.collect_keys(&self.root, prefix, &mut keys) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(io_error(prefix, e)),
        }
        keys.sort();
        Ok(keys)
    }
}
