//! File-based key-value store for native platforms.

use super::{AnnotationRecord, BoxFuture, KeyValueStore, PersistError, PersistResult};
use std::fs;
use std::path::PathBuf;

/// File-backed store keeping one JSON file per document key.
pub struct FileStore {
    /// Base directory for record storage.
    base_path: PathBuf,
}

impl FileStore {
    /// Create a new file store rooted at the given directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> PersistResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                PersistError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a file store in the default location.
    ///
    /// On Unix: `~/.local/share/verseink/annotations/`
    /// On Windows: `%LOCALAPPDATA%\verseink\annotations\`
    pub fn default_location() -> PersistResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| PersistError::Io("Could not determine home directory".to_string()))?;

        let path = base.join("verseink").join("annotations");
        Self::new(path)
    }

    /// Get the file path for a document key.
    fn record_path(&self, key: &str) -> PathBuf {
        // Sanitize the key to be safe for filenames
        let safe_key: String = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_path.join(format!("{}.json", safe_key))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> BoxFuture<'_, PersistResult<AnnotationRecord>> {
        let path = self.record_path(key);
        let key_owned = key.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(PersistError::NotFound(key_owned));
            }

            let json = fs::read_to_string(&path).map_err(|e| {
                PersistError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;

            serde_json::from_str(&json).map_err(|e| {
                PersistError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
            })
        })
    }

    fn put(&self, key: &str, record: &AnnotationRecord) -> BoxFuture<'_, PersistResult<()>> {
        let path = self.record_path(key);
        let json = match serde_json::to_string(record) {
            Ok(j) => j,
            Err(e) => {
                return Box::pin(async move { Err(PersistError::Serialization(e.to_string())) });
            }
        };

        Box::pin(async move {
            fs::write(&path, json).map_err(|e| {
                PersistError::Io(format!("Failed to write {}: {}", path.display(), e))
            })
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, PersistResult<()>> {
        let path = self.record_path(key);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    PersistError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::tests::block_on;
    use tempfile::tempdir;

    fn record(data: &str) -> AnnotationRecord {
        AnnotationRecord {
            stroke_data: data.to_string(),
            margin_height: 120.0,
            last_modified: 42,
        }
    }

    #[test]
    fn test_file_store_put_get() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        block_on(store.put("john:3", &record("[]"))).unwrap();
        let loaded = block_on(store.get("john:3")).unwrap();

        assert_eq!(loaded, record("[]"));
    }

    #[test]
    fn test_file_store_not_found() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(store.get("nonexistent"));
        assert!(matches!(result, Err(PersistError::NotFound(_))));
    }

    #[test]
    fn test_file_store_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        block_on(store.put("psalms:23", &record("[]"))).unwrap();
        block_on(store.delete("psalms:23")).unwrap();

        assert!(matches!(
            block_on(store.get("psalms:23")),
            Err(PersistError::NotFound(_))
        ));
    }

    #[test]
    fn test_file_store_sanitizes_key() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        // Document keys contain a colon separator; it must not leak into paths.
        block_on(store.put("song of songs:4", &record("[]"))).unwrap();
        let loaded = block_on(store.get("song of songs:4")).unwrap();

        assert_eq!(loaded.last_modified, 42);
    }
}
