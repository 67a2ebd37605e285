//! Recovery cache: a key-value store holding the last unsaved content per document
//!
//! Content lives under `<id>`; the RFC 3339 time it was written lives under
//! `<id>:last-write`.

use crate::error::StorageError;
use crate::types::DocumentId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

/// Result type for recovery cache operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Async key-value store backing crash recovery
#[async_trait]
pub trait RecoveryCache: Send + Sync {
    /// Read the value under `key`; `StorageError::NotFound` when absent
    async fn get(&self, key: &str) -> StorageResult<String>;

    /// Store a value, replacing any previous one
    async fn set(&self, key: &str, value: String) -> StorageResult<()>;

    /// Remove a value; `StorageError::NotFound` when absent
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Directory-backed cache, one file per key
///
/// File names are the hex encoding of the key, so ids containing `/` or `:`
/// never escape the root.
pub struct LocalRecoveryCache {
    root: PathBuf,
}

impl LocalRecoveryCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(hex::encode(key.as_bytes()))
    }
}

#[async_trait]
impl RecoveryCache for LocalRecoveryCache {
    async fn get(&self, key: &str) -> StorageResult<String> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(value),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: String) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        // Write to a temp file first, then rename over the old value
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, value)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }
}

/// In-memory cache (for testing)
#[derive(Default)]
pub struct MemoryRecoveryCache {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryRecoveryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecoveryCache for MemoryRecoveryCache {
    async fn get(&self, key: &str) -> StorageResult<String> {
        self.data
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn set(&self, key: &str, value: String) -> StorageResult<()> {
        self.data.write().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.data
            .write()
            .unwrap()
            .remove(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(())
    }
}

/// Key holding the cached content of a document
pub fn content_key(id: &DocumentId) -> String {
    id.as_str().to_string()
}

/// Key holding the time the cached content was written
pub fn last_write_key(id: &DocumentId) -> String {
    format!("{}:last-write", id)
}

/// Content recovered for a document
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredCopy {
    pub content: String,
    pub written_at: DateTime<Utc>,
}

/// Record the current content of a document
pub async fn store_copy(
    cache: &dyn RecoveryCache,
    id: &DocumentId,
    content: &str,
    written_at: DateTime<Utc>,
) -> StorageResult<()> {
    cache.set(&content_key(id), content.to_string()).await?;
    cache.set(&last_write_key(id), written_at.to_rfc3339()).await
}

/// Load the cached copy of a document, if a complete one exists
///
/// A copy without a readable timestamp is ignored.
pub async fn load_copy(
    cache: &dyn RecoveryCache,
    id: &DocumentId,
) -> StorageResult<Option<RecoveredCopy>> {
    let content = match cache.get(&content_key(id)).await {
        Ok(content) => content,
        Err(StorageError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    let stamp = match cache.get(&last_write_key(id)).await {
        Ok(stamp) => stamp,
        Err(StorageError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };

    match DateTime::parse_from_rfc3339(stamp.trim()) {
        Ok(written_at) => Ok(Some(RecoveredCopy {
            content,
            written_at: written_at.with_timezone(&Utc),
        })),
        Err(e) => {
            tracing::warn!("Ignoring recovery copy of {} with bad timestamp: {}", id, e);
            Ok(None)
        }
    }
}

/// Drop the cached copy of a document; missing keys are not an error
pub async fn clear_copy(cache: &dyn RecoveryCache, id: &DocumentId) -> StorageResult<()> {
    for key in [content_key(id), last_write_key(id)] {
        match cache.remove(&key).await {
            Ok(()) | Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_memory_cache() {
        let cache = MemoryRecoveryCache::new();

        cache.set("doc", "<p>draft</p>".to_string()).await.unwrap();
        assert_eq!(cache.get("doc").await.unwrap(), "<p>draft</p>");

        cache.remove("doc").await.unwrap();
        assert!(matches!(cache.get("doc").await, Err(StorageError::NotFound(_))));
        assert!(matches!(cache.remove("doc").await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_local_cache_keeps_odd_keys_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalRecoveryCache::new(dir.path().join("recovery"));

        cache.set("../urn:uuid/x", "value".to_string()).await.unwrap();
        assert_eq!(cache.get("../urn:uuid/x").await.unwrap(), "value");

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("recovery"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec![hex::encode("../urn:uuid/x")]);

        cache.remove("../urn:uuid/x").await.unwrap();
        assert!(matches!(cache.get("../urn:uuid/x").await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_copy_keys_and_timestamps() {
        let cache = MemoryRecoveryCache::new();
        let id = DocumentId::from("book-1");
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        store_copy(&cache, &id, "<p>x</p>", at).await.unwrap();
        assert_eq!(cache.get("book-1").await.unwrap(), "<p>x</p>");
        assert_eq!(cache.get("book-1:last-write").await.unwrap(), "2024-03-01T12:00:00+00:00");

        let copy = load_copy(&cache, &id).await.unwrap().unwrap();
        assert_eq!(copy.content, "<p>x</p>");
        assert_eq!(copy.written_at, at);

        clear_copy(&cache, &id).await.unwrap();
        assert_eq!(load_copy(&cache, &id).await.unwrap(), None);
        clear_copy(&cache, &id).await.unwrap();
    }

    #[tokio::test]
    async fn test_copy_without_valid_stamp_is_ignored() {
        let cache = MemoryRecoveryCache::new();
        let id = DocumentId::from("book-2");

        cache.set("book-2", "<p>x</p>".to_string()).await.unwrap();
        assert_eq!(load_copy(&cache, &id).await.unwrap(), None);

        cache.set("book-2:last-write", "yesterday".to_string()).await.unwrap();
        assert_eq!(load_copy(&cache, &id).await.unwrap(), None);
    }
}
