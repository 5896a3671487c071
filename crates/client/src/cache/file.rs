//! File-backed storage: one `<key>.json` file per entry.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{CacheError, LocalStorage};

/// Storage rooted at a directory, created on first write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` as the storage root.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, CacheError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl LocalStorage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(self.path(key)?).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), CacheError> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.dir).await?;

        // Write then rename so readers never see a half-written entry.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.path(key)?).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entries_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("cache"));
        storage
            .set_item("cartItems", "[]".to_string())
            .await
            .unwrap();

        let reopened = FileStorage::new(dir.path().join("cache"));
        assert_eq!(
            reopened.get_item("cartItems").await.unwrap().as_deref(),
            Some("[]")
        );
        assert!(dir.path().join("cache/cartItems.json").exists());
    }

    #[tokio::test]
    async fn test_missing_entry_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.get_item("cartDetails").await.unwrap(), None);

        storage.remove_item("cartDetails").await.unwrap();
        storage
            .set_item("cartDetails", "{}".to_string())
            .await
            .unwrap();
        storage.remove_item("cartDetails").await.unwrap();
        assert_eq!(storage.get_item("cartDetails").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let err = storage
            .set_item("../escape", String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidKey(_)));
    }
}
