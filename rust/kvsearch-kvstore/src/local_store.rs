use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kvsearch_common::{Result, error::Error};

use crate::KvStore;

/// A `LocalFsKvStore` implementation that serves values from files on the
/// local filesystem, one file per key, confined to a container directory.
///
/// Keys map to file names directly (`normal_terms_3` is read from
/// `<container>/normal_terms_3`). Keys are restricted to ASCII alphanumerics,
/// `_`, `-` and `.` and may not start with a dot, so no key can name a
/// path outside the container.
pub struct LocalFsKvStore {
    /// The top-level directory for this store.
    container_path: PathBuf,
}

impl LocalFsKvStore {
    /// Creates a store over an existing container directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `container_path` is not a directory.
    pub fn new(container_path: &Path) -> Result<LocalFsKvStore> {
        if !container_path.is_dir() {
            return Err(Error::invalid_arg(
                "container",
                format!("{container_path:?} is not a directory"),
            ));
        }
        Ok(LocalFsKvStore {
            container_path: container_path.to_path_buf(),
        })
    }

    /// Returns the file system path of the store's container.
    pub fn container_path(&self) -> &Path {
        &self.container_path
    }

    /// Converts a key into the path of its backing file.
    pub fn key_to_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
        if !valid {
            return Err(Error::invalid_arg("key", format!("invalid store key '{key}'")));
        }
        Ok(self.container_path.join(key))
    }
}

#[async_trait]
impl KvStore for LocalFsKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_to_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(format!("read {}", path.display()), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LocalFsKvStore;
    use crate::KvStore;

    #[tokio::test]
    async fn test_read_from_container() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc_0"), b"hello").unwrap();
        let store = LocalFsKvStore::new(dir.path()).unwrap();
        assert_eq!(store.get("doc_0").await.unwrap(), Some(b"hello".to_vec()));
        assert_eq!(store.get("doc_1").await.unwrap(), None);
        assert_eq!(store.get_text("doc_0").await.unwrap().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_keys_cannot_escape_container() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsKvStore::new(dir.path()).unwrap();
        for key in ["../etc", "a/b", "", ".hidden", "x y"] {
            assert!(store.get(key).await.is_err(), "{key}");
        }
    }

    #[test]
    fn test_container_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LocalFsKvStore::new(&dir.path().join("missing")).is_err());
    }
}
