use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::r#trait::{BlobStore, StoreError, validate_key};

const TMP_SUFFIX: &str = ".tmp";

/// Directory-backed blob store: one file per key.
///
/// Writes go to a sibling temporary file that is renamed over the target, so a
/// crash mid-write leaves the previous value in place.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root.display().to_string(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path(key)?;
        let tmp = self.root.join(format!("{key}{TMP_SUFFIX}"));
        fs::write(&tmp, bytes).map_err(|e| StoreError::io(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::io(key, e)
        })
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path(key)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(key.to_string()),
            _ => StoreError::io(key, e),
        })
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.path(key)?.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path().join("models")).unwrap();

        store.put("b.json", b"{}").unwrap();
        store.put("a.json", b"[]").unwrap();
        store.put("a.json", b"[1]").unwrap();

        assert_eq!(store.get("a.json").unwrap(), b"[1]".to_vec());
        assert_eq!(store.get("b.json").unwrap(), b"{}".to_vec());
        assert!(!store.root().join("a.json.tmp").exists());
    }

    #[test]
    fn missing_keys_are_not_found_and_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();

        assert_eq!(
            store.get("nope.json").unwrap_err(),
            StoreError::NotFound("nope.json".to_string())
        );
        store.delete("nope.json").unwrap();
        assert!(!store.exists("nope.json").unwrap());
    }

    #[test]
    fn rejects_keys_outside_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.put("../x.json", b"{}"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            store.get("sub/x.json"),
            Err(StoreError::InvalidKey(_))
        ));
    }
}
