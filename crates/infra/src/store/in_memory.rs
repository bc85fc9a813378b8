use std::collections::HashMap;
use std::sync::RwLock;

use super::r#trait::{BlobStore, StoreError, validate_key};

/// In-memory blob store.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        self.blobs
            .write()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        validate_key(key)?;
        self.blobs
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.blobs.write().unwrap().remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        Ok(self.blobs.read().unwrap().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete() {
        let store = InMemoryBlobStore::new();
        store.put("a.json", b"[1]").unwrap();
        assert_eq!(store.get("a.json").unwrap(), b"[1]".to_vec());
        assert!(store.exists("a.json").unwrap());

        store.delete("a.json").unwrap();
        store.delete("a.json").unwrap();
        assert_eq!(
            store.get("a.json").unwrap_err(),
            StoreError::NotFound("a.json".to_string())
        );
    }

    #[test]
    fn rejects_path_like_keys() {
        let store = InMemoryBlobStore::new();
        assert!(matches!(
            store.put("../escape", b"x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(store.get(".hidden"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(store.put("", b"x"), Err(StoreError::InvalidKey(_))));
    }
}
