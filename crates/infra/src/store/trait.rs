use thiserror::Error;

/// Keyed byte storage for datasets and model artifacts.
///
/// Keys are flat names (`project_cost.model.json`); implementations reject
/// anything that could escape their root.
pub trait BlobStore: Send + Sync {
    /// Replace the value under `key`. Readers never observe a partial write.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Read the value under `key`, or `StoreError::NotFound`.
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    fn exists(&self, key: &str) -> Result<bool, StoreError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    #[error("io error on {key}: {message}")]
    Io { key: String, message: String },

    #[error("serialization error on {key}: {message}")]
    Serialization { key: String, message: String },

    /// A stored value decoded but is inconsistent with its neighbours.
    #[error("corrupt entry {key}: {message}")]
    Corrupt { key: String, message: String },
}

impl StoreError {
    pub fn io(key: &str, err: impl ToString) -> Self {
        Self::Io {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    pub fn serialization(key: &str, err: impl ToString) -> Self {
        Self::Serialization {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    pub fn corrupt(key: &str, message: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Flat file-name keys: ASCII alphanumerics plus `.`, `_`, `-`, not starting with `.`.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
