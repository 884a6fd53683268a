use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Namespaced text storage. Every value is one string under `(namespace, key)`;
/// callers rewrite whole values, there is no partial update.
pub trait KvStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, namespace: &str, key: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
pub use memory::MemoryKv;


/// Reads a JSON list stored under `(namespace, key)`.
///
/// A missing value, a read failure and unparseable text all come back as an
/// empty list. Stored data that no longer parses must never break the caller.
/// Read-modify-write paths use [`try_load_list`] instead.
pub fn load_list<T: DeserializeOwned>(kv: &dyn KvStore, namespace: &str, key: &str) -> Vec<T> {
    match try_load_list(kv, namespace, key) {
        Ok(v) => v,
        Err(e) => {
            warn!(namespace, key, error = %e, "storage read failed, treating as empty");
            Vec::new()
        }
    }
}

/// Like [`load_list`], but a failed read is returned to the caller. Writing
/// back after a failed read would replace the stored list with a partial one.
pub fn try_load_list<T: DeserializeOwned>(
    kv: &dyn KvStore,
    namespace: &str,
    key: &str,
) -> Result<Vec<T>, StoreError> {
    let Some(text) = kv.get(namespace, key)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<Vec<T>>(&text) {
        Ok(v) => Ok(v),
        Err(e) => {
            debug!(namespace, key, error = %e, "unparseable stored list, treating as empty");
            Ok(Vec::new())
        }
    }
}

pub fn save_list<T: Serialize>(
    kv: &dyn KvStore,
    namespace: &str,
    key: &str,
    items: &[T],
) -> Result<(), StoreError> {
    let text = serde_json::to_string(items)?;
    kv.set(namespace, key, &text)
}

/// Single-record counterpart of [`load_list`]; same fallback rules.
pub fn load_value<T: DeserializeOwned>(kv: &dyn KvStore, namespace: &str, key: &str) -> Option<T> {
    match try_load_value(kv, namespace, key) {
        Ok(v) => v,
        Err(e) => {
            warn!(namespace, key, error = %e, "storage read failed");
            None
        }
    }
}

/// Single-record counterpart of [`try_load_list`].
pub fn try_load_value<T: DeserializeOwned>(
    kv: &dyn KvStore,
    namespace: &str,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(text) = kv.get(namespace, key)? else {
        return Ok(None);
    };
    Ok(serde_json::from_str(&text).ok())
}

pub fn save_value<T: Serialize>(
    kv: &dyn KvStore,
    namespace: &str,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let text = serde_json::to_string(value)?;
    kv.set(namespace, key, &text)
}
