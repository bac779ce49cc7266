//! # Key-Value Storage
//!
//! Persistence port for the cart (and the shopper's auth token).
//! The browser implementation lives in `cart-wasm`; this module ships an
//! in-memory store for tests and a directory-backed store for native clients.

use crate::error::{CheckoutError, CheckoutResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Fixed key the cart is persisted under
pub const CART_KEY: &str = "cart";

/// Key holding the shopper's bearer token, when logged in
pub const TOKEN_KEY: &str = "token";

/// Synchronous string key-value store (the `localStorage` shape)
pub trait KeyValueStore {
    /// Read a value. A missing key is `Ok(None)`.
    fn get(&self, key: &str) -> CheckoutResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&mut self, key: &str, value: &str) -> CheckoutResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    fn remove(&mut self, key: &str) -> CheckoutResult<()>;
}

/// The saved bearer token, trimmed and unquoted. Unreadable storage counts as logged out.
pub fn stored_token(storage: &impl KeyValueStore) -> Option<String> {
    match storage.get(TOKEN_KEY) {
        Ok(token) => token
            .map(|t| t.trim().trim_matches('"').to_string())
            .filter(|t| !t.is_empty()),
        Err(e) => {
            tracing::warn!("Cannot read stored token: {}", e);
            None
        }
    }
}

/// In-memory store. Clones share the same entries, which lets tests
/// "reload" a cart from what a previous store instance wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed an entry
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.into(), value.into());
        }
        self
    }

    fn lock(&self) -> CheckoutResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| CheckoutError::Storage("memory storage lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> CheckoutResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> CheckoutResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> CheckoutResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir`, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> CheckoutResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| CheckoutError::Storage(format!("{}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> CheckoutResult<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CheckoutError::Storage(format!("invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> CheckoutResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CheckoutError::Storage(format!("{}: {}", path.display(), e))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> CheckoutResult<()> {
        let path = self.path_for(key)?;
        // Never leave a half-written file under the real key
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .and_then(|_| std::fs::rename(&tmp, &path))
            .map_err(|e| CheckoutError::Storage(format!("{}: {}", path.display(), e)))
    }

    fn remove(&mut self, key: &str) -> CheckoutResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CheckoutError::Storage(format!("{}: {}", path.display(), e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_shared_between_clones() {
        let mut a = MemoryStorage::new();
        let b = a.clone();

        a.set(CART_KEY, "[]").unwrap();
        assert_eq!(b.get(CART_KEY).unwrap().as_deref(), Some("[]"));

        a.remove(CART_KEY).unwrap();
        assert!(b.get(CART_KEY).unwrap().is_none());
    }

    #[test]
    fn test_stored_token() {
        assert_eq!(stored_token(&MemoryStorage::new()), None);
        let quoted = MemoryStorage::new().with_entry(TOKEN_KEY, "\"jwt-abc\"\n");
        assert_eq!(stored_token(&quoted).as_deref(), Some("jwt-abc"));
        let blank = MemoryStorage::new().with_entry(TOKEN_KEY, "  ");
        assert_eq!(stored_token(&blank), None);
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path().join("state")).unwrap();

        assert!(storage.get(CART_KEY).unwrap().is_none());

        storage.set(CART_KEY, r#"[{"quantity":1}]"#).unwrap();
        let reopened = FileStorage::open(storage.dir().to_path_buf()).unwrap();
        assert_eq!(
            reopened.get(CART_KEY).unwrap().as_deref(),
            Some(r#"[{"quantity":1}]"#)
        );

        storage.remove(CART_KEY).unwrap();
        storage.remove(CART_KEY).unwrap();
        assert!(storage.get(CART_KEY).unwrap().is_none());
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        assert!(matches!(
            storage.get("../etc/passwd"),
            Err(CheckoutError::Storage(_))
        ));
    }
}
