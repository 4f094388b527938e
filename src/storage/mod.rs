pub mod memory;
pub mod sqlite;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StorefrontError};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage key holding the cart line list
pub const CART_KEY: &str = "cart-storage";

/// Storage key holding the session/profile bundle
pub const AUTH_KEY: &str = "auth-storage";

/// Storage key holding the theme preference
pub const THEME_KEY: &str = "theme-storage";

/// Durable key-value storage with string values
pub trait KeyValueStore: Send + Sync {
    /// Get raw value for a key
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace the value for a key
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; absent keys are not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// List stored keys
    fn keys(&self) -> Result<Vec<String>>;

    /// Remove every key
    fn clear(&self) -> Result<()>;
}

/// Read and parse a JSON value.
///
/// Missing keys, unreadable storage and corrupted JSON all come back as
/// `None`; callers substitute their default.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Failed to read '{}' from storage: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Discarding corrupted '{}' in storage: {}", key, e);
            None
        }
    }
}

/// Serialize and write a JSON value. Failures are logged and swallowed.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(StorefrontError::from)
        .and_then(|json| store.set(key, &json));

    if let Err(e) = result {
        tracing::warn!("Failed to persist '{}': {}", key, e);
    }
}

/// Remove a key. Failures are logged and swallowed.
pub fn remove_key(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::warn!("Failed to remove '{}' from storage: {}", key, e);
    }
}
