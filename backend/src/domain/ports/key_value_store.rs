//! Port for device-local key-value storage.
//!
//! Values written here are idempotency markers only ("celebration shown",
//! "reminder sent at"). Losing them costs a repeated animation or banner,
//! never correctness, so callers treat failures as "marker absent".

use std::collections::HashMap;
use std::sync::Mutex;

use super::define_port_error;

define_port_error! {
    /// Errors raised by device storage adapters.
    pub enum KeyValueStoreError {
        /// The backing medium could not be read or written.
        Io { message: String } => InternalError: "device storage failed: {message}",
        /// A stored value could not be decoded.
        Corrupt { key: String, message: String } =>
            InternalError: "device storage value for {key} is corrupt: {message}",
    }
}

/// Synchronous string key-value store scoped to one device.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError>;

    /// Delete `key`. Deleting a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), KeyValueStoreError>;
}

/// Process-local store used by tests and headless sessions.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, KeyValueStoreError> {
        self.entries
            .lock()
            .map_err(|_| KeyValueStoreError::io("in-memory store mutex poisoned"))
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        self.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn in_memory_store_round_trips_values() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get("onboarding_shown").expect("get"), None);

        store.set("onboarding_shown", "true").expect("set");
        assert_eq!(
            store.get("onboarding_shown").expect("get"),
            Some("true".to_owned())
        );

        store.remove("onboarding_shown").expect("remove");
        store.remove("onboarding_shown").expect("remove twice");
        assert_eq!(store.get("onboarding_shown").expect("get"), None);
    }

    #[rstest]
    fn corrupt_error_names_the_key() {
        let error = KeyValueStoreError::corrupt("milestone_celebrations:abc", "eof");
        assert_eq!(
            error.to_string(),
            "device storage value for milestone_celebrations:abc is corrupt: eof"
        );
    }
}
