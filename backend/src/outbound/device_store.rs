//! Device key-value store persisted as one JSON object in a file.
//!
//! The store is opened inside a `cap_std` directory handle so it can only
//! touch its own file. Writes go to a temporary sibling that is renamed over
//! the target, so a crash never leaves a half-written map behind.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tracing::warn;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

/// File-backed [`KeyValueStore`].
#[derive(Debug)]
pub struct DeviceFileStore {
    dir: Dir,
    file_name: String,
    entries: Mutex<BTreeMap<String, String>>,
}

impl DeviceFileStore {
    /// Open (creating if needed) `file_name` inside `dir`.
    ///
    /// An unreadable or corrupt file is treated as empty and replaced on the
    /// next write.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or opened.
    pub fn open(dir: &Path, file_name: &str) -> io::Result<Self> {
        Dir::create_ambient_dir_all(dir, ambient_authority())?;
        let dir = Dir::open_ambient_dir(dir, ambient_authority())?;
        let entries = load_entries(&dir, file_name);
        Ok(Self {
            dir,
            file_name: file_name.to_owned(),
            entries: Mutex::new(entries),
        })
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), KeyValueStoreError> {
        let contents = serde_json::to_string(entries)
            .map_err(|err| KeyValueStoreError::io(err.to_string()))?;
        let tmp_name = format!(".{}.tmp.{}", self.file_name, std::process::id());
        write_new(&self.dir, &tmp_name, &contents).map_err(|err| {
            drop(self.dir.remove_file(&tmp_name));
            KeyValueStoreError::io(format!("write {tmp_name}: {err}"))
        })?;
        self.dir
            .rename(&tmp_name, &self.dir, &self.file_name)
            .map_err(|err| KeyValueStoreError::io(format!("replace {}: {err}", self.file_name)))
    }
}

fn load_entries(dir: &Dir, file_name: &str) -> BTreeMap<String, String> {
    let raw = match dir.read_to_string(file_name) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(err) => {
            warn!(file = file_name, error = %err, "device store unreadable; starting empty");
            return BTreeMap::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!(file = file_name, error = %err, "device store corrupt; starting empty");
        BTreeMap::new()
    })
}

fn write_new(dir: &Dir, name: &str, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    let mut file = dir.open_with(name, &options)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

impl KeyValueStore for DeviceFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        let mut entries = self.lock();
        let previous = entries.insert(key.to_owned(), value.to_owned());
        if let Err(err) = self.persist(&entries) {
            match previous {
                Some(previous) => entries.insert(key.to_owned(), previous),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        let mut entries = self.lock();
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(err) = self.persist(&entries) {
            entries.insert(key.to_owned(), previous);
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> DeviceFileStore {
        DeviceFileStore::open(dir.path(), "device_store.json").expect("store opens")
    }

    #[rstest]
    fn values_survive_reopening() {
        let dir = TempDir::new().expect("temp dir");
        let store = open(&dir);
        store.set("milestone_celebrations:a", "{}").expect("set");
        store.set("notification_throttle:x:a", "2026-01-01T00:00:00Z").expect("set");
        store.remove("notification_throttle:x:a").expect("remove");
        drop(store);

        let reopened = open(&dir);
        assert_eq!(
            reopened.get("milestone_celebrations:a").expect("get"),
            Some("{}".to_owned())
        );
        assert_eq!(reopened.get("notification_throttle:x:a").expect("get"), None);
    }

    #[rstest]
    fn corrupt_file_starts_empty_and_is_replaced() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("device_store.json"), "{not json").expect("seed");

        let store = open(&dir);
        assert_eq!(store.get("anything").expect("get"), None);
        store.set("k", "v").expect("set");

        let raw = std::fs::read_to_string(dir.path().join("device_store.json")).expect("read");
        assert_eq!(raw, r#"{"k":"v"}"#);
    }

    #[rstest]
    fn missing_directories_are_created() {
        let dir = TempDir::new().expect("temp dir");
        let nested = dir.path().join("profile").join("default");

        let store = DeviceFileStore::open(&nested, "store.json").expect("store opens");
        store.set("k", "v").expect("set");

        assert!(nested.join("store.json").exists());
    }

    #[rstest]
    fn removing_a_missing_key_is_a_no_op() {
        let dir = TempDir::new().expect("temp dir");
        let store = open(&dir);
        store.remove("absent").expect("remove");
        assert!(!dir.path().join("device_store.json").exists());
    }
}
