//! Local fallback store: one plain file per key, values stored verbatim.

use crate::config::validate_key;
use crate::error::{Result, StoreError};
use crate::provider::KeyValueStore;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn read(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Replace the value of `key` atomically.
    pub fn write(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        fs::create_dir_all(&self.dir)?;

        let path = self.path(key);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|e| StoreError::Persist {
            path: path.clone(),
            source: e.error,
        })?;
        Ok(())
    }
}

impl KeyValueStore for LocalStore {
    fn load(&self, key: &str) -> Option<String> {
        self.read(key)
            .inspect_err(|error| {
                tracing::warn!(dir = %self.dir.display(), %error, "local store load failed");
            })
            .ok()
            .flatten()
    }

    fn save(&self, key: &str, value: &str) -> bool {
        self.write(key, value)
            .inspect_err(|error| {
                tracing::warn!(dir = %self.dir.display(), %error, "local store save failed");
            })
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_roundtrip_verbatim() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path().join("local"));

        assert_eq!(store.load("pulse.ui.session.v1"), None);
        assert!(store.save("pulse.ui.session.v1", "not even json"));
        assert_eq!(
            store.load("pulse.ui.session.v1").as_deref(),
            Some("not even json")
        );
        assert!(store.path("pulse.ui.session.v1").is_file());
    }

    #[test]
    fn test_overwrite() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path());
        assert!(store.save("k", "one"));
        assert!(store.save("k", "two"));
        assert_eq!(store.load("k").as_deref(), Some("two"));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unwritable_dir_reports_false() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let store = LocalStore::new(blocker.join("nested"));
        assert!(!store.save("k", "v"));
        assert_eq!(store.load("k"), None);
    }

    #[test]
    fn test_invalid_key() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path());
        assert!(matches!(store.write("", "v"), Err(StoreError::InvalidKey(_))));
        assert!(!store.save("a/b", "v"));
    }
}
