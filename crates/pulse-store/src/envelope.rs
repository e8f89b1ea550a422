//! File-backed store that wraps each value in a schema-versioned envelope
//! and keeps the previous write as a backup.
//!
//! For a key `k` the store owns two files in its directory:
//!
//! - `k.json`: the current envelope
//! - `k.backup.json`: the envelope it replaced
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "updated_at_unix_ms": 1767225600000,
//!   "ui_state": { "version": 1, "items": [ ... ] }
//! }
//! ```
//!
//! Loading falls back to the backup when the primary is unreadable and
//! restores the primary from it. Legacy files (a bare value, an object
//! without `schema_version`, or schema 0 with `state`/`ui_state`) are
//! accepted and rewritten in the current format.

use crate::config::validate_key;
use crate::error::{Result, StoreError};
use crate::provider::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub const STATE_SCHEMA_VERSION: u64 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    schema_version: u64,
    updated_at_unix_ms: u64,
    ui_state: Value,
}

struct Decoded {
    ui_state: Value,
    needs_rewrite: bool,
}

#[derive(Debug)]
pub struct EnvelopeStore {
    dir: PathBuf,
    io_lock: Mutex<()>,
}

impl EnvelopeStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            io_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn primary_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn backup_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.backup.json"))
    }

    /// Read the value stored under `key`, falling back to the backup.
    ///
    /// Read failures of either file are logged and treated as absent; only
    /// an invalid key or an uncreatable directory is an error.
    pub fn read(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let _guard = self.lock();
        fs::create_dir_all(&self.dir)?;

        let primary = self.primary_path(key);
        match read_envelope(&primary) {
            Ok(Some(decoded)) => {
                if decoded.needs_rewrite
                    && let Err(error) = self.write_locked(key, &decoded.ui_state)
                {
                    tracing::warn!(path = %primary.display(), %error, "failed to upgrade legacy state");
                }
                return Ok(Some(serde_json::to_string(&decoded.ui_state)?));
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(path = %primary.display(), %error, "failed to read primary state");
            }
        }

        let backup = self.backup_path(key);
        match read_envelope(&backup) {
            Ok(Some(decoded)) => {
                if let Err(error) = self.restore_primary(key, &decoded.ui_state) {
                    tracing::warn!(path = %backup.display(), %error, "failed to restore primary from backup");
                }
                Ok(Some(serde_json::to_string(&decoded.ui_state)?))
            }
            Ok(None) => Ok(None),
            Err(error) => {
                tracing::warn!(path = %backup.display(), %error, "failed to read backup state");
                Ok(None)
            }
        }
    }

    /// Store `value` (which must be JSON) under `key`, rotating the current
    /// primary to the backup.
    pub fn write(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let ui_state: Value = serde_json::from_str(value)?;
        let _guard = self.lock();
        fs::create_dir_all(&self.dir)?;
        self.write_locked(key, &ui_state)
    }

    fn write_locked(&self, key: &str, ui_state: &Value) -> Result<()> {
        let primary = self.primary_path(key);
        let backup = self.backup_path(key);
        let tmp = self.stage(ui_state)?;

        if backup.exists() {
            let _ = fs::remove_file(&backup);
        }
        if primary.exists() {
            fs::rename(&primary, &backup)?;
        }

        tmp.persist(&primary).map_err(|e| StoreError::Persist {
            path: primary.clone(),
            source: e.error,
        })?;
        tracing::debug!(path = %primary.display(), "state written");
        Ok(())
    }

    fn restore_primary(&self, key: &str, ui_state: &Value) -> Result<()> {
        let primary = self.primary_path(key);
        let tmp = self.stage(ui_state)?;
        tmp.persist(&primary).map_err(|e| StoreError::Persist {
            path: primary.clone(),
            source: e.error,
        })?;
        tracing::debug!(path = %primary.display(), "primary state restored from backup");
        Ok(())
    }

    /// Write the envelope for `ui_state` to a synced temp file in the store
    /// directory.
    fn stage(&self, ui_state: &Value) -> Result<tempfile::NamedTempFile> {
        let envelope = PersistedState {
            schema_version: STATE_SCHEMA_VERSION,
            updated_at_unix_ms: unix_time_ms(),
            ui_state: ui_state.clone(),
        };
        let mut bytes = serde_json::to_vec_pretty(&envelope)?;
        bytes.push(b'\n');

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.io_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for EnvelopeStore {
    fn load(&self, key: &str) -> Option<String> {
        match self.read(key) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(dir = %self.dir.display(), %error, "envelope store load failed");
                None
            }
        }
    }

    fn save(&self, key: &str, value: &str) -> bool {
        match self.write(key, value) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(dir = %self.dir.display(), %error, "envelope store save failed");
                false
            }
        }
    }
}

fn read_envelope(path: &Path) -> Result<Option<Decoded>> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(path)?;
    let raw: Value = serde_json::from_slice(&bytes)?;
    decode(raw).map(Some)
}

fn decode(raw: Value) -> Result<Decoded> {
    let object = match raw {
        Value::Object(object) => object,
        other => {
            return Ok(Decoded {
                ui_state: other,
                needs_rewrite: true,
            });
        }
    };

    if !object.contains_key("schema_version") {
        return Ok(Decoded {
            ui_state: Value::Object(object),
            needs_rewrite: true,
        });
    }

    let schema = &object["schema_version"];

    let Some(schema_version) = schema.as_u64() else {
        return Err(StoreError::InvalidSchema(schema.to_string()));
    };

    match schema_version {
        STATE_SCHEMA_VERSION => {
            let ui_state = object
                .get("ui_state")
                .cloned()
                .ok_or(StoreError::MissingField("ui_state"))?;
            Ok(Decoded {
                ui_state,
                needs_rewrite: false,
            })
        }
        0 => decode_legacy(&object),
        other => Err(StoreError::UnsupportedSchema(other)),
    }
}

fn decode_legacy(object: &Map<String, Value>) -> Result<Decoded> {
    let ui_state = object
        .get("state")
        .or_else(|| object.get("ui_state"))
        .cloned()
        .ok_or(StoreError::MissingField("state"))?;
    Ok(Decoded {
        ui_state,
        needs_rewrite: true,
    })
}

fn unix_time_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, EnvelopeStore) {
        let temp = TempDir::new().unwrap();
        let store = EnvelopeStore::new(temp.path().join("state"));
        (temp, store)
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
    }

    // ── write ───────────────────────────────────────────────────────────

    #[test]
    fn test_write_wraps_in_envelope() {
        let (_temp, store) = store();
        store.write("k", r#"{"version":1,"items":[]}"#).unwrap();

        let raw = fs::read_to_string(store.primary_path("k")).unwrap();
        assert!(raw.ends_with("}\n"));
        assert!(raw.contains("\n  \"schema_version\": 1"));

        let envelope = read_json(&store.primary_path("k"));
        assert_eq!(envelope["ui_state"], json!({"version": 1, "items": []}));
        assert!(envelope["updated_at_unix_ms"].as_u64().unwrap() > 0);
        assert!(!store.backup_path("k").exists());
    }

    #[test]
    fn test_write_rotates_backup() {
        let (_temp, store) = store();
        store.write("k", r#"{"n":1}"#).unwrap();
        store.write("k", r#"{"n":2}"#).unwrap();
        store.write("k", r#"{"n":3}"#).unwrap();

        assert_eq!(read_json(&store.primary_path("k"))["ui_state"]["n"], 3);
        assert_eq!(read_json(&store.backup_path("k"))["ui_state"]["n"], 2);
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let (_temp, store) = store();
        store.write("k", r#"{"n":1}"#).unwrap();
        store.write("k", r#"{"n":2}"#).unwrap();

        let mut names: Vec<String> = fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["k.backup.json", "k.json"]);
    }

    #[test]
    fn test_write_rejects_non_json() {
        let (_temp, store) = store();
        assert!(matches!(store.write("k", "{nope"), Err(StoreError::Json(_))));
        assert!(!store.save("k", "{nope"));
        assert!(!store.primary_path("k").exists());
    }

    #[test]
    fn test_invalid_key_rejected() {
        let (_temp, store) = store();
        assert!(matches!(
            store.write("../k", "{}"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(store.load("../k").is_none());
    }

    // ── read ────────────────────────────────────────────────────────────

    #[test]
    fn test_read_missing_is_none() {
        let (_temp, store) = store();
        assert_eq!(store.read("k").unwrap(), None);
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_read_returns_compact_ui_state() {
        let (_temp, store) = store();
        assert!(store.save("k", "{ \"version\": 1,\n  \"items\": [] }"));
        let loaded = store.load("k").unwrap();
        assert!(!loaded.contains('\n'));
        let value: Value = serde_json::from_str(&loaded).unwrap();
        assert_eq!(value, json!({"version": 1, "items": []}));
    }

    #[test]
    fn test_corrupt_primary_falls_back_to_backup() {
        let (_temp, store) = store();
        store.write("k", r#"{"n":1}"#).unwrap();
        store.write("k", r#"{"n":2}"#).unwrap();
        fs::write(store.primary_path("k"), "{ truncated").unwrap();

        assert_eq!(store.read("k").unwrap().as_deref(), Some(r#"{"n":1}"#));
        // primary restored from the backup
        assert_eq!(read_json(&store.primary_path("k"))["ui_state"]["n"], 1);
    }

    #[test]
    fn test_unsupported_schema_falls_back_to_backup() {
        let (_temp, store) = store();
        store.write("k", r#"{"n":1}"#).unwrap();
        store.write("k", r#"{"n":2}"#).unwrap();
        fs::write(
            store.primary_path("k"),
            json!({"schema_version": 9, "ui_state": {}}).to_string(),
        )
        .unwrap();

        assert_eq!(store.read("k").unwrap().as_deref(), Some(r#"{"n":1}"#));
    }

    #[test]
    fn test_both_files_corrupt_is_none() {
        let (_temp, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.primary_path("k"), "x").unwrap();
        fs::write(store.backup_path("k"), "y").unwrap();
        assert_eq!(store.read("k").unwrap(), None);
    }

    // ── legacy ──────────────────────────────────────────────────────────

    #[test]
    fn test_legacy_bare_object_is_upgraded() {
        let (_temp, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.primary_path("k"), r#"{"items":[]}"#).unwrap();

        assert_eq!(store.read("k").unwrap().as_deref(), Some(r#"{"items":[]}"#));
        let upgraded = read_json(&store.primary_path("k"));
        assert_eq!(upgraded["schema_version"], 1);
        assert_eq!(upgraded["ui_state"], json!({"items": []}));
    }

    #[test]
    fn test_legacy_schema_zero_state_field() {
        let (_temp, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(
            store.primary_path("k"),
            json!({"schema_version": 0, "state": {"n": 7}}).to_string(),
        )
        .unwrap();

        assert_eq!(store.read("k").unwrap().as_deref(), Some(r#"{"n":7}"#));
        assert_eq!(read_json(&store.primary_path("k"))["schema_version"], 1);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode(json!({"schema_version": "1"})),
            Err(StoreError::InvalidSchema(_))
        ));
        assert!(matches!(
            decode(json!({"schema_version": 1})),
            Err(StoreError::MissingField("ui_state"))
        ));
        assert!(matches!(
            decode(json!({"schema_version": 0})),
            Err(StoreError::MissingField("state"))
        ));
        assert!(matches!(
            decode(json!({"schema_version": 2, "ui_state": {}})),
            Err(StoreError::UnsupportedSchema(2))
        ));
    }

    #[test]
    fn test_decode_bare_array_is_legacy() {
        let decoded = decode(json!([1, 2])).unwrap();
        assert!(decoded.needs_rewrite);
        assert_eq!(decoded.ui_state, json!([1, 2]));
    }
}
