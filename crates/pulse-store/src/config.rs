use crate::error::{Result, StoreError};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Storage key for the session in the envelope store.
pub const DEFAULT_KEY: &str = "workspace-state";

/// Storage key for the session in the local fallback store.
pub const LOCAL_SESSION_KEY: &str = "pulse.ui.session.v1";

/// Directory name under the app-data base when `PULSE_CACHE_ROOT` is unset.
pub const DEFAULT_CACHE_ROOT: &str = "Pulse";

/// Delay between the last change and the write it triggers.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Where and how session state is stored.
///
/// The root resolves as:
/// 1. `PULSE_STATE_DIR`, used as-is
/// 2. `$LOCALAPPDATA/$PULSE_CACHE_ROOT`
/// 3. `<temp dir>/$PULSE_CACHE_ROOT`
///
/// with `PULSE_CACHE_ROOT` defaulting to [`DEFAULT_CACHE_ROOT`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    root: PathBuf,
    key: String,
    local_key: String,
    debounce: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var_os(name))
    }

    /// Resolve from an arbitrary variable lookup instead of the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let root = match non_empty(lookup("PULSE_STATE_DIR")) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let cache_root = non_empty(lookup("PULSE_CACHE_ROOT"))
                    .unwrap_or_else(|| OsString::from(DEFAULT_CACHE_ROOT));
                non_empty(lookup("LOCALAPPDATA"))
                    .map(PathBuf::from)
                    .unwrap_or_else(env::temp_dir)
                    .join(cache_root)
            }
        };

        Self {
            root,
            key: DEFAULT_KEY.to_string(),
            local_key: LOCAL_SESSION_KEY.to_string(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = root.into();
        self
    }

    /// Use `key` in both stores.
    pub fn with_key<S: Into<String>>(mut self, key: S) -> Self {
        let key = key.into();
        self.local_key = key.clone();
        self.key = key;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn local_key(&self) -> &str {
        &self.local_key
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Directory of the envelope store.
    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    /// Directory of the local fallback store.
    pub fn local_dir(&self) -> PathBuf {
        self.root.join("local")
    }
}

/// Check that `key` can be used as a file name: non-empty, only ASCII
/// letters, digits, `-`, `_` and `.`, and not starting with `.`.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

fn non_empty(value: Option<OsString>) -> Option<OsString> {
    value.filter(|v| !v.is_empty())
}
