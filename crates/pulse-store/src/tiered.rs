//! Ordered fallback across several stores, and the session-level store
//! built on it.

use crate::config::StoreConfig;
use crate::envelope::EnvelopeStore;
use crate::error::Result;
use crate::local::LocalStore;
use crate::provider::KeyValueStore;
use pulse::v1::session::{self, RestoreReport, UiSessionState};
use std::sync::Arc;

/// One tier of a [`TieredStore`]: a store and the key it holds the value
/// under.
#[derive(Clone)]
struct Tier {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

/// Stores consulted in order.
///
/// Loads return the first acceptable value; saves go to every tier, each
/// attempted regardless of the others.
#[derive(Clone, Default)]
pub struct TieredStore {
    tiers: Vec<Tier>,
}

impl TieredStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tier that stores the value under `key`.
    pub fn with_tier<S>(mut self, store: S, key: impl Into<String>) -> Self
    where
        S: KeyValueStore + 'static,
    {
        self.tiers.push(Tier {
            store: Arc::new(store),
            key: key.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// The first value, in tier order, for which `accept` returns `Some`,
    /// along with the index of the tier it came from.
    pub fn load_first<T, F>(&self, mut accept: F) -> Option<(usize, T)>
    where
        F: FnMut(&str) -> Option<T>,
    {
        self.tiers.iter().enumerate().find_map(|(index, tier)| {
            let raw = tier.store.load(&tier.key)?;
            let accepted = accept(&raw);
            if accepted.is_none() {
                tracing::debug!(tier = index, key = %tier.key, "stored value rejected");
            }
            accepted.map(|value| (index, value))
        })
    }

    /// Write `value` to every tier. True when at least one accepted it.
    pub fn save_all(&self, value: &str) -> bool {
        let mut saved = false;
        for (index, tier) in self.tiers.iter().enumerate() {
            if tier.store.save(&tier.key, value) {
                saved = true;
            } else {
                tracing::warn!(tier = index, key = %tier.key, "store rejected write");
            }
        }
        saved
    }
}

/// A session restored from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSession {
    pub state: UiSessionState,
    pub report: RestoreReport,
    /// Index of the tier the session came from.
    pub tier: usize,
}

/// Loads and saves [`UiSessionState`] through a [`TieredStore`].
#[derive(Clone)]
pub struct SessionStore {
    tiers: TieredStore,
}

impl SessionStore {
    pub fn new(tiers: TieredStore) -> Self {
        Self { tiers }
    }

    /// The standard layout: the envelope store under
    /// [`StoreConfig::state_dir`], then the local store under
    /// [`StoreConfig::local_dir`].
    pub fn open(config: &StoreConfig) -> Result<Self> {
        crate::config::validate_key(config.key())?;
        crate::config::validate_key(config.local_key())?;

        let tiers = TieredStore::new()
            .with_tier(EnvelopeStore::new(config.state_dir()), config.key())
            .with_tier(LocalStore::new(config.local_dir()), config.local_key());
        Ok(Self::new(tiers))
    }

    /// The first stored session that decodes, if any.
    pub fn load(&self) -> Option<LoadedSession> {
        self.tiers
            .load_first(|raw| session::deserialize_with_report(raw).ok())
            .map(|(tier, (state, report))| LoadedSession {
                state,
                report,
                tier,
            })
    }

    /// The stored session, or the seed session when nothing decodes.
    pub fn load_session(&self) -> UiSessionState {
        match self.load() {
            Some(loaded) => loaded.state,
            None => {
                tracing::debug!("no stored session, starting from seed");
                UiSessionState::default_session()
            }
        }
    }

    /// Serialize `state` and write it to every tier.
    pub fn save_session(&self, state: &UiSessionState) -> bool {
        match session::serialize(state) {
            Ok(serialized) => self.tiers.save_all(&serialized),
            Err(error) => {
                tracing::warn!(%error, "failed to serialize session");
                false
            }
        }
    }
}
